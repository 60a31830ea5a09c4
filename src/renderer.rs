// src/renderer.rs

use crate::extractor::TILE_SIZE;
use crate::model::ExtractedImage;
use image::{imageops, Rgba, RgbaImage};

/// Tiles per row of a collage
pub const COLUMNS: u32 = 6;
/// Rows per collage; images past `COLUMNS * MAX_ROWS` are dropped
pub const MAX_ROWS: u32 = 4;
/// Transparent margin around every tile
pub const BORDER: u32 = 32;

const CELL: u32 = TILE_SIZE + BORDER;

/// Number of rows needed for `count` images, capped at `MAX_ROWS`
pub fn grid_rows(count: usize) -> u32 {
    let rows = (count as u32).div_ceil(COLUMNS);
    rows.min(MAX_ROWS)
}

/// Canvas dimensions for a grid with `rows` rows
pub fn canvas_size(rows: u32) -> (u32, u32) {
    (COLUMNS * CELL + BORDER, rows * CELL + BORDER)
}

/// Top-left corner of the padded cell for the image at `index`
pub fn cell_origin(index: usize) -> (u32, u32) {
    let index = index as u32;
    ((index % COLUMNS) * CELL, (index / COLUMNS) * CELL)
}

/// Surrounds `image` with `border` pixels of full transparency
fn pad(image: &RgbaImage, border: u32) -> RgbaImage {
    let mut padded = RgbaImage::from_pixel(image.width() + 2 * border, image.height() + 2 * border, Rgba([0, 0, 0, 0]));
    imageops::replace(&mut padded, image, border as i64, border as i64);
    padded
}

/// Lays out up to 24 images on a transparent 6-column grid, in input order.
/// Returns `None` when there is nothing to lay out.
///
/// Tiles are alpha-composited "over" the canvas. A half-transparent pixel on
/// an empty cell keeps its color and alpha (`[100, 50, 20, 128]` stays as is),
/// where a mask-interpolating paste would scale color and alpha down to
/// roughly `[50, 25, 10, 64]`.
pub fn compose(images: &[ExtractedImage]) -> Option<RgbaImage> {
    if images.is_empty() {
        return None;
    }

    let rows = grid_rows(images.len());
    let (width, height) = canvas_size(rows);
    let mut canvas = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));

    let capacity = (COLUMNS * rows) as usize;
    if images.len() > capacity {
        let dropped: Vec<&str> = images[capacity..].iter().map(|i| i.path.as_str()).collect();
        tracing::debug!("Collage holds {} of {} images, leaving out {:?}", capacity, images.len(), dropped);
    }

    for (i, extracted) in images.iter().take(capacity).enumerate() {
        let padded = pad(&extracted.image, BORDER);
        let (x, y) = cell_origin(i);
        // blends by the tile's alpha, so its transparent border never covers a neighbor
        imageops::overlay(&mut canvas, &padded, x as i64, y as i64);
    }

    Some(canvas)
}
