// src/extractor.rs

use crate::error::DecodeError;
use crate::model::{CommitRecord, ExtractedImage};
use image::imageops::{self, FilterType};
use std::path::{Path, PathBuf};

/// Side length every extracted image is resized to
pub const TILE_SIZE: u32 = 256;

/// File suffixes treated as art assets. Matching is case-sensitive.
pub const IMAGE_EXTENSIONS: [&str; 2] = [".png", ".tga"];

/// Pulls the images touched by a commit out of a repository's working tree
pub struct ImageExtractor {
    root: PathBuf,
}

impl ImageExtractor {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Decodes every candidate image of `commit`, in the commit's path order.
    /// Files that fail to decode are logged and skipped.
    pub fn extract(&self, commit: &CommitRecord) -> Vec<ExtractedImage> {
        let mut images = Vec::new();

        for path in &commit.paths {
            if !is_image_path(path) {
                continue;
            }

            let full_path = self.root.join(path);
            if !full_path.is_file() {
                tracing::debug!("{} no longer exists, skipping", full_path.display());
                continue;
            }

            match normalize(&full_path) {
                Ok(image) => images.push(ExtractedImage { path: path.clone(), image }),
                Err(e) => tracing::warn!("Error processing file: {}", e),
            }
        }

        images
    }
}

pub fn is_image_path(path: &str) -> bool {
    IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Decodes `path` to RGBA and scales it to the tile size. Nearest-neighbor
/// keeps the hard pixel edges of texture art.
pub fn normalize(path: &Path) -> Result<image::RgbaImage, DecodeError> {
    let decoded = image::open(path).map_err(|source| DecodeError { path: path.to_path_buf(), source })?;
    let rgba = decoded.to_rgba8();
    Ok(imageops::resize(&rgba, TILE_SIZE, TILE_SIZE, FilterType::Nearest))
}
