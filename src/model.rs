// src/model.rs

use image::RgbaImage;
use palette::Srgb;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Maps a repository name to the last revision id that was processed
pub type Watermarks = BTreeMap<String, String>;

/// Identifies the author of a commit. Two authors are the same person only if
/// both name and email match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AuthorId {
    pub name: String,
    pub email: String,
}

impl AuthorId {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self { name: name.into(), email: email.into() }
    }
}

impl fmt::Display for AuthorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A single commit as seen by the revision walk
#[derive(Debug, Clone)]
pub struct CommitRecord {
    pub id: String,
    pub author: AuthorId,
    pub message: String,
    /// Paths touched relative to the first parent, in diff order
    pub paths: Vec<String>,
}

impl CommitRecord {
    /// Commits mentioning "merge" anywhere in their message carry no content of their own
    pub fn is_merge(&self) -> bool {
        self.message.to_lowercase().contains("merge")
    }
}

/// A decoded image, normalized to RGBA at the working tile size
#[derive(Debug, Clone)]
pub struct ExtractedImage {
    /// Repository-relative path the image was read from
    pub path: String,
    pub image: RgbaImage,
}

/// Everything one author contributed during a single repository scan
#[derive(Debug, Clone)]
pub struct AuthorGroup {
    pub author: AuthorId,
    pub images: Vec<ExtractedImage>,
    pub messages: Vec<String>,
}

/// Result of scanning one repository
#[derive(Debug, Default)]
pub struct RepositoryScan {
    /// Newest commit of the repository, the next watermark
    pub tip: Option<String>,
    /// Non-empty author groups in first-seen order
    pub groups: Vec<AuthorGroup>,
    pub commits_walked: usize,
}

/// A repository candidate found under the working root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryEntry {
    pub name: String,
    pub path: PathBuf,
    /// Position in the sorted listing, drives the color tag
    pub index: usize,
}

/// Embed accent color attached to every collage of a repository
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorTag(pub Srgb<u8>);

impl ColorTag {
    /// Packs the color as `0xRRGGBB`
    pub fn to_u32(self) -> u32 {
        let (r, g, b) = self.0.into_components();
        (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
    }

    /// Palette entry for the repository at `index`, cycling when the list is longer
    pub fn for_index(index: usize) -> Self {
        let (red, green, blue) = PALETTE[index % PALETTE.len()];
        Self(Srgb::new(red, green, blue))
    }
}

impl fmt::Display for ColorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.to_u32())
    }
}

/// Embed colors in assignment order
pub const PALETTE: [(u8, u8, u8); 17] = [
    (0x1a, 0xbc, 0x9c), // teal
    (0x34, 0x98, 0xdb), // blue
    (0x9b, 0x59, 0xb6), // purple
    (0xe9, 0x1e, 0x63), // magenta
    (0xf1, 0xc4, 0x0f), // gold
    (0xe6, 0x7e, 0x22), // orange
    (0xed, 0x42, 0x45), // brand red
    (0x60, 0x7d, 0x8b), // dark grey
    (0x58, 0x65, 0xf2), // blurple
    (0xeb, 0x45, 0x9e), // fuchsia
    (0xfe, 0xe7, 0x5c), // yellow
    (0xeb, 0x45, 0x9f), // pink
    (0xee, 0xef, 0xf1), // light embed
    (0xa8, 0x43, 0x00), // dark orange
    (0xad, 0x14, 0x57), // dark magenta
    (0x71, 0x36, 0x8a), // dark purple
    (0x2e, 0xcc, 0x71), // green
];

/// A finished contact sheet ready to be published
#[derive(Debug, Clone)]
pub struct Collage {
    /// File the rendered raster was saved to
    pub path: PathBuf,
    pub author: String,
    pub title: String,
    pub footer: String,
    pub color: ColorTag,
}
