// src/watermark.rs

use crate::error::WatermarkError;
use crate::model::Watermarks;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Default file name of the watermark document, relative to the working root
pub const DEFAULT_STATE_FILE: &str = "thumbnail-commits.json";

/// JSON document mapping repository names to the last processed revision
#[derive(Debug, Clone)]
pub struct WatermarkStore {
    path: PathBuf,
}

impl WatermarkStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored watermarks. A missing file means nothing was processed yet.
    pub fn load(&self) -> Result<Watermarks, WatermarkError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No watermark file at {}, processing full history", self.path.display());
                return Ok(Watermarks::new());
            }
            Err(source) => return Err(WatermarkError::Io { path: self.path.clone(), source }),
        };

        let watermarks: Watermarks = serde_json::from_str(&content)
            .map_err(|source| WatermarkError::Json { path: self.path.clone(), source })?;

        tracing::info!("Loaded watermarks for {} repositories", watermarks.len());
        Ok(watermarks)
    }

    /// Replaces the whole document. Writes a sibling file first and renames it
    /// into place so a crash never leaves a half-written document behind.
    pub fn save(&self, watermarks: &Watermarks) -> Result<(), WatermarkError> {
        let io_err = |source| WatermarkError::Io { path: self.path.clone(), source };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let content = serde_json::to_string_pretty(watermarks)
            .map_err(|source| WatermarkError::Json { path: self.path.clone(), source })?;

        let mut tmp_name = self.path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);

        fs::write(&tmp_path, content).map_err(io_err)?;
        fs::rename(&tmp_path, &self.path).map_err(io_err)?;

        tracing::debug!("Saved {} watermarks to {}", watermarks.len(), self.path.display());
        Ok(())
    }
}
