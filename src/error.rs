// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Failures while opening or walking a repository. The repository is skipped.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("{path} is not a valid git repository: {source}")]
    RepositoryInvalid {
        path: PathBuf,
        #[source]
        source: git2::Error,
    },

    #[error("git error: {0}")]
    Git(#[from] git2::Error),
}

/// A candidate image could not be decoded. Only that file is skipped.
#[derive(Error, Debug)]
#[error("failed to decode '{}': {source}", path.display())]
pub struct DecodeError {
    pub path: PathBuf,
    #[source]
    pub source: image::ImageError,
}

/// The messaging service did not accept a collage
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("channel rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("failed to read collage file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to build message payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Invalid invocation, aborts the run before any repository is touched
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no bot token given (use --token or DISCORD_TOKEN)")]
    MissingToken,
}

#[derive(Error, Debug)]
pub enum WatermarkError {
    #[error("failed to access watermark file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed watermark file {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors that end a run
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Watermark(#[from] WatermarkError),

    #[error("failed to list repositories under {}: {source}", root.display())]
    ListRoot {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
