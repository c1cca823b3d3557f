//! Error types shared across the crate

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppSeekError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Icon extraction failed for {path}: {reason}")]
    IconError { path: PathBuf, reason: String },

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Coordinator has shut down")]
    CoordinatorClosed,
}

pub type Result<T> = std::result::Result<T, AppSeekError>;
