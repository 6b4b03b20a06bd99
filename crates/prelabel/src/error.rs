use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrelabelError {
    #[error("Image not found: {}", path.display())]
    ImageNotFound { path: PathBuf },

    #[error("Could not resolve image reference '{reference}': {reason}")]
    ImageResolution { reference: String, reason: String },

    #[error("Failed to load image: {0}")]
    ImageLoad(#[from] image::ImageError),

    #[error("Mask oracle failed: {0}")]
    Oracle(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid task: {0}")]
    InvalidTask(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PrelabelError {
    /// Configuration faults abort start-up; everything else is scoped to one task.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

pub type Result<T> = std::result::Result<T, PrelabelError>;
