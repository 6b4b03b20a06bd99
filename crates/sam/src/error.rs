use std::{path::PathBuf, process::ExitStatus};

use prelabel::PrelabelError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SamError {
    #[error("SAM checkpoint not found: {}", path.display())]
    CheckpointNotFound { path: PathBuf },

    #[error("Mask generator script not found: {}", path.display())]
    ScriptNotFound { path: PathBuf },

    #[error("Mask generator exited with {status}: {stderr}")]
    ScriptFailed { status: ExitStatus, stderr: String },

    #[error("Invalid RLE mask: {0}")]
    InvalidRle(String),

    #[error("Failed to encode input image: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid generator output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<SamError> for PrelabelError {
    fn from(error: SamError) -> Self {
        match error {
            SamError::CheckpointNotFound { .. } | SamError::ScriptNotFound { .. } => {
                PrelabelError::Configuration(error.to_string())
            }
            other => PrelabelError::Oracle(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, SamError>;
