//! Per-item error taxonomy.
//!
//! Every variant is recoverable: the offending file is excluded or skipped,
//! a diagnostic is logged, and the batch moves on. Anything that should stop
//! a run (unreadable catalog, bad regex) goes through `anyhow` instead.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ItemError {
    #[error("File {} does not exist", .0.display())]
    MissingFile(PathBuf),

    #[error("File {} is not a valid wave file: {reason}", .path.display())]
    UndecodableFile { path: PathBuf, reason: String },

    #[error("Metadata file {} does not exist", .0.display())]
    MissingArtifact(PathBuf),

    #[error("File {} is empty", .0.display())]
    EmptyAudio(PathBuf),

    /// Shorter than one analysis block.
    #[error("File {} is too short ({samples} samples, need {required})", .path.display())]
    TooShortAudio {
        path: PathBuf,
        samples: usize,
        required: usize,
    },

    #[error("Failed writing thumbnail {}: {reason}", .path.display())]
    ImageWrite { path: PathBuf, reason: String },
}

impl ItemError {
    /// Short machine-friendly code, used in reports and the stats JSON.
    pub fn code(&self) -> &'static str {
        match self {
            ItemError::MissingFile(_) => "MISSING_FILE",
            ItemError::UndecodableFile { .. } => "UNDECODABLE",
            ItemError::MissingArtifact(_) => "MISSING_ARTIFACT",
            ItemError::EmptyAudio(_) => "EMPTY_AUDIO",
            ItemError::TooShortAudio { .. } => "TOO_SHORT",
            ItemError::ImageWrite { .. } => "IMAGE_WRITE",
        }
    }
}
