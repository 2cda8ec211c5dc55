//! Error types for the data pipeline

use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that can occur while indexing or collating audio
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    /// Manifest missing, unreadable, malformed, or without a `path` column
    #[error("Manifest error ({}): {reason}", .path.display())]
    ManifestError {
        /// Manifest file
        path: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// Referenced audio file is missing, corrupt, or undecodable
    #[error("Decoding error ({}): {reason}", .path.display())]
    DecodeError {
        /// Offending audio file
        path: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// Out-of-range lookup on the audio index
    #[error("Index {index} out of bounds for index of {len} records")]
    IndexError {
        /// Requested position
        index: usize,
        /// Number of records
        len: usize,
    },

    /// Decoded file does not use the configured sample rate
    #[error("Sample rate mismatch ({}): expected {expected} Hz, found {found} Hz", .path.display())]
    SampleRateMismatch {
        /// Offending audio file
        path: PathBuf,
        /// Configured sample rate
        expected: u32,
        /// Sample rate reported by the decoder
        found: u32,
    },

    /// Invalid input parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Processing error during feature extraction or batching
    #[error("Processing error: {0}")]
    ProcessingError(String),
}

impl PipelineError {
    pub(crate) fn manifest(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        PipelineError::ManifestError {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn decode(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        PipelineError::DecodeError {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<ndarray::ShapeError> for PipelineError {
    fn from(err: ndarray::ShapeError) -> Self {
        PipelineError::ProcessingError(format!("tensor shape error: {}", err))
    }
}
