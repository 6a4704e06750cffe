//! Custom error types for output-as-input.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the output-as-input library.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to decode an image file.
    #[error("failed to load image from {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The selected file is not present in the output directory.
    #[error("image file not found at {path}")]
    ImageNotFound { path: PathBuf },

    /// The selection is not a plain file name inside the output directory.
    #[error("invalid image selection {name:?}: {reason}")]
    InvalidSelection { name: String, reason: String },

    /// Failed to read the output directory.
    #[error("failed to read output directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Shape mismatch while building a tensor.
    #[error("tensor shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },
}

/// Result type alias for output-as-input operations.
pub type Result<T> = std::result::Result<T, Error>;
