//! Error types for the surfattr library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for surfattr operations.
#[derive(Error, Debug)]
pub enum Error {
    /// File does not exist or cannot be accessed
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Header malformed, row shape wrong, or unrecognized version
    #[error("Format error in {path} (line {line}): {detail}")]
    Format {
        path: PathBuf,
        line: u64,
        detail: String,
    },

    /// Node-count disagreement between source and destination
    #[error("Node count mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// Codec variant not implemented for this table kind
    #[error("Encoding {encoding} is not supported for {kind} files")]
    UnsupportedEncoding {
        kind: &'static str,
        encoding: &'static str,
    },

    /// Column reference does not resolve
    #[error("No such column: {0}")]
    NoSuchColumn(String),

    /// Merge plan violates the erase-all precondition
    #[error("Merge policy violation: {0}")]
    PolicyViolation(String),

    /// Cooperative cancellation of a derivation
    #[error("Operation cancelled")]
    Cancelled,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 conversion error
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl Error {
    /// Create a format error with path and line context.
    pub fn format(path: impl Into<PathBuf>, line: u64, detail: impl Into<String>) -> Self {
        Self::Format {
            path: path.into(),
            line,
            detail: detail.into(),
        }
    }

    /// Create a shape mismatch error.
    pub fn shape(expected: usize, actual: usize) -> Self {
        Self::ShapeMismatch { expected, actual }
    }
}

/// Result type alias for surfattr operations.
pub type Result<T> = std::result::Result<T, Error>;
