//! Centralized error types for mboxcompact.
//!
//! The compaction algorithms themselves never fail on malformed mail; errors
//! only come from reading inputs and from option values rejected at the API
//! boundary.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the mboxcompact library.
#[derive(Error, Debug)]
pub enum CompactError {
    /// I/O error with the associated file path.
    #[error("I/O error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The specified input file does not exist.
    #[error("Input file not found: {0}")]
    FileNotFound(PathBuf),

    /// A caller supplied an option value the pipeline cannot honor.
    #[error("Invalid value for option '{name}': {reason}")]
    InvalidOption { name: &'static str, reason: String },
}

/// Convenience alias for `Result<T, CompactError>`.
pub type Result<T> = std::result::Result<T, CompactError>;

impl CompactError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an `InvalidOption` variant.
    pub fn invalid_option(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            name,
            reason: reason.into(),
        }
    }
}
