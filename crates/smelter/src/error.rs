//! Error types for the Smelter library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Smelter operations.
#[derive(Debug, Error)]
pub enum SmelterError {
    /// Error reading or writing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed delimited input.
    #[error("Parse error at row {row}: {message}")]
    Parse { row: usize, message: String },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Empty file or no header to load.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Referenced project store, table or column does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation conflicts with the current schema or contract.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Identifier that cannot be used as a table, column or project name.
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Argument outside the accepted bounds.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Failure reported by the underlying store.
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SmelterError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SmelterError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for Smelter operations.
pub type Result<T> = std::result::Result<T, SmelterError>;
