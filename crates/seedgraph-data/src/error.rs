//! Error types for reference data loading

use std::path::PathBuf;

/// Errors loading a corpus
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    /// IO error during file read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed corpus document
    #[error("corpus parse error: {0}")]
    Parse(String),

    /// No loader for the file extension
    #[error("unsupported corpus format: '{0}'")]
    UnsupportedFormat(String),
}

impl DataError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias for data operations
pub type Result<T> = std::result::Result<T, DataError>;
