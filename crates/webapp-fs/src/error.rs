//! Error types for webapp-fs

use std::path::PathBuf;

/// Result type for webapp-fs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in webapp-fs operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {format} settings at {path}: {message}")]
    SettingsParse {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Unsupported settings format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("Type mismatch for key {key}: expected {expected}, found {actual}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        actual: &'static str,
    },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
