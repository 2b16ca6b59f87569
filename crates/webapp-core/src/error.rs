//! Error types for webapp-core

/// Result type for webapp-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in webapp-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Requested database id has no configured profile
    #[error("No database settings for id {id} (count {count})")]
    DatabaseIdOutOfRange { id: usize, count: usize },

    /// Filesystem error from webapp-fs
    #[error(transparent)]
    Fs(#[from] webapp_fs::Error),
}
