use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
/// Errors returned by OCR cache stores.
pub enum CacheError {
    /// IO error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Cache root path is missing/unavailable.
    #[error("cache path unavailable: {path}")]
    StorageUnavailable {
        /// Path that was unavailable.
        path: PathBuf,
    },

    /// Blocking task panicked or was cancelled.
    #[error("cache task failed: {0}")]
    Task(String),
}

/// Convenience result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
