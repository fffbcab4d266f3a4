//! Error types for the class-cache crate

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

#[derive(Error, Debug)]
pub enum CacheError {
    /// IO operations failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to create the cache directory
    #[error("Failed to create cache directory: {path:?}")]
    CacheDirectoryCreationFailed { path: PathBuf },

    /// Failed to determine the user's home directory
    #[error("Failed to determine system cache directory")]
    SystemCacheDirectoryNotFound,
}
