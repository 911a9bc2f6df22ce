//! Cache error types.

use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors that can occur when using the cache.
///
/// Malformed stored content is never reported here; it reads back as a miss.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Failed to serialize a value for storage.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The underlying store rejected an operation.
    #[error("store operation failed: {0}")]
    Store(String),

    /// File-backed storage I/O failure.
    #[error("store I/O failed for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
