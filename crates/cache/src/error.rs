//! Cache error types.

use thiserror::Error;

/// Errors that can occur while reading or writing cache entries.
#[derive(Debug, Error)]
pub enum CacheError {
    /// A value could not be encoded or decoded as JSON.
    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The cache backend failed.
    #[error("Cache backend error: {0}")]
    Backend(String),
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
