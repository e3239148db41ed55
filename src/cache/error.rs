//! Cache error types.

use thiserror::Error;

/// Errors that can occur while talking to the key-value store.
///
/// These never escape [`CacheStore`](crate::cache::CacheStore) or the rate
/// limiter; they are logged and mapped to safe defaults there.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache operation failed: {0}")]
    Operation(String),

    #[error("Cache connection failed: {0}")]
    Connection(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Cache operation timed out after {0}ms")]
    Timeout(u64),

    #[error("WRONGTYPE operation against key '{0}' holding the wrong kind of value")]
    WrongType(String),
}

impl From<serde_json::Error> for CacheError {
    fn from(error: serde_json::Error) -> Self {
        CacheError::Serialization(error.to_string())
    }
}
