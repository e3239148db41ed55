//! KeyValueStore trait definition.

use async_trait::async_trait;

use crate::cache::CacheError;

/// Primitive operations of the remote key-value store.
///
/// Every method is one round trip and reports backend failures as
/// [`CacheError`]. Callers that must never fail go through
/// [`CacheStore`](crate::cache::CacheStore) instead.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a string value.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Write a string value that expires after `ttl_seconds`.
    async fn set_ex(&self, key: &str, value: String, ttl_seconds: u64) -> Result<(), CacheError>;

    /// Delete keys, returning how many existed.
    async fn del(&self, keys: &[String]) -> Result<u64, CacheError>;

    /// List keys matching a glob pattern (`*`, `?`).
    async fn keys(&self, pattern: &str) -> Result<Vec<String>, CacheError>;

    /// Atomically increment an integer counter, creating it at 0 first.
    async fn incr(&self, key: &str) -> Result<i64, CacheError>;

    /// Set a key's expiry. Returns `false` when the key does not exist.
    async fn expire(&self, key: &str, ttl_seconds: u64) -> Result<bool, CacheError>;

    async fn exists(&self, key: &str) -> Result<bool, CacheError>;

    /// Read many string values at once, preserving input order.
    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>, CacheError>;

    /// Add a member to a set. Returns `true` when it was not yet present.
    async fn sadd(&self, key: &str, member: &str) -> Result<bool, CacheError>;

    async fn sismember(&self, key: &str, member: &str) -> Result<bool, CacheError>;

    /// Remove a member from a set. Returns `true` when it was present.
    async fn srem(&self, key: &str, member: &str) -> Result<bool, CacheError>;

    /// Remove sorted-set members whose score lies in `[min, max]`.
    async fn zrem_range_by_score(&self, key: &str, min: f64, max: f64)
    -> Result<u64, CacheError>;

    /// Number of members in a sorted set (0 when the key is absent).
    async fn zcard(&self, key: &str) -> Result<u64, CacheError>;

    /// Add a scored member to a sorted set. Returns `true` when newly added.
    async fn zadd(&self, key: &str, score: f64, member: &str) -> Result<bool, CacheError>;
}
