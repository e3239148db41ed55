//! Test doubles for the key-value store.

use async_trait::async_trait;

use crate::cache::{CacheError, KeyValueStore};

/// Store double whose every operation fails.
pub(crate) struct FailingStore;

fn down() -> CacheError {
    CacheError::Connection("connection refused".to_string())
}

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(down())
    }
    async fn set_ex(&self, _key: &str, _value: String, _ttl: u64) -> Result<(), CacheError> {
        Err(down())
    }
    async fn del(&self, _keys: &[String]) -> Result<u64, CacheError> {
        Err(down())
    }
    async fn keys(&self, _pattern: &str) -> Result<Vec<String>, CacheError> {
        Err(down())
    }
    async fn incr(&self, _key: &str) -> Result<i64, CacheError> {
        Err(down())
    }
    async fn expire(&self, _key: &str, _ttl: u64) -> Result<bool, CacheError> {
        Err(down())
    }
    async fn exists(&self, _key: &str) -> Result<bool, CacheError> {
        Err(down())
    }
    async fn mget(&self, _keys: &[String]) -> Result<Vec<Option<String>>, CacheError> {
        Err(down())
    }
    async fn sadd(&self, _key: &str, _member: &str) -> Result<bool, CacheError> {
        Err(down())
    }
    async fn sismember(&self, _key: &str, _member: &str) -> Result<bool, CacheError> {
        Err(down())
    }
    async fn srem(&self, _key: &str, _member: &str) -> Result<bool, CacheError> {
        Err(down())
    }
    async fn zrem_range_by_score(&self, _k: &str, _a: f64, _b: f64) -> Result<u64, CacheError> {
        Err(down())
    }
    async fn zcard(&self, _key: &str) -> Result<u64, CacheError> {
        Err(down())
    }
    async fn zadd(&self, _key: &str, _s: f64, _m: &str) -> Result<bool, CacheError> {
        Err(down())
    }
}
