//! Fail-soft typed access to the key-value store.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::cache::{CacheError, KeyValueStore};

/// Typed wrapper over a [`KeyValueStore`] that never fails.
///
/// Values are stored as JSON. Every backend error is logged and answered
/// with a safe default (`None`, `false`, `0`), so an unreachable store
/// degrades the application to "no caching" instead of an error. Nothing is
/// retried and nothing is kept in process.
#[derive(Clone)]
pub struct CacheStore {
    backend: Arc<dyn KeyValueStore>,
}

impl CacheStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Get a reference to the store backend.
    pub fn backend(&self) -> &Arc<dyn KeyValueStore> {
        &self.backend
    }

    /// Read and deserialize a value. Misses, backend errors and undecodable
    /// payloads all read as `None`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.backend.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    debug!(key = %key, "Cache hit");
                    Some(value)
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "Cached value could not be decoded");
                    None
                }
            },
            Ok(None) => {
                debug!(key = %key, "Cache miss");
                None
            }
            Err(e) => {
                log_failure("get", key, &e);
                None
            }
        }
    }

    /// Serialize and store a value with an expiry in seconds.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl_seconds: u64) -> bool {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                log_failure("set", key, &CacheError::from(e));
                return false;
            }
        };
        match self.backend.set_ex(key, raw, ttl_seconds).await {
            Ok(()) => true,
            Err(e) => {
                log_failure("set", key, &e);
                false
            }
        }
    }

    pub async fn del(&self, key: &str) -> bool {
        match self.backend.del(&[key.to_string()]).await {
            Ok(_) => true,
            Err(e) => {
                log_failure("del", key, &e);
                false
            }
        }
    }

    /// Delete every key matching `pattern` in one batch.
    ///
    /// Succeeds when nothing matched; fails only when enumeration or the
    /// batch delete fails.
    pub async fn del_pattern(&self, pattern: &str) -> bool {
        let keys = match self.backend.keys(pattern).await {
            Ok(keys) => keys,
            Err(e) => {
                log_failure("del_pattern", pattern, &e);
                return false;
            }
        };
        if keys.is_empty() {
            return true;
        }
        match self.backend.del(&keys).await {
            Ok(removed) => {
                debug!(pattern = %pattern, removed, "Deleted keys by pattern");
                true
            }
            Err(e) => {
                log_failure("del_pattern", pattern, &e);
                false
            }
        }
    }

    /// Increment a counter, giving a fresh counter an expiry of `ttl_seconds`.
    ///
    /// Returns 0 on backend failure, which cannot be told apart from a real
    /// zero count.
    pub async fn incr(&self, key: &str, ttl_seconds: u64) -> i64 {
        let result = async {
            let count = self.backend.incr(key).await?;
            if count == 1 {
                self.backend.expire(key, ttl_seconds).await?;
            }
            Ok::<_, CacheError>(count)
        }
        .await;

        result.unwrap_or_else(|e| {
            log_failure("incr", key, &e);
            0
        })
    }

    pub async fn expire(&self, key: &str, ttl_seconds: u64) -> bool {
        self.backend
            .expire(key, ttl_seconds)
            .await
            .unwrap_or_else(|e| {
                log_failure("expire", key, &e);
                false
            })
    }

    pub async fn exists(&self, key: &str) -> bool {
        self.backend.exists(key).await.unwrap_or_else(|e| {
            log_failure("exists", key, &e);
            false
        })
    }

    /// Read many values in input order. An empty input skips the backend.
    ///
    /// On backend failure every slot is `None`.
    pub async fn mget<T: DeserializeOwned>(&self, keys: &[String]) -> Vec<Option<T>> {
        if keys.is_empty() {
            return Vec::new();
        }
        match self.backend.mget(keys).await {
            Ok(values) => values
                .into_iter()
                .map(|raw| raw.and_then(|raw| serde_json::from_str(&raw).ok()))
                .collect(),
            Err(e) => {
                log_failure("mget", &keys.join(","), &e);
                keys.iter().map(|_| None).collect()
            }
        }
    }

    pub async fn sadd(&self, key: &str, member: &str) -> bool {
        self.backend.sadd(key, member).await.unwrap_or_else(|e| {
            log_failure("sadd", key, &e);
            false
        })
    }

    pub async fn sismember(&self, key: &str, member: &str) -> bool {
        self.backend
            .sismember(key, member)
            .await
            .unwrap_or_else(|e| {
                log_failure("sismember", key, &e);
                false
            })
    }

    pub async fn srem(&self, key: &str, member: &str) -> bool {
        self.backend.srem(key, member).await.unwrap_or_else(|e| {
            log_failure("srem", key, &e);
            false
        })
    }
}

fn log_failure(operation: &'static str, key: &str, error: &CacheError) {
    warn!(operation, key = %key, error = %error, "Cache operation failed, using fallback");
}
