//! Construction of the configured store backend.

use std::sync::Arc;

use crate::cache::memory::MemoryStore;
use crate::cache::redis::RedisStore;
use crate::cache::{CacheError, KeyValueStore};
use crate::config::settings::{CacheBackend, CacheConfig};
use crate::utils::clock::SharedClock;

/// Build the store client once at startup.
///
/// The returned handle is shared by dependency injection with
/// [`CacheStore`](crate::cache::CacheStore) and
/// [`RateLimiter`](crate::rate_limit::RateLimiter); there is no global
/// instance.
pub async fn connect_store(
    config: &CacheConfig,
    clock: SharedClock,
) -> Result<Arc<dyn KeyValueStore>, CacheError> {
    let backend: Arc<dyn KeyValueStore> = match config.backend {
        CacheBackend::Memory => {
            tracing::warn!("Using in-process memory store; cache state is not shared");
            Arc::new(MemoryStore::new(clock))
        }
        CacheBackend::Redis => {
            if config.redis.url.is_empty() || config.redis.token.is_empty() {
                return Err(CacheError::Connection(
                    "store URL and access token are both required".to_string(),
                ));
            }
            Arc::new(RedisStore::new(&config.redis).await?)
        }
    };

    tracing::info!(backend = ?config.backend, "Key-value store initialized");
    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::clock::ManualClock;

    #[tokio::test]
    async fn test_memory_backend() {
        let config = CacheConfig {
            backend: CacheBackend::Memory,
            ..Default::default()
        };
        let store = connect_store(&config, Arc::new(ManualClock::new(0)))
            .await
            .unwrap();
        store.set_ex("k", "1".into(), 10).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("1".to_string()));
    }

    #[tokio::test]
    async fn test_redis_backend_requires_credentials() {
        let mut config = CacheConfig::default();
        config.redis.token = String::new();
        let result = connect_store(&config, Arc::new(ManualClock::new(0))).await;
        assert!(matches!(result, Err(CacheError::Connection(_))));
    }
}
