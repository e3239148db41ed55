//! Cache module: key namespace, TTL tiers and fail-soft store access.
//!
//! The remote key-value store is reached through the [`KeyValueStore`]
//! trait, with two backends:
//! - Redis (shared, network-based; production)
//! - Memory (in-process; local development and tests)
//!
//! # Configuration
//!
//! ```toml
//! [cache]
//! backend = "redis"  # or "memory"
//!
//! [cache.redis]
//! url = "rediss://cache.example.com:6379"
//! token = "..."            # usually RECIPE_CACHE__REDIS__TOKEN
//! pool_size = 8
//! connection_timeout = 5
//! command_timeout_ms = 1000
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let backend = connect_store(&settings.cache, Arc::new(SystemClock)).await?;
//! let store = CacheStore::new(backend.clone());
//! store.set(&CacheKey::Recipe("r1").build(), &recipe, TtlTier::Long.seconds()).await;
//! ```

mod error;
pub mod keys;
mod manager;
mod memory;
mod redis;
mod store;
#[cfg(test)]
pub(crate) mod testing;
mod traits;
pub mod ttl;

pub use error::CacheError;
pub use keys::CacheKey;
pub use manager::connect_store;
pub use memory::MemoryStore;
pub use self::redis::RedisStore;
pub use store::CacheStore;
pub use traits::KeyValueStore;
pub use ttl::TtlTier;

// Re-export config types
pub use crate::config::settings::{CacheBackend, CacheConfig, RedisCacheConfig};
