//! Application state for Axum web framework.

use std::sync::Arc;

use crate::cache::{CacheStore, KeyValueStore};
use crate::config::RateLimitConfig;
use crate::rate_limit::RateLimiter;
use crate::services::Services;
use crate::utils::clock::SharedClock;

/// Shared handles for every request handler.
///
/// The cache façade and the limiter share one backend connection, built
/// once at startup. Cloning is cheap since everything inside is `Arc`-backed.
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    pub limiter: RateLimiter,
    pub rate_limit: RateLimitConfig,
}

impl AppState {
    /// # Example
    /// ```ignore
    /// let backend = connect_store(&settings.cache, clock.clone()).await?;
    /// let state = AppState::new(backend, clock, settings.rate_limit.clone());
    /// ```
    pub fn new(backend: Arc<dyn KeyValueStore>, clock: SharedClock, rate_limit: RateLimitConfig) -> Self {
        let services = Services::new(CacheStore::new(backend.clone()));
        let limiter = RateLimiter::new(backend, clock).with_fail_open(rate_limit.fail_open);
        Self {
            services,
            limiter,
            rate_limit,
        }
    }
}
