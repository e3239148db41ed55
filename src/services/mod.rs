//! Service layer for domain operations.

mod cache_service;

pub use cache_service::{CacheHealth, CacheService, normalize_query};

use crate::cache::CacheStore;

/// Aggregates all services for use as Axum application state.
#[derive(Clone)]
pub struct Services {
    pub cache: CacheService,
}

impl Services {
    pub fn new(store: CacheStore) -> Self {
        Self {
            cache: CacheService::new(store),
        }
    }
}
