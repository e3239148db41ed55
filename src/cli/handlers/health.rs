//! Health command handler
//!
//! One-shot connectivity probe against the configured cache backend.

use std::sync::Arc;

use crate::cache::{CacheStore, connect_store};
use crate::config::settings::Settings;
use crate::error::{AppError, AppResult};
use crate::services::{CacheHealth, CacheService};
use crate::utils::clock::{SharedClock, SystemClock};

/// Handler for the health command
pub struct HealthCommandHandler {
    config: Settings,
}

impl HealthCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Connect the store and run a single write/read/delete probe
    ///
    /// # Errors
    /// `ServiceUnavailable` when the backend cannot be built or the probe fails
    pub async fn execute(&self) -> AppResult<()> {
        let health = self.probe().await?;

        if health.ok {
            println!("✓ Cache backend is healthy: {}", health.message);
            Ok(())
        } else {
            Err(AppError::ServiceUnavailable {
                message: health.message,
            })
        }
    }

    async fn probe(&self) -> AppResult<CacheHealth> {
        let clock: SharedClock = Arc::new(SystemClock);
        let backend = connect_store(&self.config.cache, clock)
            .await
            .map_err(|e| AppError::ServiceUnavailable {
                message: e.to_string(),
            })?;

        Ok(CacheService::new(CacheStore::new(backend))
            .health_check()
            .await)
    }
}
