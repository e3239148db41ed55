//! Server module for managing HTTP server lifecycle
//!
//! This module handles server initialization, startup, and graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::signal;
use tower_http::timeout::TimeoutLayer;

use crate::api::routes::create_router;
use crate::cache::connect_store;
use crate::config::{Environment, settings::Settings};
use crate::state::AppState;
use crate::utils::clock::{SharedClock, SystemClock};

/// HTTP server manager
pub struct Server {
    settings: Settings,
    environment: Environment,
}

impl Server {
    pub fn new(settings: Settings, environment: Environment) -> Self {
        Self {
            settings,
            environment,
        }
    }

    /// Connect the store, build the router and serve until shutdown.
    ///
    /// # Errors
    /// - Cache backend construction errors
    /// - Address binding errors
    /// - Server runtime errors
    pub async fn run(self) -> anyhow::Result<()> {
        tracing::info!(
            app_name = %self.settings.application.name,
            app_version = %self.settings.application.version,
            environment = %self.environment,
            "Application starting"
        );

        tracing::info!(
            host = %self.settings.server.host,
            port = self.settings.server.port,
            request_timeout = self.settings.server.request_timeout,
            "Server configuration loaded"
        );

        // Never log the Redis URL or token
        tracing::info!(
            backend = ?self.settings.cache.backend,
            pool_size = self.settings.cache.redis.pool_size,
            command_timeout_ms = self.settings.cache.redis.command_timeout_ms,
            "Cache configuration loaded"
        );

        tracing::info!(
            enabled = self.settings.rate_limit.enabled,
            limit = self.settings.rate_limit.limit,
            window_seconds = self.settings.rate_limit.window_seconds,
            fail_open = self.settings.rate_limit.fail_open,
            "Rate limit configuration loaded"
        );

        let clock: SharedClock = Arc::new(SystemClock);
        let backend = connect_store(&self.settings.cache, clock.clone())
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to initialize cache backend");
                anyhow::anyhow!("Failed to initialize cache backend: {}", e)
            })?;

        let state = AppState::new(backend, clock, self.settings.rate_limit.clone());

        let health = state.services.cache.health_check().await;
        if health.ok {
            tracing::info!("Cache backend reachable");
        } else {
            // Operations degrade gracefully, so a cold store is not fatal
            tracing::warn!(message = %health.message, "Cache backend not reachable at startup");
        }

        let router = create_router(state).layer(TimeoutLayer::new(Duration::from_secs(
            self.settings.server.request_timeout,
        )));

        let address = self.settings.server.address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!(error = %e, address = %address, "Failed to bind to address");
            anyhow::anyhow!("Failed to bind to {}: {}", address, e)
        })?;

        tracing::info!(address = %address, "Server listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}

/// Waits for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
