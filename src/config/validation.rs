//! Configuration validation logic
//!
//! Each section validates itself and reports the first offending field.

use crate::config::environment::Environment;
use crate::config::error::ConfigError;
use crate::config::settings::{
    CacheBackend, CacheConfig, LoggerSettings, RateLimitConfig, RedisCacheConfig, ServerConfig,
    Settings,
};

/// Valid log levels
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid log formats
const VALID_LOG_FORMATS: &[&str] = &["full", "compact", "json"];

/// Longest accepted rate-limit window (one week)
const MAX_WINDOW_SECONDS: u64 = 7 * 24 * 60 * 60;

/// Accepted Redis URL schemes
const VALID_REDIS_SCHEMES: &[&str] = &["redis://", "rediss://"];

impl ServerConfig {
    /// Validate server configuration
    ///
    /// # Validation Rules
    /// - Port must be between 1 and 65535
    /// - Request timeout must be greater than 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::validation(
                "server.host",
                "Host is required. Use 127.0.0.1 for local access or 0.0.0.0 for all interfaces.",
            ));
        }

        if self.port == 0 {
            return Err(ConfigError::validation(
                "server.port",
                "Port must be between 1 and 65535. Please specify a valid port number.",
            ));
        }

        if self.request_timeout == 0 {
            return Err(ConfigError::validation(
                "server.request_timeout",
                "Request timeout must be greater than 0 seconds.",
            ));
        }

        Ok(())
    }
}

impl LoggerSettings {
    /// Validate logger settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        let level = self.level.to_lowercase();
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.level".to_string(),
                message: format!(
                    "Invalid log level '{}'. Valid levels are: {}",
                    self.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        let format = self.format.to_lowercase();
        if !VALID_LOG_FORMATS.contains(&format.as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.format".to_string(),
                message: format!(
                    "Invalid log format '{}'. Valid formats are: {}",
                    self.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            });
        }

        Ok(())
    }
}

impl RedisCacheConfig {
    /// Validate Redis settings
    ///
    /// # Validation Rules
    /// - URL and token must both be present
    /// - URL must use the `redis://` or `rediss://` scheme
    /// - Pool size and timeouts must be greater than 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::validation(
                "cache.redis.url",
                "Redis URL is required when the cache backend is redis. Set RECIPE_CACHE__REDIS__URL.",
            ));
        }

        if !VALID_REDIS_SCHEMES
            .iter()
            .any(|scheme| self.url.starts_with(scheme))
        {
            return Err(ConfigError::validation(
                "cache.redis.url",
                "Invalid Redis URL format. Expected redis://host:port or rediss://host:port",
            ));
        }

        if self.token.trim().is_empty() {
            return Err(ConfigError::validation(
                "cache.redis.token",
                "Redis token is required when the cache backend is redis. Set RECIPE_CACHE__REDIS__TOKEN.",
            ));
        }

        if self.pool_size == 0 {
            return Err(ConfigError::validation(
                "cache.redis.pool_size",
                "Pool size must be greater than 0.",
            ));
        }

        if self.connection_timeout == 0 {
            return Err(ConfigError::validation(
                "cache.redis.connection_timeout",
                "Connection timeout must be greater than 0 seconds.",
            ));
        }

        if self.command_timeout_ms == 0 {
            return Err(ConfigError::validation(
                "cache.redis.command_timeout_ms",
                "Command timeout must be greater than 0 milliseconds.",
            ));
        }

        Ok(())
    }
}

impl CacheConfig {
    /// Redis settings are only checked when Redis is the selected backend.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.backend {
            CacheBackend::Redis => self.redis.validate(),
            CacheBackend::Memory => Ok(()),
        }
    }
}

impl RateLimitConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.enabled {
            return Ok(());
        }

        if self.limit == 0 {
            return Err(ConfigError::validation(
                "rate_limit.limit",
                "Limit must be greater than 0. Disable rate limiting with rate_limit.enabled = false.",
            ));
        }

        if self.window_seconds == 0 {
            return Err(ConfigError::validation(
                "rate_limit.window_seconds",
                "Window must be at least 1 second.",
            ));
        }

        if self.window_seconds > MAX_WINDOW_SECONDS {
            return Err(ConfigError::validation(
                "rate_limit.window_seconds",
                format!("Window must be at most {} seconds (one week).", MAX_WINDOW_SECONDS),
            ));
        }

        Ok(())
    }
}

impl Settings {
    /// Validate every section, returning the first error found
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.logger.validate()?;
        self.cache.validate()?;
        self.rate_limit.validate()?;
        Ok(())
    }

    /// Environment-specific checks on top of [`Settings::validate`]
    pub fn validate_for(&self, environment: Environment) -> Result<(), ConfigError> {
        self.validate()?;

        if environment.is_production() && self.cache.backend == CacheBackend::Memory {
            return Err(ConfigError::validation(
                "cache.backend",
                "The memory backend is not shared between instances and cannot be used in production.",
            ));
        }

        Ok(())
    }
}
