use thiserror::Error;

use crate::config::ConfigError;
use crate::rate_limit::RateLimitResult;

/// Application-wide error type for the HTTP and CLI boundary.
///
/// Cache and limiter failures never reach this type: those layers absorb
/// their own backend errors. The only limiter outcome surfaced here is a
/// legitimate denial.
#[derive(Error, Debug)]
pub enum AppError {
    /// Caller exceeded its request budget for the current window
    #[error("Rate limit exceeded: {limit} requests allowed, retry after {retry_after}s")]
    RateLimited {
        limit: u32,
        remaining: u32,
        /// Unix seconds
        reset_time: i64,
        /// Delta seconds, at least 1
        retry_after: i64,
    },

    #[error("Validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Service unavailable: {message}")]
    ServiceUnavailable { message: String },

    #[error("Configuration error: {key}")]
    Configuration {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Internal error")]
    Internal {
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    /// Build the throttling error for a denied limiter result.
    pub fn rate_limited(limit: u32, result: &RateLimitResult, now_secs: i64) -> Self {
        AppError::RateLimited {
            limit,
            remaining: result.remaining,
            reset_time: result.reset_time,
            retry_after: result.retry_after(now_secs),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal { source: error }
    }
}

impl From<ConfigError> for AppError {
    fn from(error: ConfigError) -> Self {
        let key = match &error {
            ConfigError::ValidationError { field, .. } => field.clone(),
            _ => "settings".to_string(),
        };
        AppError::Configuration {
            key,
            source: error.into(),
        }
    }
}

/// Type alias for Result with AppError to simplify function signatures
pub type AppResult<T> = Result<T, AppError>;
