//! Serve command handler
//!
//! Handles the serve command's dry-run validation. Actual server startup is
//! driven from `main`.

use crate::config::{CacheBackend, Environment, settings::Settings};
use crate::error::AppResult;

const REDACTED: &str = "********";

/// Handler for the serve command
pub struct ServeCommandHandler {
    config: Settings,
    environment: Environment,
}

impl ServeCommandHandler {
    pub fn new(config: Settings, environment: Environment) -> Self {
        Self {
            config,
            environment,
        }
    }

    /// Execute the serve command with optional dry-run support
    ///
    /// # Errors
    /// - Configuration validation errors
    pub async fn execute(&self, dry_run: bool) -> AppResult<()> {
        if dry_run {
            self.validate_only()
        } else {
            // main.rs starts the server once this returns
            Ok(())
        }
    }

    /// Validate configuration without starting the server
    pub fn validate_only(&self) -> AppResult<()> {
        self.config.validate_for(self.environment)?;

        println!("✓ Configuration is valid for environment: {}", self.environment);
        println!("✓ Server would bind to: {}", self.config.server.address());
        match self.config.cache.backend {
            CacheBackend::Redis => println!("✓ Redis cache backend is configured"),
            CacheBackend::Memory => println!("✓ In-process memory cache backend is configured"),
        }
        if self.config.rate_limit.enabled {
            println!(
                "✓ Rate limit: {} requests per {}s (fail_open = {})",
                self.config.rate_limit.limit,
                self.config.rate_limit.window_seconds,
                self.config.rate_limit.fail_open
            );
        } else {
            println!("✓ Rate limiting is disabled");
        }

        let rendered = toml::to_string_pretty(&self.redacted_config())
            .map_err(|e| anyhow::anyhow!("Failed to render configuration: {}", e))?;
        println!("\n# Effective configuration\n{}", rendered);

        println!("Dry run completed successfully - configuration is ready for deployment");
        Ok(())
    }

    /// Settings with the store credentials masked
    pub fn redacted_config(&self) -> Settings {
        let mut config = self.config.clone();
        if !config.cache.redis.token.is_empty() {
            config.cache.redis.token = REDACTED.to_string();
        }
        config.cache.redis.url = redact_url(&config.cache.redis.url);
        config
    }

    pub fn config(&self) -> &Settings {
        &self.config
    }
}

/// Mask the userinfo part of a URL, if any
fn redact_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}{}{}", &url[..scheme_end + 3], REDACTED, &url[at..])
        }
        _ => url.to_string(),
    }
}
