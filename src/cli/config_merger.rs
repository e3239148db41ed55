//! Configuration merger for CLI arguments and config files
//!
//! CLI flags sit on top of the file and environment layers loaded by
//! [`ConfigLoader`].

use super::parser::{Cli, Commands};
use crate::config::error::ConfigError;
use crate::config::{ConfigLoader, Environment, settings::Settings};
use std::path::Path;

/// Applies CLI argument overrides to file-based configuration
pub struct ConfigurationMerger {
    base_config: Settings,
    environment: Environment,
}

impl ConfigurationMerger {
    pub fn new(base_config: Settings, environment: Environment) -> Self {
        Self {
            base_config,
            environment,
        }
    }

    /// Load the base configuration honouring `--config` and `--env`
    ///
    /// # Errors
    /// Returns ConfigError if configuration loading or validation fails
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let mut loader = ConfigLoader::new()?;

        if let Some(env) = cli.env {
            loader = loader.with_environment(env.into());
        }

        if let Some(path) = cli.config.as_ref() {
            Self::validate_config_file_access(path)?;
            loader = loader.with_config_file(path);
        }

        let environment = loader.environment();
        Ok(Self::new(loader.load()?, environment))
    }

    /// Validate that the configuration file is accessible and readable
    fn validate_config_file_access(path: &Path) -> Result<(), ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::validation(
                "config_file",
                format!(
                    "Configuration path does not exist or is not a file: '{}'",
                    path.display()
                ),
            ));
        }

        std::fs::File::open(path).map(|_| ()).map_err(|e| {
            ConfigError::validation(
                "config_file",
                format!("Cannot read configuration file '{}': {}", path.display(), e),
            )
        })
    }

    /// Merge CLI arguments with the base configuration
    ///
    /// CLI arguments have the highest priority. The merged result is
    /// re-validated for the selected environment.
    pub fn merge_cli_args(&self, cli: &Cli) -> Result<Settings, ConfigError> {
        let mut config = self.base_config.clone();

        if cli.verbose {
            config.logger.level = "debug".to_string();
        } else if cli.quiet {
            config.logger.level = "error".to_string();
        }

        if let Some(ref command) = cli.command {
            Self::apply_command_overrides(&mut config, command);
        }

        config.validate_for(self.environment)?;

        Ok(config)
    }

    fn apply_command_overrides(config: &mut Settings, command: &Commands) {
        match command {
            Commands::Serve {
                host,
                port,
                log_level,
                dry_run: _,
            } => {
                if let Some(host_addr) = host {
                    config.server.host = host_addr.clone();
                }

                if let Some(port_num) = port {
                    config.server.port = *port_num;
                }

                // Command-specific level beats --verbose/--quiet
                if let Some(level) = log_level {
                    config.logger.level = level.clone().into();
                }
            }
            Commands::Health => {}
        }
    }

    pub fn config(&self) -> &Settings {
        &self.base_config
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheBackend;
    use clap::Parser;

    fn create_valid_base_config() -> Settings {
        let mut config = Settings::default();
        config.cache.backend = CacheBackend::Memory;
        config
    }

    fn merger() -> ConfigurationMerger {
        ConfigurationMerger::new(create_valid_base_config(), Environment::Development)
    }

    #[test]
    fn test_configuration_merger_new() {
        let base_config = create_valid_base_config();
        let merger = ConfigurationMerger::new(base_config.clone(), Environment::Test);
        assert_eq!(merger.config(), &base_config);
        assert_eq!(merger.environment(), Environment::Test);
    }

    #[test]
    fn test_configuration_merger_merge_verbose_and_quiet_flags() {
        let cli = Cli::try_parse_from(["recipe-cache", "--verbose"]).unwrap();
        assert_eq!(merger().merge_cli_args(&cli).unwrap().logger.level, "debug");

        let cli = Cli::try_parse_from(["recipe-cache", "--quiet"]).unwrap();
        assert_eq!(merger().merge_cli_args(&cli).unwrap().logger.level, "error");
    }

    #[test]
    fn test_configuration_merger_merge_serve_host_and_port() {
        let cli = Cli::try_parse_from([
            "recipe-cache",
            "serve",
            "--host",
            "0.0.0.0",
            "--port",
            "8080",
        ])
        .unwrap();
        let merged_config = merger().merge_cli_args(&cli).unwrap();

        assert_eq!(merged_config.server.host, "0.0.0.0");
        assert_eq!(merged_config.server.port, 8080);
    }

    #[test]
    fn test_configuration_merger_command_log_level_overrides_global() {
        let cli =
            Cli::try_parse_from(["recipe-cache", "--verbose", "serve", "--log-level", "warn"])
                .unwrap();
        let merged_config = merger().merge_cli_args(&cli).unwrap();

        assert_eq!(merged_config.logger.level, "warn");
    }

    #[test]
    fn test_merge_revalidates_for_environment() {
        let merger =
            ConfigurationMerger::new(create_valid_base_config(), Environment::Production);
        let cli = Cli::try_parse_from(["recipe-cache", "serve"]).unwrap();

        assert!(matches!(
            merger.merge_cli_args(&cli),
            Err(ConfigError::ValidationError { ref field, .. }) if field == "cache.backend"
        ));
    }

    #[test]
    fn test_missing_config_file_rejected() {
        let result =
            ConfigurationMerger::validate_config_file_access(Path::new("/nope/missing.toml"));
        assert!(result.is_err());
    }
}
