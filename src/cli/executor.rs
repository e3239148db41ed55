//! Command executor for dispatching CLI commands

use super::handlers::{HealthCommandHandler, ServeCommandHandler};
use super::parser::{Cli, Commands};
use crate::config::{Environment, settings::Settings};
use crate::error::{AppError, AppResult};

/// What `main` should do after a command has been handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Start the HTTP server with the merged settings
    StartServer,
    /// The command ran to completion
    Done,
}

/// Execute a CLI command with the given settings
///
/// # Errors
/// Returns errors from command handlers or argument validation failures
pub async fn execute_command(
    cli: &Cli,
    settings: Settings,
    environment: Environment,
) -> AppResult<CommandOutcome> {
    validate_command_args(cli)?;

    match &cli.command {
        Some(Commands::Serve { dry_run: true, .. }) => {
            ServeCommandHandler::new(settings, environment)
                .execute(true)
                .await?;
            Ok(CommandOutcome::Done)
        }
        Some(Commands::Serve { .. }) | None => Ok(CommandOutcome::StartServer),
        Some(Commands::Health) => {
            HealthCommandHandler::new(settings).execute().await?;
            Ok(CommandOutcome::Done)
        }
    }
}

fn validate_command_args(cli: &Cli) -> AppResult<()> {
    cli.validate().map_err(|reason| AppError::Validation {
        field: "cli_arguments".to_string(),
        reason,
    })?;

    if let Some(Commands::Serve {
        host: Some(host_addr),
        port: Some(80),
        ..
    }) = &cli.command
        && host_addr == "localhost"
    {
        eprintln!("Warning: Using port 80 with localhost may conflict with other services");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheBackend;
    use clap::Parser;

    fn create_valid_config() -> Settings {
        let mut config = Settings::default();
        config.cache.backend = CacheBackend::Memory;
        config
    }

    #[tokio::test]
    async fn test_execute_serve_dry_run() {
        let cli = Cli::try_parse_from(["recipe-cache", "serve", "--dry-run"]).unwrap();
        let outcome = execute_command(&cli, create_valid_config(), Environment::Development)
            .await
            .unwrap();
        assert_eq!(outcome, CommandOutcome::Done);
    }

    #[tokio::test]
    async fn test_execute_serve_normal() {
        for args in [vec!["recipe-cache", "serve"], vec!["recipe-cache"]] {
            let cli = Cli::try_parse_from(args).unwrap();
            let outcome = execute_command(&cli, create_valid_config(), Environment::Development)
                .await
                .unwrap();
            assert_eq!(outcome, CommandOutcome::StartServer);
        }
    }

    #[tokio::test]
    async fn test_execute_health() {
        let cli = Cli::try_parse_from(["recipe-cache", "health"]).unwrap();
        let outcome = execute_command(&cli, create_valid_config(), Environment::Test)
            .await
            .unwrap();
        assert_eq!(outcome, CommandOutcome::Done);
    }

    #[test]
    fn test_validate_conflicting_args() {
        let cli = Cli {
            command: None,
            config: None,
            env: None,
            verbose: true,
            quiet: true,
        };
        assert!(matches!(
            validate_command_args(&cli),
            Err(AppError::Validation { .. })
        ));
    }
}
