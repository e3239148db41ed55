use clap::Parser;
use recipe_cache::cli::{
    Cli, CommandOutcome, execute_command, init_logger_from_settings, load_and_merge_config,
};
use recipe_cache::server::Server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (settings, environment) = load_and_merge_config(&cli).inspect_err(|e| {
        eprintln!("Configuration error: {}", e);
        eprintln!("{}", Cli::get_validation_help());
    })?;

    init_logger_from_settings(&settings)?;

    match execute_command(&cli, settings.clone(), environment).await? {
        CommandOutcome::StartServer => Server::new(settings, environment).run().await,
        CommandOutcome::Done => Ok(()),
    }
}
