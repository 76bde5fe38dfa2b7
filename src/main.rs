//! Kaizen CLI entry point.

use clap::Parser;

use kaizen::cli::{commands, handle_error, load_config, Cli, Commands};
use kaizen::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => handle_error(err, cli.json),
    };

    let _logger = match LoggerImpl::init(&LogConfig::from(&config.logging)) {
        Ok(logger) => logger,
        Err(err) => handle_error(err, cli.json),
    };

    let result = match cli.command {
        Commands::Goal(args) => commands::goal::execute(args, &config, cli.json).await,
        Commands::Loop(args) => commands::loop_cmd::execute(args, &config, cli.json).await,
        Commands::Score(args) => commands::score::execute(args, &config, cli.json).await,
    };

    if let Err(err) = result {
        handle_error(err, cli.json);
    }
}
