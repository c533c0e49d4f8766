//! Indicator graph CLI application.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use tickgraph_config::load_config;
use tickgraph_monitor::setup_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;

    let log_level = cli
        .log_level
        .map(|level| level.as_str().to_string())
        .unwrap_or_else(|| config.logging.level.clone());
    setup_logging(&log_level, cli.json_logs || config.logging.is_json())?;

    match cli.command {
        Commands::Demo(args) => cli::commands::demo::run(args, &config).await,
        Commands::Bands(args) => cli::commands::bands::run(args, &config).await,
        Commands::ValidateConfig => cli::commands::validate::run(cli.config.as_deref(), &config).await,
    }
}
