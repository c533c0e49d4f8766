//! Validate configuration command.

use anyhow::Result;
use std::path::Path;
use tickgraph_config::AppConfig;

pub async fn run(config_path: Option<&Path>, config: &AppConfig) -> Result<()> {
    match config_path {
        Some(path) => println!("Validating configuration: {:?}", path),
        None => println!("No configuration file given, using defaults and environment"),
    }

    println!("Configuration is valid!");
    println!();
    println!("App: {}", config.app.name);
    println!("Environment: {}", config.app.environment);
    println!("Log level: {}", config.logging.level);
    println!("Log format: {}", config.logging.format);
    println!("Warm-up policy: {:?}", config.engine.warmup);
    println!("Error policy: {:?}", config.engine.on_error);
    println!("Progress every: {} ticks", config.engine.progress_every);
    println!("Default column: {}", config.data.column);
    if let Some(timestamp) = &config.data.timestamp_column {
        println!("Timestamp column: {}", timestamp);
    }

    Ok(())
}
