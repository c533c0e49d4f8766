//! CLI command implementations.

pub mod bands;
pub mod demo;
pub mod validate;

use crate::cli::EngineArgs;
use anyhow::Result;
use tickgraph_config::AppConfig;
use tickgraph_core::types::{RootOutput, TickRecord};
use tickgraph_engine::EngineConfig;

/// Engine configuration from the file, with command line overrides applied.
pub(crate) fn engine_config(args: &EngineArgs, config: &AppConfig) -> EngineConfig {
    let mut engine = config.engine.clone();
    if let Some(warmup) = args.warmup {
        engine = engine.with_warmup(warmup.into());
    }
    if let Some(on_error) = args.on_error {
        engine = engine.with_error_policy(on_error.into());
    }
    engine
}

/// Print one record to stdout, as a JSON line or as text.
pub(crate) fn print_record(record: &TickRecord, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(record)?);
        return Ok(());
    }

    let fields: Vec<String> = record
        .iter()
        .map(|(root, output)| match output {
            RootOutput::Value(value) => format!("{}={:.4}", root, value),
            RootOutput::Error(fault) => format!("{}=error({})", root, fault),
            RootOutput::Warming => format!("{}=warming", root),
        })
        .collect();
    println!("{:>6}  {}", record.tick, fields.join("  "));
    Ok(())
}
