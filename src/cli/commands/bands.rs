//! Bollinger bands over a CSV column.

use anyhow::{Context, Result};
use std::path::Path;
use std::time::Instant;
use tickgraph_config::AppConfig;
use tickgraph_core::types::NodeId;
use tickgraph_core::TickGraphResult;
use tickgraph_data::CsvColumn;
use tickgraph_engine::{generate_sync_with, IndicatorGraph};
use tickgraph_indicators::IndicatorExt;
use tickgraph_monitor::RunSummary;
use tracing::info;

use super::{engine_config, print_record};
use crate::cli::BandsArgs;

pub async fn run(args: BandsArgs, config: &AppConfig) -> Result<()> {
    if args.period == 0 {
        anyhow::bail!("Period must be at least 1");
    }
    if args.k.is_nan() || args.k <= 0.0 {
        anyhow::bail!("Band width must be positive, got {}", args.k);
    }

    let column = args.column.clone().unwrap_or_else(|| config.data.column.clone());
    let timestamp = args.timestamp.clone().or_else(|| config.data.timestamp_column.clone());
    info!(path = %args.path.display(), column = %column, period = args.period, k = args.k, "Computing bands");

    let (graph, roots) = band_graph(&args.path, &column, timestamp, args.period, args.k)
        .with_context(|| format!("Failed to build bands over {}", args.path.display()))?;

    let started = Instant::now();
    let mut ticks = generate_sync_with(graph, roots, engine_config(&args.engine, config))?;
    for record in ticks.by_ref() {
        print_record(&record?, args.engine.json)?;
    }

    RunSummary::new(ticks.compiled(), &ticks.stats(), started.elapsed()).log();
    Ok(())
}

/// Graph of the price column and its bands, with the roots to evaluate.
fn band_graph(
    path: &Path,
    column: &str,
    timestamp: Option<String>,
    period: usize,
    k: f64,
) -> TickGraphResult<(IndicatorGraph, Vec<(String, NodeId)>)> {
    let mut csv = CsvColumn::new(path, column)?;
    if let Some(timestamp) = timestamp {
        csv = csv.sorted_by(timestamp);
    }

    let graph = IndicatorGraph::new();
    graph.source(column, csv.into_source()?)?;
    let price = graph.leaf(column);
    let bands = price.bollinger_bands(period, k);
    let roots = vec![
        (column.to_string(), price.id()),
        ("middle".to_string(), bands.middle.id()),
        ("upper".to_string(), bands.upper.id()),
        ("lower".to_string(), bands.lower.id()),
    ];

    Ok((graph, roots))
}
