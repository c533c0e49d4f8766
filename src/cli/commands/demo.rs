//! Arithmetic demo: `y = 2x + 50` over a counter.

use anyhow::Result;
use futures::StreamExt;
use std::time::{Duration, Instant};
use tickgraph_config::AppConfig;
use tickgraph_data::interval_series;
use tickgraph_engine::{generate_async_with, generate_sync_with, IndicatorGraph};
use tickgraph_monitor::RunSummary;
use tracing::info;

use super::{engine_config, print_record};
use crate::cli::DemoArgs;

pub async fn run(args: DemoArgs, config: &AppConfig) -> Result<()> {
    let engine = engine_config(&args.engine, config);
    let values: Vec<f64> = (0..args.ticks).map(f64::from).collect();
    info!(ticks = args.ticks, use_async = args.use_async, "Starting demo");

    let graph = IndicatorGraph::new();
    let x = if args.use_async {
        graph.async_source("x", interval_series(values, Duration::from_millis(args.interval_ms)))?;
        graph.leaf("x")
    } else {
        graph.raw_series("x", values)?
    };
    let y = (x * 2 + 50).named("y");
    let roots = [("x", x.id()), ("y", y.id())];

    let started = Instant::now();
    let summary = if args.use_async {
        let mut ticks = generate_async_with(graph, roots, engine)?;
        while let Some(record) = ticks.next().await {
            print_record(&record?, args.engine.json)?;
        }
        RunSummary::new(ticks.compiled(), &ticks.stats(), started.elapsed())
    } else {
        let mut ticks = generate_sync_with(graph, roots, engine)?;
        for record in ticks.by_ref() {
            print_record(&record?, args.engine.json)?;
        }
        RunSummary::new(ticks.compiled(), &ticks.stats(), started.elapsed())
    };

    summary.log();
    Ok(())
}
