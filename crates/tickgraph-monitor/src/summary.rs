//! End-of-run summaries.

use serde::Serialize;
use std::time::Duration;
use tickgraph_engine::{CompiledGraph, EvaluationStats};
use tracing::info;

/// What a finished evaluation did, in a loggable shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub nodes: usize,
    pub roots: usize,
    pub sources: usize,
    pub ticks: u64,
    pub records: u64,
    pub faults: u64,
    pub window_budget: usize,
    pub elapsed_ms: u64,
    pub ticks_per_sec: f64,
}

impl RunSummary {
    pub fn new(compiled: &CompiledGraph, stats: &EvaluationStats, elapsed: Duration) -> Self {
        let secs = elapsed.as_secs_f64();
        let ticks_per_sec = if secs > 0.0 { stats.ticks as f64 / secs } else { 0.0 };

        Self {
            nodes: compiled.node_count(),
            roots: compiled.roots().len(),
            sources: compiled.sources().len(),
            ticks: stats.ticks,
            records: stats.records,
            faults: stats.faults,
            window_budget: stats.window_budget,
            elapsed_ms: elapsed.as_millis() as u64,
            ticks_per_sec,
        }
    }

    /// Fraction of ticks that produced a record.
    pub fn yield_ratio(&self) -> f64 {
        if self.ticks == 0 {
            0.0
        } else {
            self.records as f64 / self.ticks as f64
        }
    }

    pub fn log(&self) {
        info!(
            nodes = self.nodes,
            roots = self.roots,
            sources = self.sources,
            ticks = self.ticks,
            records = self.records,
            faults = self.faults,
            window_budget = self.window_budget,
            elapsed_ms = self.elapsed_ms,
            ticks_per_sec = format!("{:.0}", self.ticks_per_sec),
            "Evaluation finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickgraph_engine::{generate_sync, IndicatorGraph};

    #[test]
    fn test_summary_from_run() {
        let graph = IndicatorGraph::new();
        let x = graph.raw_series("x", (0..100).map(f64::from)).unwrap();
        let y = x.lag(4) + 1;
        let roots = [("y", y.id())];

        let mut ticks = generate_sync(graph, roots).unwrap();
        for record in ticks.by_ref() {
            record.unwrap();
        }

        let summary = RunSummary::new(ticks.compiled(), &ticks.stats(), Duration::from_millis(20));
        assert_eq!(summary.roots, 1);
        assert_eq!(summary.sources, 1);
        assert_eq!(summary.ticks, 100);
        assert_eq!(summary.records, 96);
        assert_eq!(summary.faults, 0);
        assert!((summary.yield_ratio() - 0.96).abs() < 1e-12);
        assert!((summary.ticks_per_sec - 5000.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_elapsed() {
        let graph = IndicatorGraph::new();
        let x = graph.raw_series("x", Vec::<f64>::new()).unwrap();
        let roots = [("x", x.id())];
        let ticks = generate_sync(graph, roots).unwrap();

        let summary = RunSummary::new(ticks.compiled(), &ticks.stats(), Duration::ZERO);
        assert_eq!(summary.ticks_per_sec, 0.0);
        assert_eq!(summary.yield_ratio(), 0.0);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["ticks"], 0);
    }
}
