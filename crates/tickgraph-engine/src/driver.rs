//! Fetch-feed-step loop shared by the sync and async engines.

use crate::compile::CompiledGraph;
use crate::evaluator::{EvaluationStats, Evaluator};
use crate::graph::IndicatorGraph;
use crate::policy::EngineConfig;
use crate::sources::{Fetch, SourceSet};
use tickgraph_core::error::EngineError;
use tickgraph_core::types::{NodeId, TickRecord};
use tracing::{debug, error, info};

pub(crate) type Item = Result<TickRecord, EngineError>;

pub(crate) struct Driver {
    sources: SourceSet,
    evaluator: Evaluator,
    done: bool,
}

impl Driver {
    /// Compile `graph` for `roots` and take ownership of its nodes and sources.
    pub fn new<S, N>(
        graph: IndicatorGraph,
        roots: impl IntoIterator<Item = (S, N)>,
        config: EngineConfig,
    ) -> Result<Self, EngineError>
    where
        S: Into<String>,
        N: Into<NodeId>,
    {
        let compiled = CompiledGraph::compile(&graph, roots)?;
        let (nodes, sources) = graph.into_parts();
        let sources = SourceSet::select(sources, compiled.sources().keys());
        debug!(sources = sources.len(), tags = ?sources.tags(), "Sources selected");
        let evaluator = Evaluator::new(compiled, nodes, sources.tags(), config);

        Ok(Self {
            sources,
            evaluator,
            done: false,
        })
    }

    pub fn sources(&self) -> &SourceSet {
        &self.sources
    }

    pub fn compiled(&self) -> &CompiledGraph {
        self.evaluator.compiled()
    }

    pub fn stats(&self) -> EvaluationStats {
        self.evaluator.stats()
    }

    pub fn window_len(&self, node: NodeId) -> Option<usize> {
        self.evaluator.window_len(node)
    }

    /// Pull ticks until a record is ready or the evaluation ends.
    pub fn next_sync(&mut self) -> Option<Item> {
        while !self.done {
            let fetch = self.sources.fetch_sync();
            if let Some(item) = self.advance(fetch) {
                return Some(item);
            }
        }
        None
    }

    pub async fn next_async(&mut self) -> Option<Item> {
        while !self.done {
            let fetch = self.sources.fetch_async().await;
            if let Some(item) = self.advance(fetch) {
                return Some(item);
            }
        }
        None
    }

    fn advance(&mut self, fetch: Fetch) -> Option<Item> {
        match fetch {
            Fetch::Tick(values) => {
                let record = self.evaluator.step(&values);
                if self.evaluator.is_finished() {
                    info!(ticks = self.evaluator.ticks(), "All lanes closed");
                    self.done = true;
                }
                record.map(Ok)
            }
            Fetch::Exhausted => {
                info!(ticks = self.evaluator.ticks(), "Sources exhausted");
                self.done = true;
                None
            }
            Fetch::Desync { exhausted, live } => {
                let tick = self.evaluator.ticks();
                error!(tick, ?exhausted, ?live, "Sources desynchronized");
                self.done = true;
                Some(Err(EngineError::StreamDesync { tick, exhausted, live }))
            }
        }
    }
}
