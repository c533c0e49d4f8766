//! Blocking evaluation entry point.

use crate::compile::CompiledGraph;
use crate::driver::Driver;
use crate::evaluator::EvaluationStats;
use crate::graph::IndicatorGraph;
use crate::policy::EngineConfig;
use std::iter::FusedIterator;
use tickgraph_core::error::EngineError;
use tickgraph_core::types::{NodeId, TickRecord};

/// Evaluate `roots` over `graph` with the default [`EngineConfig`].
///
/// Compile errors, and async sources, are reported before any tick is
/// pulled. The iterator then pulls exactly one tick per `next` call, except
/// while held back by warm-up.
pub fn generate_sync<S, N>(
    graph: IndicatorGraph,
    roots: impl IntoIterator<Item = (S, N)>,
) -> Result<SyncTicks, EngineError>
where
    S: Into<String>,
    N: Into<NodeId>,
{
    generate_sync_with(graph, roots, EngineConfig::default())
}

pub fn generate_sync_with<S, N>(
    graph: IndicatorGraph,
    roots: impl IntoIterator<Item = (S, N)>,
    config: EngineConfig,
) -> Result<SyncTicks, EngineError>
where
    S: Into<String>,
    N: Into<NodeId>,
{
    let driver = Driver::new(graph, roots, config)?;
    driver.sources().ensure_sync()?;
    Ok(SyncTicks { driver })
}

/// Records of a synchronous evaluation.
pub struct SyncTicks {
    driver: Driver,
}

impl SyncTicks {
    pub fn compiled(&self) -> &CompiledGraph {
        self.driver.compiled()
    }

    pub fn stats(&self) -> EvaluationStats {
        self.driver.stats()
    }

    /// Values currently held in the window of `node`.
    pub fn window_len(&self, node: NodeId) -> Option<usize> {
        self.driver.window_len(node)
    }
}

impl Iterator for SyncTicks {
    type Item = Result<TickRecord, EngineError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.driver.next_sync()
    }
}

impl FusedIterator for SyncTicks {}
