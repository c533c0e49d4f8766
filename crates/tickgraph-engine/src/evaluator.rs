//! Per-tick evaluation of a compiled graph.

use crate::compile::CompiledGraph;
use crate::graph::{NodeKind, NodeSpec};
use crate::policy::{EngineConfig, ErrorPolicy, WarmupPolicy};
use serde::Serialize;
use std::sync::Arc;
use tickgraph_core::error::NodeError;
use tickgraph_core::traits::Indicator;
use tickgraph_core::types::{History, Inputs, NodeFault, NodeId, RootOutput, Series, TickRecord, Window};
use tracing::{debug, warn};

/// Counters describing an evaluation so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EvaluationStats {
    /// Raw ticks consumed.
    pub ticks: u64,
    /// Records yielded.
    pub records: u64,
    /// Node computations that failed.
    pub faults: u64,
    /// Total window capacity across the compiled graph.
    pub window_budget: usize,
}

/// A node's state on the current tick.
#[derive(Debug, Clone)]
enum Slot {
    Warming,
    Ready(f64),
    Failed(Arc<NodeFault>),
}

enum StepKind {
    /// Index into the fetched raw values.
    Source(usize),
    Constant(f64),
    Compute {
        indicator: Box<dyn Indicator>,
        /// Order position of the dependency at each argument.
        args: Vec<usize>,
        lookback: usize,
        own_history: usize,
    },
}

struct Step {
    id: NodeId,
    name: String,
    kind: StepKind,
    /// Order positions of the unique dependencies.
    deps: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LaneState {
    WarmingUp,
    Live,
    Closed,
}

struct Lane {
    root: String,
    position: usize,
    state: LaneState,
}

/// Runs the step, record and yield phases for one tick at a time.
pub(crate) struct Evaluator {
    compiled: CompiledGraph,
    steps: Vec<Step>,
    slots: Vec<Slot>,
    windows: Vec<Window>,
    lanes: Vec<Lane>,
    config: EngineConfig,
    all_warm: bool,
    stats: EvaluationStats,
}

impl Evaluator {
    /// Take the compiled nodes out of `nodes`. `source_tags` gives the order
    /// in which raw values are fed to [`step`](Self::step).
    pub fn new(compiled: CompiledGraph, nodes: Vec<NodeSpec>, source_tags: &[String], config: EngineConfig) -> Self {
        let mut nodes: Vec<Option<NodeSpec>> = nodes.into_iter().map(Some).collect();
        let position_of = |id: &NodeId| compiled.position(*id).unwrap_or_default();

        let mut steps = Vec::with_capacity(compiled.node_count());
        let mut windows = Vec::with_capacity(compiled.node_count());

        for &id in compiled.order() {
            let Some(spec) = nodes.get_mut(id.index()).and_then(Option::take) else {
                continue;
            };
            let deps: Vec<usize> = spec.deps.iter().map(position_of).collect();
            let kind = match spec.kind {
                NodeKind::Source { tag } => {
                    StepKind::Source(source_tags.iter().position(|t| *t == tag).unwrap_or_default())
                }
                NodeKind::Constant(value) => StepKind::Constant(value),
                NodeKind::Compute(mut indicator) => {
                    indicator.reset();
                    StepKind::Compute {
                        indicator,
                        args: spec.args.iter().map(|&a| deps[a]).collect(),
                        lookback: spec.lookback,
                        own_history: spec.own_history,
                    }
                }
            };
            windows.push(Window::new(compiled.capacity(id)));
            steps.push(Step {
                id,
                name: spec.name,
                kind,
                deps,
            });
        }

        let lanes = compiled
            .roots()
            .iter()
            .map(|(root, id)| Lane {
                root: root.clone(),
                position: position_of(id),
                state: LaneState::WarmingUp,
            })
            .collect();

        let stats = EvaluationStats {
            window_budget: compiled.window_budget(),
            ..Default::default()
        };

        Self {
            slots: vec![Slot::Warming; steps.len()],
            steps,
            windows,
            lanes,
            config,
            all_warm: false,
            stats,
            compiled,
        }
    }

    pub fn compiled(&self) -> &CompiledGraph {
        &self.compiled
    }

    pub fn stats(&self) -> EvaluationStats {
        self.stats.clone()
    }

    pub fn ticks(&self) -> u64 {
        self.stats.ticks
    }

    /// Number of values currently retained for `node`.
    pub fn window_len(&self, node: NodeId) -> Option<usize> {
        self.compiled.position(node).map(|p| self.windows[p].len())
    }

    /// Every lane has been closed; nothing further can be yielded.
    pub fn is_finished(&self) -> bool {
        !self.lanes.is_empty() && self.lanes.iter().all(|lane| lane.state == LaneState::Closed)
    }

    /// Evaluate one tick from `raw` (one value per source, in tag order).
    ///
    /// Returns `None` while the record is held back by the warm-up policy.
    pub fn step(&mut self, raw: &[f64]) -> Option<TickRecord> {
        let tick = self.stats.ticks;
        self.stats.ticks += 1;

        let Self {
            steps,
            slots,
            windows,
            stats,
            ..
        } = &mut *self;
        for (position, step) in steps.iter_mut().enumerate() {
            let slot = evaluate(step, position, raw, slots, windows);
            if let Slot::Failed(fault) = &slot {
                if fault.node == step.id {
                    stats.faults += 1;
                    debug!(tick, fault = %fault, "Node computation failed");
                }
            }
            slots[position] = slot;
        }

        for (slot, window) in self.slots.iter().zip(self.windows.iter_mut()) {
            if let Slot::Ready(value) = slot {
                window.push(*value);
            }
        }

        let record = self.collect(tick);

        if self.config.progress_every > 0 && self.stats.ticks % self.config.progress_every == 0 {
            debug!(
                ticks = self.stats.ticks,
                records = self.stats.records,
                faults = self.stats.faults,
                "Evaluation progress"
            );
        }

        record
    }

    fn collect(&mut self, tick: u64) -> Option<TickRecord> {
        for lane in &mut self.lanes {
            if lane.state == LaneState::WarmingUp && !matches!(self.slots[lane.position], Slot::Warming) {
                lane.state = LaneState::Live;
            }
        }

        if !self.all_warm && self.lanes.iter().all(|lane| lane.state != LaneState::WarmingUp) {
            self.all_warm = true;
            debug!(tick, "All roots warm");
        }
        if self.config.warmup == WarmupPolicy::AllRoots && !self.all_warm {
            return None;
        }

        let mut record = TickRecord::new(tick);
        for lane in &mut self.lanes {
            if lane.state != LaneState::Live {
                continue;
            }
            let output = match &self.slots[lane.position] {
                Slot::Ready(value) => RootOutput::Value(*value),
                Slot::Warming => RootOutput::Warming,
                Slot::Failed(fault) => {
                    warn!(tick, root = %lane.root, fault = %fault, "Root produced an error");
                    if self.config.on_error == ErrorPolicy::CloseLane {
                        lane.state = LaneState::Closed;
                        debug!(tick, root = %lane.root, "Lane closed");
                    }
                    RootOutput::Error(fault.as_ref().clone())
                }
            };
            record.insert(lane.root.clone(), output);
        }

        self.stats.records += 1;
        Some(record)
    }
}

fn evaluate(step: &mut Step, position: usize, raw: &[f64], slots: &[Slot], windows: &[Window]) -> Slot {
    let (indicator, args, lookback, own_history) = match &mut step.kind {
        StepKind::Source(feed) => return raw.get(*feed).map_or(Slot::Warming, |&v| Slot::Ready(v)),
        StepKind::Constant(value) => return Slot::Ready(*value),
        StepKind::Compute {
            indicator,
            args,
            lookback,
            own_history,
        } => (indicator, args, *lookback, *own_history),
    };

    let mut warming = false;
    for &dep in &step.deps {
        match &slots[dep] {
            Slot::Failed(fault) => return Slot::Failed(Arc::clone(fault)),
            Slot::Warming => warming = true,
            Slot::Ready(_) => {}
        }
    }
    if warming {
        return Slot::Warming;
    }

    let series = args.iter().map(|&p| {
        let current = match slots[p] {
            Slot::Ready(value) => value,
            _ => f64::NAN,
        };
        Series::new(current, History::new(&windows[p], lookback))
    });
    let own = if own_history > 0 {
        History::new(&windows[position], own_history)
    } else {
        History::empty()
    };
    let inputs = Inputs::new(series, own);

    match indicator.compute(&inputs) {
        Ok(value) => Slot::Ready(value),
        Err(NodeError::InsufficientHistory { .. }) => Slot::Warming,
        Err(NodeError::Computation(error)) => Slot::Failed(Arc::new(NodeFault {
            node: step.id,
            name: step.name.clone(),
            error,
        })),
    }
}
