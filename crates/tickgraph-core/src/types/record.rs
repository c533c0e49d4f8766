//! Per-tick output records.

use crate::error::ComputationError;
use crate::types::NodeId;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A failed `compute`, attributed to the node that raised it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeFault {
    pub node: NodeId,
    pub name: String,
    pub error: ComputationError,
}

impl fmt::Display for NodeFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node '{}' ({}) failed: {}", self.name, self.node, self.error)
    }
}

/// What a root reports on one tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "detail")]
pub enum RootOutput {
    Value(f64),
    Error(NodeFault),
    /// The root has left warm-up before but has no value on this tick.
    Warming,
}

impl RootOutput {
    pub fn value(&self) -> Option<f64> {
        match self {
            RootOutput::Value(v) => Some(*v),
            _ => None,
        }
    }

    pub fn fault(&self) -> Option<&NodeFault> {
        match self {
            RootOutput::Error(fault) => Some(fault),
            _ => None,
        }
    }

    pub fn is_value(&self) -> bool {
        matches!(self, RootOutput::Value(_))
    }
}

/// One record per yielded tick: root name to root output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickRecord {
    /// Zero-based index of the raw tick this record was computed from.
    pub tick: u64,
    pub values: BTreeMap<String, RootOutput>,
}

impl TickRecord {
    pub fn new(tick: u64) -> Self {
        Self {
            tick,
            values: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, root: impl Into<String>, output: RootOutput) {
        self.values.insert(root.into(), output);
    }

    pub fn get(&self, root: &str) -> Option<&RootOutput> {
        self.values.get(root)
    }

    /// Clean value of `root`, if it has one on this tick.
    pub fn value(&self, root: &str) -> Option<f64> {
        self.get(root).and_then(RootOutput::value)
    }

    pub fn fault(&self, root: &str) -> Option<&NodeFault> {
        self.get(root).and_then(RootOutput::fault)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RootOutput)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}
