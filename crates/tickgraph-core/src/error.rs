//! Error types for indicator graphs.

use crate::types::NodeId;
use serde::Serialize;
use thiserror::Error;

/// Any error raised while wiring sources into a graph and running it.
#[derive(Error, Debug)]
pub enum TickGraphError {
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Data error: {0}")]
    Data(#[from] DataError),
}

/// Errors raised while building or compiling a dependency graph.
///
/// All of these surface before the first tick is produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Cycle detected at node '{name}' ({node})")]
    Cycle { node: NodeId, name: String },

    #[error("No roots given")]
    NoRoots,

    #[error("Unknown node {0}")]
    UnknownNode(NodeId),

    #[error("Node '{name}' ({node}) has no dependencies and no source")]
    UndrivenNode { node: NodeId, name: String },

    #[error("Node '{name}' ({node}) takes {expected} arguments, built with {found}")]
    ArityMismatch {
        node: NodeId,
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("No source registered for tag '{tag}'")]
    MissingSource { tag: String },

    #[error("Source tag '{tag}' is already registered")]
    DuplicateSource { tag: String },

    #[error("Node {dependency} is not a dependency of {node}")]
    NotADependency { node: NodeId, dependency: NodeId },
}

/// Errors that terminate an evaluation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("Stream desync at tick {tick}: exhausted {exhausted:?}, still live {live:?}")]
    StreamDesync {
        tick: u64,
        exhausted: Vec<String>,
        live: Vec<String>,
    },

    #[error("Source '{tag}' is asynchronous and cannot drive the synchronous engine")]
    AsyncSourceInSyncEngine { tag: String },
}

/// Outcome of a single node's `compute` that is not a value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NodeError {
    /// Warm-up still in progress. Not a failure.
    #[error("Insufficient history: need {required} values, have {available}")]
    InsufficientHistory { required: usize, available: usize },

    #[error(transparent)]
    Computation(#[from] ComputationError),
}

/// A recoverable failure inside a node's `compute`.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum ComputationError {
    #[error("Division by zero")]
    DivisionByZero,

    #[error("{operation} is undefined for {value}")]
    Domain { operation: &'static str, value: f64 },

    #[error("{operation} produced a non-finite value")]
    NonFinite { operation: &'static str },

    #[error("{0}")]
    Other(String),
}

/// Raw source errors.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Column not found: {0}")]
    MissingColumn(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("No data rows in {0}")]
    NoDataAvailable(String),
}

/// Result type alias for fallible indicator graph operations.
pub type TickGraphResult<T> = Result<T, TickGraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_error_names_node() {
        let err = GraphError::Cycle {
            node: NodeId::new(3),
            name: "ema".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("'ema'"));
        assert!(msg.contains("#3"));
    }

    #[test]
    fn test_engine_error_wraps_graph_error() {
        let err: EngineError = GraphError::NoRoots.into();
        assert_eq!(err.to_string(), "No roots given");

        let top: TickGraphError = err.into();
        assert!(matches!(top, TickGraphError::Engine(EngineError::Graph(GraphError::NoRoots))));
    }

    #[test]
    fn test_computation_error_into_node_error() {
        let err: NodeError = ComputationError::DivisionByZero.into();
        assert_eq!(err, NodeError::Computation(ComputationError::DivisionByZero));
        assert_eq!(err.to_string(), "Division by zero");
    }
}
