//! Indicator node trait definitions.

use crate::error::NodeError;
use crate::types::Inputs;

/// A unit of computation in the indicator graph.
///
/// The engine calls `compute` once per tick, in dependency order, and only
/// after every argument has a value on that tick. Nodes never suspend.
pub trait Indicator: Send {
    /// Get the name of the indicator.
    fn name(&self) -> &str;

    /// Number of prior values of each argument the node reads.
    ///
    /// Read once when the node is added to a graph; it sizes the window
    /// stores of the node's dependencies.
    fn lookback(&self) -> usize {
        0
    }

    /// Number of the node's own prior outputs it reads.
    fn own_history(&self) -> usize {
        0
    }

    /// Exact number of arguments `compute` reads, if fixed.
    ///
    /// Checked when the graph is compiled, so a node built with the wrong
    /// operands is rejected before the first tick.
    fn arity(&self) -> Option<usize> {
        None
    }

    /// Compute this tick's value.
    ///
    /// Return `NodeError::InsufficientHistory` while warming up; the node and
    /// everything downstream then emit no value for the tick.
    fn compute(&mut self, inputs: &Inputs<'_>) -> Result<f64, NodeError>;

    /// Reset private accumulated state.
    fn reset(&mut self) {}
}

impl<T: Indicator + ?Sized> Indicator for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn lookback(&self) -> usize {
        (**self).lookback()
    }

    fn own_history(&self) -> usize {
        (**self).own_history()
    }

    fn arity(&self) -> Option<usize> {
        (**self).arity()
    }

    fn compute(&mut self, inputs: &Inputs<'_>) -> Result<f64, NodeError> {
        (**self).compute(inputs)
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}

/// Stateless indicator backed by a function.
#[derive(Debug, Clone)]
pub struct FnIndicator<F> {
    name: String,
    lookback: usize,
    func: F,
}

impl<F> FnIndicator<F>
where
    F: Fn(&Inputs<'_>) -> Result<f64, NodeError> + Send,
{
    /// Read `lookback` prior values of each argument.
    pub fn with_lookback(mut self, lookback: usize) -> Self {
        self.lookback = lookback;
        self
    }
}

/// Wrap a pure function of the inputs as an indicator.
pub fn from_fn<F>(name: impl Into<String>, func: F) -> FnIndicator<F>
where
    F: Fn(&Inputs<'_>) -> Result<f64, NodeError> + Send,
{
    FnIndicator {
        name: name.into(),
        lookback: 0,
        func,
    }
}

impl<F> Indicator for FnIndicator<F>
where
    F: Fn(&Inputs<'_>) -> Result<f64, NodeError> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.lookback
    }

    fn compute(&mut self, inputs: &Inputs<'_>) -> Result<f64, NodeError> {
        (self.func)(inputs)
    }
}
