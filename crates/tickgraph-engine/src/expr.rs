//! Expression handles and operator overloading.

use crate::graph::IndicatorGraph;
use std::fmt;
use std::ops::{Add, BitAnd, BitOr, BitXor, Div, Mul, Neg, Not, Sub};
use tickgraph_core::types::NodeId;

/// Handle to a node in an [`IndicatorGraph`].
///
/// Handles are cheap to copy. Every operator or method applied to one adds
/// a new node to the same graph and returns its handle.
#[derive(Clone, Copy)]
pub struct Expr<'g> {
    graph: &'g IndicatorGraph,
    id: NodeId,
}

impl fmt::Debug for Expr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Expr").field(&self.id).finish()
    }
}

impl PartialEq for Expr<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.graph, other.graph) && self.id == other.id
    }
}

impl<'g> Expr<'g> {
    pub(crate) fn new(graph: &'g IndicatorGraph, id: NodeId) -> Self {
        Self { graph, id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn graph(&self) -> &'g IndicatorGraph {
        self.graph
    }

    /// Relabel this node. The label shows up in faults and logs.
    pub fn named(self, label: impl Into<String>) -> Self {
        let renamed = self.graph.rename(self.id, label);
        debug_assert!(renamed.is_ok(), "expr {} missing from its own graph", self.id);
        self
    }

    pub fn name(&self) -> String {
        self.graph.name_of(self.id).unwrap_or_default()
    }

    pub fn pow(self, exponent: impl Into<Operand<'g>>) -> Self {
        self.graph.power(self, exponent)
    }

    /// Logarithm of `self` in the given base.
    pub fn log(self, base: impl Into<Operand<'g>>) -> Self {
        self.graph.log(self, base)
    }

    pub fn less(self, rhs: impl Into<Operand<'g>>) -> Self {
        self.graph.less(self, rhs)
    }

    pub fn less_equal(self, rhs: impl Into<Operand<'g>>) -> Self {
        self.graph.less_equal(self, rhs)
    }

    pub fn greater(self, rhs: impl Into<Operand<'g>>) -> Self {
        self.graph.greater(self, rhs)
    }

    pub fn greater_equal(self, rhs: impl Into<Operand<'g>>) -> Self {
        self.graph.greater_equal(self, rhs)
    }

    pub fn equal(self, rhs: impl Into<Operand<'g>>) -> Self {
        self.graph.equal(self, rhs)
    }

    pub fn min(self, rhs: impl Into<Operand<'g>>) -> Self {
        self.graph.minimum([Operand::from(self), rhs.into()])
    }

    pub fn max(self, rhs: impl Into<Operand<'g>>) -> Self {
        self.graph.maximum([Operand::from(self), rhs.into()])
    }

    pub fn abs(self) -> Self {
        self.graph.abs(self)
    }

    pub fn sqrt(self) -> Self {
        self.graph.sqrt(self)
    }

    pub fn ln(self) -> Self {
        self.graph.ln(self)
    }

    pub fn exp(self) -> Self {
        self.graph.exp(self)
    }

    pub fn sin(self) -> Self {
        self.graph.sin(self)
    }

    pub fn cos(self) -> Self {
        self.graph.cos(self)
    }

    pub fn tan(self) -> Self {
        self.graph.tan(self)
    }

    /// Value `periods` ticks ago.
    pub fn lag(self, periods: usize) -> Self {
        self.graph.lag(self, periods)
    }

    /// Change since the previous tick.
    pub fn prev_difference(self) -> Self {
        self.graph.prev_difference(self)
    }

    /// `self / rhs`, or `default` when `rhs` is zero.
    pub fn safe_divide(self, rhs: impl Into<Operand<'g>>, default: f64) -> Self {
        self.graph.safe_divide(self, rhs, default)
    }

    /// Pass `self` through while `condition` is truthy, `fallback` otherwise.
    pub fn filter(self, condition: impl Into<Operand<'g>>, fallback: f64) -> Self {
        self.graph.filter(self, condition, fallback)
    }

    /// 1.0 if non-zero, else 0.0.
    pub fn booleanize(self) -> Self {
        self.graph.booleanize(self)
    }
}

impl<'g> From<Expr<'g>> for NodeId {
    fn from(expr: Expr<'g>) -> Self {
        expr.id
    }
}

/// Something usable as an argument: an existing node or a plain number.
#[derive(Debug, Clone, Copy)]
pub enum Operand<'g> {
    Node(Expr<'g>),
    Constant(f64),
}

impl<'g> From<Expr<'g>> for Operand<'g> {
    fn from(expr: Expr<'g>) -> Self {
        Operand::Node(expr)
    }
}

impl From<f64> for Operand<'_> {
    fn from(value: f64) -> Self {
        Operand::Constant(value)
    }
}

impl From<i32> for Operand<'_> {
    fn from(value: i32) -> Self {
        Operand::Constant(f64::from(value))
    }
}

macro_rules! binary_operator {
    ($trait:ident, $method:ident, $factory:ident) => {
        impl<'g, R: Into<Operand<'g>>> $trait<R> for Expr<'g> {
            type Output = Expr<'g>;

            fn $method(self, rhs: R) -> Expr<'g> {
                self.graph.$factory(self, rhs)
            }
        }

        impl<'g> $trait<Expr<'g>> for f64 {
            type Output = Expr<'g>;

            fn $method(self, rhs: Expr<'g>) -> Expr<'g> {
                rhs.graph.$factory(self, rhs)
            }
        }

        impl<'g> $trait<Expr<'g>> for i32 {
            type Output = Expr<'g>;

            fn $method(self, rhs: Expr<'g>) -> Expr<'g> {
                rhs.graph.$factory(self, rhs)
            }
        }
    };
}

binary_operator!(Add, add, add);
binary_operator!(Sub, sub, subtract);
binary_operator!(Mul, mul, multiply);
binary_operator!(Div, div, divide);
binary_operator!(BitAnd, bitand, and);
binary_operator!(BitOr, bitor, or);
binary_operator!(BitXor, bitxor, xor);

impl<'g> Neg for Expr<'g> {
    type Output = Expr<'g>;

    fn neg(self) -> Expr<'g> {
        self.graph.negate(self)
    }
}

impl<'g> Not for Expr<'g> {
    type Output = Expr<'g>;

    fn not(self) -> Expr<'g> {
        self.graph.not(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operators_add_nodes() {
        let graph = IndicatorGraph::new();
        let x = graph.leaf("x");
        let y = x * 2 + 50;

        // x, 2, x*2, 50, x*2+50
        assert_eq!(graph.len(), 5);
        assert_eq!(y.name(), "add");
        let deps = graph.dependencies_of(y.id()).unwrap();
        assert_eq!(graph.name_of(deps[0]).as_deref(), Some("multiply"));
        assert_eq!(graph.name_of(deps[1]).as_deref(), Some("50"));
    }

    #[test]
    fn test_scalar_on_the_left() {
        let graph = IndicatorGraph::new();
        let x = graph.leaf("x");
        let y = 1.0 - x;

        let deps = graph.dependencies_of(y.id()).unwrap();
        assert_eq!(graph.name_of(deps[0]).as_deref(), Some("1"));
        assert_eq!(deps[1], x.id());
    }

    #[test]
    fn test_named_relabels() {
        let graph = IndicatorGraph::new();
        let x = graph.leaf("x");
        let spread = (x - x.lag(1)).named("spread");

        assert_eq!(spread.name(), "spread");
        assert_eq!(graph.lookback_of(spread.id()), Some(0));
    }

    #[test]
    fn test_logical_operators() {
        let graph = IndicatorGraph::new();
        let x = graph.leaf("x");
        let y = graph.leaf("y");

        assert_eq!((x & y).name(), "and");
        assert_eq!((x | y).name(), "or");
        assert_eq!((x ^ y).name(), "xor");
        assert_eq!((!x).name(), "not");
        assert_eq!((-x).name(), "negate");
    }
}
