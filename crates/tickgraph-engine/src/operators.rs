//! Built-in operator nodes and the graph factory methods that create them.
//!
//! Comparisons and logical operators yield `1.0` for true and `0.0` for
//! false. Any non-zero input counts as true.

use crate::expr::{Expr, Operand};
use crate::graph::IndicatorGraph;
use tickgraph_core::error::{ComputationError, NodeError};
use tickgraph_core::traits::Indicator;
use tickgraph_core::types::Inputs;

#[inline]
fn truthy(value: f64) -> bool {
    value != 0.0 && !value.is_nan()
}

#[inline]
fn flag(condition: bool) -> f64 {
    if condition {
        1.0
    } else {
        0.0
    }
}

fn finite(operation: &'static str, value: f64) -> Result<f64, ComputationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ComputationError::NonFinite { operation })
    }
}

/// Operators over two arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
    /// Logarithm of the first argument in the base given by the second.
    Log,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    And,
    Or,
    Xor,
}

impl BinaryOp {
    pub fn name(&self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Subtract => "subtract",
            BinaryOp::Multiply => "multiply",
            BinaryOp::Divide => "divide",
            BinaryOp::Power => "power",
            BinaryOp::Log => "log",
            BinaryOp::Less => "less",
            BinaryOp::LessEqual => "less_equal",
            BinaryOp::Greater => "greater",
            BinaryOp::GreaterEqual => "greater_equal",
            BinaryOp::Equal => "equal",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Xor => "xor",
        }
    }

    pub fn apply(&self, a: f64, b: f64) -> Result<f64, ComputationError> {
        match self {
            BinaryOp::Add => Ok(a + b),
            BinaryOp::Subtract => Ok(a - b),
            BinaryOp::Multiply => Ok(a * b),
            BinaryOp::Divide => {
                if b == 0.0 {
                    Err(ComputationError::DivisionByZero)
                } else {
                    Ok(a / b)
                }
            }
            BinaryOp::Power => {
                let value = a.powf(b);
                if value.is_nan() {
                    Err(ComputationError::Domain {
                        operation: "power",
                        value: a,
                    })
                } else {
                    finite("power", value)
                }
            }
            BinaryOp::Log => {
                if a <= 0.0 {
                    Err(ComputationError::Domain {
                        operation: "log",
                        value: a,
                    })
                } else if b <= 0.0 || b == 1.0 {
                    Err(ComputationError::Domain {
                        operation: "log base",
                        value: b,
                    })
                } else {
                    Ok(a.log(b))
                }
            }
            BinaryOp::Less => Ok(flag(a < b)),
            BinaryOp::LessEqual => Ok(flag(a <= b)),
            BinaryOp::Greater => Ok(flag(a > b)),
            BinaryOp::GreaterEqual => Ok(flag(a >= b)),
            BinaryOp::Equal => Ok(flag(a == b)),
            BinaryOp::And => Ok(flag(truthy(a) && truthy(b))),
            BinaryOp::Or => Ok(flag(truthy(a) || truthy(b))),
            BinaryOp::Xor => Ok(flag(truthy(a) != truthy(b))),
        }
    }
}

/// Stateless node applying a [`BinaryOp`] to the current values of its two
/// arguments.
#[derive(Debug, Clone)]
pub struct BinaryNode {
    op: BinaryOp,
}

impl BinaryNode {
    pub fn new(op: BinaryOp) -> Self {
        Self { op }
    }
}

impl Indicator for BinaryNode {
    fn name(&self) -> &str {
        self.op.name()
    }

    fn arity(&self) -> Option<usize> {
        Some(2)
    }

    fn compute(&mut self, inputs: &Inputs<'_>) -> Result<f64, NodeError> {
        let a = inputs.arg(0).current();
        let b = inputs.arg(1).current();
        Ok(self.op.apply(a, b)?)
    }
}

/// Operators over one argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Abs,
    Sqrt,
    Ln,
    Exp,
    Sin,
    Cos,
    Tan,
    Not,
    Booleanize,
}

impl UnaryOp {
    pub fn name(&self) -> &'static str {
        match self {
            UnaryOp::Negate => "negate",
            UnaryOp::Abs => "abs",
            UnaryOp::Sqrt => "sqrt",
            UnaryOp::Ln => "ln",
            UnaryOp::Exp => "exp",
            UnaryOp::Sin => "sin",
            UnaryOp::Cos => "cos",
            UnaryOp::Tan => "tan",
            UnaryOp::Not => "not",
            UnaryOp::Booleanize => "booleanize",
        }
    }

    pub fn apply(&self, x: f64) -> Result<f64, ComputationError> {
        match self {
            UnaryOp::Negate => Ok(-x),
            UnaryOp::Abs => Ok(x.abs()),
            UnaryOp::Sqrt if x < 0.0 => Err(ComputationError::Domain {
                operation: "sqrt",
                value: x,
            }),
            UnaryOp::Sqrt => Ok(x.sqrt()),
            UnaryOp::Ln if x <= 0.0 => Err(ComputationError::Domain {
                operation: "ln",
                value: x,
            }),
            UnaryOp::Ln => Ok(x.ln()),
            UnaryOp::Exp => finite("exp", x.exp()),
            UnaryOp::Sin => Ok(x.sin()),
            UnaryOp::Cos => Ok(x.cos()),
            UnaryOp::Tan => finite("tan", x.tan()),
            UnaryOp::Not => Ok(flag(!truthy(x))),
            UnaryOp::Booleanize => Ok(flag(truthy(x))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UnaryNode {
    op: UnaryOp,
}

impl UnaryNode {
    pub fn new(op: UnaryOp) -> Self {
        Self { op }
    }
}

impl Indicator for UnaryNode {
    fn name(&self) -> &str {
        self.op.name()
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn compute(&mut self, inputs: &Inputs<'_>) -> Result<f64, NodeError> {
        Ok(self.op.apply(inputs.arg(0).current())?)
    }
}

/// Reductions over any number of arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldOp {
    Sum,
    Product,
    Min,
    Max,
    All,
    Any,
}

/// Stateless node reducing the current values of all its arguments.
#[derive(Debug, Clone)]
pub struct FoldNode {
    op: FoldOp,
}

impl FoldNode {
    pub fn new(op: FoldOp) -> Self {
        Self { op }
    }
}

impl Indicator for FoldNode {
    fn name(&self) -> &str {
        match self.op {
            FoldOp::Sum => "sum",
            FoldOp::Product => "product",
            FoldOp::Min => "min",
            FoldOp::Max => "max",
            FoldOp::All => "all",
            FoldOp::Any => "any",
        }
    }

    fn compute(&mut self, inputs: &Inputs<'_>) -> Result<f64, NodeError> {
        let mut values = inputs.currents();
        let value = match self.op {
            FoldOp::Sum => values.sum(),
            FoldOp::Product => values.product(),
            FoldOp::Min => values.fold(f64::INFINITY, f64::min),
            FoldOp::Max => values.fold(f64::NEG_INFINITY, f64::max),
            FoldOp::All => flag(values.all(truthy)),
            FoldOp::Any => flag(values.any(truthy)),
        };
        Ok(value)
    }
}

/// Value of the argument `periods` ticks ago.
#[derive(Debug, Clone)]
pub struct Lag {
    periods: usize,
}

impl Lag {
    pub fn new(periods: usize) -> Self {
        Self { periods }
    }
}

impl Indicator for Lag {
    fn name(&self) -> &str {
        "lag"
    }

    fn lookback(&self) -> usize {
        self.periods
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn compute(&mut self, inputs: &Inputs<'_>) -> Result<f64, NodeError> {
        let series = inputs.arg(0);
        series.require(self.periods)?;
        series.get(self.periods).ok_or(NodeError::InsufficientHistory {
            required: self.periods + 1,
            available: series.len(),
        })
    }
}

/// Change of the argument since the previous tick.
#[derive(Debug, Clone, Default)]
pub struct PrevDifference;

impl Indicator for PrevDifference {
    fn name(&self) -> &str {
        "prev_difference"
    }

    fn lookback(&self) -> usize {
        1
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn compute(&mut self, inputs: &Inputs<'_>) -> Result<f64, NodeError> {
        let series = inputs.arg(0);
        series.require(1)?;
        match series.get(1) {
            Some(previous) => Ok(series.current() - previous),
            None => Err(NodeError::InsufficientHistory {
                required: 2,
                available: series.len(),
            }),
        }
    }
}

/// Division that yields `default` instead of failing on a zero divisor.
#[derive(Debug, Clone)]
pub struct SafeDivide {
    default: f64,
}

impl SafeDivide {
    pub fn new(default: f64) -> Self {
        Self { default }
    }
}

impl Indicator for SafeDivide {
    fn name(&self) -> &str {
        "safe_divide"
    }

    fn arity(&self) -> Option<usize> {
        Some(2)
    }

    fn compute(&mut self, inputs: &Inputs<'_>) -> Result<f64, NodeError> {
        let divisor = inputs.arg(1).current();
        if divisor == 0.0 {
            Ok(self.default)
        } else {
            Ok(inputs.arg(0).current() / divisor)
        }
    }
}

/// Passes the first argument through while the second is truthy.
#[derive(Debug, Clone)]
pub struct Filter {
    fallback: f64,
}

impl Filter {
    pub fn new(fallback: f64) -> Self {
        Self { fallback }
    }
}

impl Indicator for Filter {
    fn name(&self) -> &str {
        "filter"
    }

    fn arity(&self) -> Option<usize> {
        Some(2)
    }

    fn compute(&mut self, inputs: &Inputs<'_>) -> Result<f64, NodeError> {
        if truthy(inputs.arg(1).current()) {
            Ok(inputs.arg(0).current())
        } else {
            Ok(self.fallback)
        }
    }
}

macro_rules! binary_factory {
    ($($(#[$meta:meta])* $method:ident => $op:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            pub fn $method<'g>(
                &'g self,
                lhs: impl Into<Operand<'g>>,
                rhs: impl Into<Operand<'g>>,
            ) -> Expr<'g> {
                self.node(BinaryNode::new(BinaryOp::$op), [lhs.into(), rhs.into()])
            }
        )*
    };
}

macro_rules! unary_factory {
    ($($method:ident => $op:ident),* $(,)?) => {
        $(
            pub fn $method<'g>(&'g self, operand: impl Into<Operand<'g>>) -> Expr<'g> {
                self.node(UnaryNode::new(UnaryOp::$op), [operand.into()])
            }
        )*
    };
}

impl IndicatorGraph {
    binary_factory! {
        add => Add,
        subtract => Subtract,
        multiply => Multiply,
        /// Fails the node with `DivisionByZero` on a zero divisor.
        divide => Divide,
        power => Power,
        /// Logarithm of `lhs` in base `rhs`.
        log => Log,
        less => Less,
        less_equal => LessEqual,
        greater => Greater,
        greater_equal => GreaterEqual,
        equal => Equal,
        and => And,
        or => Or,
        xor => Xor,
    }

    unary_factory! {
        not => Not,
        negate => Negate,
        abs => Abs,
        sqrt => Sqrt,
        ln => Ln,
        exp => Exp,
        sin => Sin,
        cos => Cos,
        tan => Tan,
        booleanize => Booleanize,
    }

    /// Smallest current value among `operands`.
    pub fn minimum<'g, O: Into<Operand<'g>>>(&'g self, operands: impl IntoIterator<Item = O>) -> Expr<'g> {
        self.node(FoldNode::new(FoldOp::Min), operands)
    }

    pub fn maximum<'g, O: Into<Operand<'g>>>(&'g self, operands: impl IntoIterator<Item = O>) -> Expr<'g> {
        self.node(FoldNode::new(FoldOp::Max), operands)
    }

    pub fn sum<'g, O: Into<Operand<'g>>>(&'g self, operands: impl IntoIterator<Item = O>) -> Expr<'g> {
        self.node(FoldNode::new(FoldOp::Sum), operands)
    }

    pub fn lag<'g>(&'g self, operand: impl Into<Operand<'g>>, periods: usize) -> Expr<'g> {
        self.node(Lag::new(periods), [operand.into()])
    }

    pub fn prev_difference<'g>(&'g self, operand: impl Into<Operand<'g>>) -> Expr<'g> {
        self.node(PrevDifference, [operand.into()])
    }

    /// `value` while `condition` is truthy, `fallback` otherwise.
    pub fn filter<'g>(
        &'g self,
        value: impl Into<Operand<'g>>,
        condition: impl Into<Operand<'g>>,
        fallback: f64,
    ) -> Expr<'g> {
        self.node(Filter::new(fallback), [value.into(), condition.into()])
    }

    pub fn safe_divide<'g>(
        &'g self,
        lhs: impl Into<Operand<'g>>,
        rhs: impl Into<Operand<'g>>,
        default: f64,
    ) -> Expr<'g> {
        self.node(SafeDivide::new(default), [lhs.into(), rhs.into()])
    }
}
