//! Arena of indicator nodes and the raw sources that feed them.

use crate::expr::{Expr, Operand};
use futures::Stream;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use tickgraph_core::error::GraphError;
use tickgraph_core::traits::{AsyncTickSource, Indicator, IterSource, StreamSource, TickSource};
use tickgraph_core::types::NodeId;

/// What drives a node.
pub(crate) enum NodeKind {
    /// Leaf fed by the raw source registered under `tag`.
    Source { tag: String },
    /// Zero-history constant. Always ready.
    Constant(f64),
    Compute(Box<dyn Indicator>),
}

impl fmt::Debug for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Source { tag } => write!(f, "Source({tag})"),
            NodeKind::Constant(v) => write!(f, "Constant({v})"),
            NodeKind::Compute(indicator) => write!(f, "Compute({})", indicator.name()),
        }
    }
}

/// Node specification as stored in the arena.
#[derive(Debug)]
pub(crate) struct NodeSpec {
    pub name: String,
    pub kind: NodeKind,
    /// Unique dependencies, in first-use order.
    pub deps: Vec<NodeId>,
    /// Argument position -> index into `deps`.
    pub args: Vec<usize>,
    /// Prior values read from each dependency.
    pub lookback: usize,
    /// Own prior outputs read.
    pub own_history: usize,
    /// Argument count the kernel expects, if fixed.
    pub arity: Option<usize>,
}

impl NodeSpec {
    fn new(name: String, kind: NodeKind) -> Self {
        Self {
            name,
            kind,
            deps: Vec::new(),
            args: Vec::new(),
            lookback: 0,
            own_history: 0,
            arity: None,
        }
    }
}

/// A raw source as registered under a tag.
pub(crate) enum SourceHandle {
    Sync(Box<dyn TickSource>),
    Async(Box<dyn AsyncTickSource>),
}

impl SourceHandle {
    pub fn is_async(&self) -> bool {
        matches!(self, SourceHandle::Async(_))
    }
}

/// Arena holding every node of an indicator graph.
///
/// Nodes are only ever appended; a [`NodeId`] stays valid for the lifetime
/// of the graph. Composition happens through [`Expr`] handles that borrow
/// the graph, so building an expression never evaluates anything.
#[derive(Default)]
pub struct IndicatorGraph {
    nodes: RefCell<Vec<NodeSpec>>,
    sources: RefCell<BTreeMap<String, SourceHandle>>,
}

impl fmt::Debug for IndicatorGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndicatorGraph")
            .field("nodes", &self.nodes.borrow().len())
            .field("sources", &self.sources.borrow().keys().collect::<Vec<_>>())
            .finish()
    }
}

impl IndicatorGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.borrow().is_empty()
    }

    // --- Sources & leaves ---

    /// Register a blocking raw source under `tag`.
    pub fn source(&self, tag: impl Into<String>, source: impl TickSource + 'static) -> Result<(), GraphError> {
        self.register(tag.into(), SourceHandle::Sync(Box::new(source)))
    }

    /// Register an asynchronous raw source under `tag`.
    pub fn async_source(
        &self,
        tag: impl Into<String>,
        source: impl AsyncTickSource + 'static,
    ) -> Result<(), GraphError> {
        self.register(tag.into(), SourceHandle::Async(Box::new(source)))
    }

    fn register(&self, tag: String, handle: SourceHandle) -> Result<(), GraphError> {
        let mut sources = self.sources.borrow_mut();
        if sources.contains_key(&tag) {
            return Err(GraphError::DuplicateSource { tag });
        }
        sources.insert(tag, handle);
        Ok(())
    }

    /// Add a leaf fed by the source registered under `tag`.
    ///
    /// The source may be registered later; `compile` checks it exists.
    pub fn leaf(&self, tag: impl Into<String>) -> Expr<'_> {
        let tag = tag.into();
        let id = self.push(NodeSpec::new(tag.clone(), NodeKind::Source { tag }));
        Expr::new(self, id)
    }

    /// Register `values` under `tag` and return a leaf fed by it.
    pub fn raw_series<I>(&self, tag: impl Into<String>, values: I) -> Result<Expr<'_>, GraphError>
    where
        I: IntoIterator<Item = f64>,
        I::IntoIter: Send + 'static,
    {
        let tag = tag.into();
        self.source(tag.clone(), IterSource::new(values))?;
        Ok(self.leaf(tag))
    }

    /// Register `stream` under `tag` and return a leaf fed by it.
    pub fn raw_stream<S>(&self, tag: impl Into<String>, stream: S) -> Result<Expr<'_>, GraphError>
    where
        S: Stream<Item = f64> + Unpin + Send + 'static,
    {
        let tag = tag.into();
        self.async_source(tag.clone(), StreamSource::new(stream))?;
        Ok(self.leaf(tag))
    }

    // --- Composite nodes ---

    /// Add a zero-history constant node.
    pub fn constant(&self, value: f64) -> Expr<'_> {
        let id = self.push(NodeSpec::new(format!("{value}"), NodeKind::Constant(value)));
        Expr::new(self, id)
    }

    /// Add `indicator` computed over `operands`, in argument order.
    ///
    /// Plain numbers are wrapped as constant nodes. An operand used at
    /// several positions is still a single dependency.
    ///
    /// # Panics
    /// Panics if an operand belongs to a different graph.
    pub fn node<'g, I, O>(&'g self, indicator: I, operands: impl IntoIterator<Item = O>) -> Expr<'g>
    where
        I: Indicator + 'static,
        O: Into<Operand<'g>>,
    {
        let mut deps: Vec<NodeId> = Vec::new();
        let mut args = Vec::new();
        for operand in operands {
            let id = self.resolve(operand.into());
            let position = match deps.iter().position(|&d| d == id) {
                Some(position) => position,
                None => {
                    deps.push(id);
                    deps.len() - 1
                }
            };
            args.push(position);
        }

        let spec = NodeSpec {
            name: indicator.name().to_string(),
            lookback: indicator.lookback(),
            own_history: indicator.own_history(),
            arity: indicator.arity(),
            kind: NodeKind::Compute(Box::new(indicator)),
            deps,
            args,
        };
        Expr::new(self, self.push(spec))
    }

    fn resolve<'g>(&'g self, operand: Operand<'g>) -> NodeId {
        match operand {
            Operand::Node(expr) => {
                assert!(
                    std::ptr::eq(expr.graph(), self),
                    "operand {} belongs to a different graph",
                    expr.id()
                );
                expr.id()
            }
            Operand::Constant(value) => self.constant(value).id(),
        }
    }

    fn push(&self, spec: NodeSpec) -> NodeId {
        let mut nodes = self.nodes.borrow_mut();
        let id = NodeId::new(nodes.len());
        nodes.push(spec);
        id
    }

    // --- Mutation ---

    /// Relabel a node for diagnostics.
    pub fn rename(&self, node: NodeId, name: impl Into<String>) -> Result<(), GraphError> {
        let mut nodes = self.nodes.borrow_mut();
        let spec = nodes.get_mut(node.index()).ok_or(GraphError::UnknownNode(node))?;
        spec.name = name.into();
        Ok(())
    }

    /// Rewire every use of `old` by `node` to `new`.
    ///
    /// Topology is otherwise immutable; this is how a feedback loop is
    /// expressed, which `compile` then rejects.
    pub fn replace_dependency(&self, node: NodeId, old: NodeId, new: NodeId) -> Result<(), GraphError> {
        let mut nodes = self.nodes.borrow_mut();
        if new.index() >= nodes.len() {
            return Err(GraphError::UnknownNode(new));
        }
        let spec = nodes.get_mut(node.index()).ok_or(GraphError::UnknownNode(node))?;
        let slot = spec
            .deps
            .iter()
            .position(|&d| d == old)
            .ok_or(GraphError::NotADependency { node, dependency: old })?;

        match spec.deps.iter().position(|&d| d == new) {
            Some(existing) if existing == slot => {}
            // `new` already a dependency: fold the two into one.
            Some(existing) => {
                spec.deps.remove(slot);
                let existing = if existing > slot { existing - 1 } else { existing };
                for arg in spec.args.iter_mut() {
                    if *arg == slot {
                        *arg = existing;
                    } else if *arg > slot {
                        *arg -= 1;
                    }
                }
            }
            None => spec.deps[slot] = new,
        }
        Ok(())
    }

    // --- Accessors ---

    pub fn name_of(&self, node: NodeId) -> Option<String> {
        self.nodes.borrow().get(node.index()).map(|s| s.name.clone())
    }

    pub fn dependencies_of(&self, node: NodeId) -> Option<Vec<NodeId>> {
        self.nodes.borrow().get(node.index()).map(|s| s.deps.clone())
    }

    pub fn lookback_of(&self, node: NodeId) -> Option<usize> {
        self.nodes.borrow().get(node.index()).map(|s| s.lookback)
    }

    /// Tags of all registered sources, in order.
    pub fn source_tags(&self) -> Vec<String> {
        self.sources.borrow().keys().cloned().collect()
    }

    pub(crate) fn with_nodes<R>(&self, f: impl FnOnce(&[NodeSpec]) -> R) -> R {
        f(&self.nodes.borrow())
    }

    pub(crate) fn has_source(&self, tag: &str) -> bool {
        self.sources.borrow().contains_key(tag)
    }

    pub(crate) fn into_parts(self) -> (Vec<NodeSpec>, BTreeMap<String, SourceHandle>) {
        (self.nodes.into_inner(), self.sources.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::BinaryNode;
    use crate::operators::BinaryOp;

    #[test]
    fn test_leaf_and_constant() {
        let graph = IndicatorGraph::new();
        let x = graph.raw_series("x", vec![1.0, 2.0]).unwrap();
        let c = graph.constant(2.5);

        assert_eq!(graph.len(), 2);
        assert_eq!(graph.name_of(x.id()).as_deref(), Some("x"));
        assert_eq!(graph.name_of(c.id()).as_deref(), Some("2.5"));
        assert_eq!(graph.dependencies_of(x.id()), Some(vec![]));
        assert_eq!(graph.source_tags(), vec!["x".to_string()]);
    }

    #[test]
    fn test_duplicate_source_rejected() {
        let graph = IndicatorGraph::new();
        graph.raw_series("x", vec![1.0]).unwrap();

        let err = graph.raw_series("x", vec![2.0]).unwrap_err();
        assert_eq!(err, GraphError::DuplicateSource { tag: "x".to_string() });
    }

    #[test]
    fn test_repeated_operand_is_one_dependency() {
        let graph = IndicatorGraph::new();
        let x = graph.leaf("x");
        let square = graph.node(BinaryNode::new(BinaryOp::Multiply), [x, x]);

        assert_eq!(graph.dependencies_of(square.id()), Some(vec![x.id()]));
        graph.with_nodes(|nodes| assert_eq!(nodes[square.id().index()].args, vec![0, 0]));
    }

    #[test]
    fn test_constant_operands_are_not_shared() {
        let graph = IndicatorGraph::new();
        let x = graph.leaf("x");
        let a = graph.node(BinaryNode::new(BinaryOp::Add), [Operand::from(x), Operand::from(1.0)]);
        let b = graph.node(BinaryNode::new(BinaryOp::Add), [Operand::from(x), Operand::from(1.0)]);

        let a_deps = graph.dependencies_of(a.id()).unwrap();
        let b_deps = graph.dependencies_of(b.id()).unwrap();
        assert_eq!(a_deps[0], b_deps[0]);
        assert_ne!(a_deps[1], b_deps[1]);
    }

    #[test]
    fn test_replace_dependency() {
        let graph = IndicatorGraph::new();
        let x = graph.leaf("x");
        let y = graph.leaf("y");
        let sum = graph.node(BinaryNode::new(BinaryOp::Add), [x, y]);

        graph.replace_dependency(sum.id(), x.id(), sum.id()).unwrap();
        assert_eq!(graph.dependencies_of(sum.id()), Some(vec![sum.id(), y.id()]));

        let err = graph.replace_dependency(sum.id(), x.id(), y.id()).unwrap_err();
        assert_eq!(
            err,
            GraphError::NotADependency {
                node: sum.id(),
                dependency: x.id()
            }
        );
    }

    #[test]
    fn test_replace_dependency_merges_duplicates() {
        let graph = IndicatorGraph::new();
        let x = graph.leaf("x");
        let y = graph.leaf("y");
        let diff = graph.node(BinaryNode::new(BinaryOp::Subtract), [x, y]);

        graph.replace_dependency(diff.id(), x.id(), y.id()).unwrap();
        assert_eq!(graph.dependencies_of(diff.id()), Some(vec![y.id()]));
        graph.with_nodes(|nodes| assert_eq!(nodes[diff.id().index()].args, vec![0, 0]));
    }

    #[test]
    fn test_replace_dependency_with_itself_is_noop() {
        let graph = IndicatorGraph::new();
        let x = graph.raw_series("x", vec![10.0]).unwrap();
        let y = graph.raw_series("y", vec![1.0]).unwrap();
        let diff = x - y;
        let diff_id = diff.id();

        graph.replace_dependency(diff_id, x.id(), x.id()).unwrap();
        assert_eq!(graph.dependencies_of(diff_id), Some(vec![x.id(), y.id()]));
        graph.with_nodes(|nodes| assert_eq!(nodes[diff_id.index()].args, vec![0, 1]));

        let records: Vec<_> = crate::generate_sync(graph, [("diff", diff_id)])
            .unwrap()
            .map(Result::unwrap)
            .collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value("diff"), Some(9.0));
    }

    #[test]
    #[should_panic(expected = "belongs to a different graph")]
    fn test_cross_graph_operand_panics() {
        let first = IndicatorGraph::new();
        let second = IndicatorGraph::new();
        let x = first.leaf("x");
        second.node(BinaryNode::new(BinaryOp::Add), [x, x]);
    }
}
