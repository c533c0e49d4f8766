//! Dependency graph compilation: reachability, cycle detection, topological
//! order and window capacities.

use crate::graph::{IndicatorGraph, NodeKind, NodeSpec};
use std::collections::BTreeMap;
use tickgraph_core::error::GraphError;
use tickgraph_core::types::NodeId;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// The subgraph reachable from a set of named roots, in evaluation order.
///
/// Every node appears after all of its dependencies. Ordering is
/// deterministic: roots are visited in lexicographic name order and
/// dependencies in declaration order.
#[derive(Debug, Clone)]
pub struct CompiledGraph {
    order: Vec<NodeId>,
    /// Position in `order`, indexed by arena slot.
    position: Vec<Option<usize>>,
    capacity: Vec<usize>,
    roots: BTreeMap<String, NodeId>,
    sources: BTreeMap<String, Vec<NodeId>>,
}

impl CompiledGraph {
    /// Compile the subgraph reachable from `roots`.
    pub fn compile<S, N>(graph: &IndicatorGraph, roots: impl IntoIterator<Item = (S, N)>) -> Result<Self, GraphError>
    where
        S: Into<String>,
        N: Into<NodeId>,
    {
        let roots: BTreeMap<String, NodeId> = roots.into_iter().map(|(name, id)| (name.into(), id.into())).collect();
        graph.with_nodes(|nodes| Self::build(nodes, roots, |tag| graph.has_source(tag)))
    }

    pub(crate) fn build(
        nodes: &[NodeSpec],
        roots: BTreeMap<String, NodeId>,
        has_source: impl Fn(&str) -> bool,
    ) -> Result<Self, GraphError> {
        if roots.is_empty() {
            return Err(GraphError::NoRoots);
        }

        let order = topological_order(nodes, roots.values().copied())?;

        let mut position = vec![None; nodes.len()];
        for (i, id) in order.iter().enumerate() {
            position[id.index()] = Some(i);
        }

        let mut capacity = vec![0usize; nodes.len()];
        let mut sources: BTreeMap<String, Vec<NodeId>> = BTreeMap::new();

        for &id in &order {
            let spec = &nodes[id.index()];
            match &spec.kind {
                NodeKind::Source { tag } => {
                    if !has_source(tag) {
                        return Err(GraphError::MissingSource { tag: tag.clone() });
                    }
                    sources.entry(tag.clone()).or_default().push(id);
                }
                NodeKind::Constant(_) => {}
                NodeKind::Compute(_) if spec.deps.is_empty() => {
                    return Err(GraphError::UndrivenNode {
                        node: id,
                        name: spec.name.clone(),
                    });
                }
                NodeKind::Compute(_) => {
                    if let Some(expected) = spec.arity.filter(|&n| n != spec.args.len()) {
                        return Err(GraphError::ArityMismatch {
                            node: id,
                            name: spec.name.clone(),
                            expected,
                            found: spec.args.len(),
                        });
                    }
                }
            }

            capacity[id.index()] = capacity[id.index()].max(spec.own_history);
            for dep in &spec.deps {
                capacity[dep.index()] = capacity[dep.index()].max(spec.lookback);
            }
        }

        let compiled = Self {
            order,
            position,
            capacity,
            roots,
            sources,
        };

        info!(
            nodes = compiled.node_count(),
            roots = compiled.roots.len(),
            sources = compiled.sources.len(),
            window_budget = compiled.window_budget(),
            "Compiled indicator graph"
        );

        Ok(compiled)
    }

    /// Nodes in evaluation order.
    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    pub fn roots(&self) -> &BTreeMap<String, NodeId> {
        &self.roots
    }

    /// Source tags in use, each with the leaves it feeds.
    pub fn sources(&self) -> &BTreeMap<String, Vec<NodeId>> {
        &self.sources
    }

    /// Window capacity of `node`; 0 for nodes outside the compiled subgraph.
    pub fn capacity(&self, node: NodeId) -> usize {
        if self.contains(node) {
            self.capacity[node.index()]
        } else {
            0
        }
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.position(node).is_some()
    }

    /// Index of `node` in [`order`](Self::order).
    pub fn position(&self, node: NodeId) -> Option<usize> {
        self.position.get(node.index()).copied().flatten()
    }

    pub fn node_count(&self) -> usize {
        self.order.len()
    }

    /// Total number of values retained across all windows once full.
    pub fn window_budget(&self) -> usize {
        self.order.iter().map(|id| self.capacity[id.index()]).sum()
    }
}

/// Iterative post-order DFS from `roots`.
fn topological_order(nodes: &[NodeSpec], roots: impl Iterator<Item = NodeId>) -> Result<Vec<NodeId>, GraphError> {
    let mut marks = vec![Mark::Unvisited; nodes.len()];
    let mut order = Vec::new();
    // (node, index of the next dependency to visit)
    let mut stack: Vec<(NodeId, usize)> = Vec::new();

    for root in roots {
        if root.index() >= nodes.len() {
            return Err(GraphError::UnknownNode(root));
        }
        if marks[root.index()] != Mark::Unvisited {
            continue;
        }
        marks[root.index()] = Mark::InProgress;
        stack.push((root, 0));

        while let Some(frame) = stack.last_mut() {
            let (node, next) = *frame;
            let deps = &nodes[node.index()].deps;

            if next < deps.len() {
                frame.1 += 1;
                let dep = deps[next];
                if dep.index() >= nodes.len() {
                    return Err(GraphError::UnknownNode(dep));
                }
                match marks[dep.index()] {
                    Mark::Unvisited => {
                        marks[dep.index()] = Mark::InProgress;
                        stack.push((dep, 0));
                    }
                    Mark::InProgress => {
                        debug!(node = %dep, "Back edge found during compile");
                        return Err(GraphError::Cycle {
                            node: dep,
                            name: nodes[dep.index()].name.clone(),
                        });
                    }
                    Mark::Done => {}
                }
            } else {
                marks[node.index()] = Mark::Done;
                order.push(node);
                stack.pop();
            }
        }
    }

    Ok(order)
}
