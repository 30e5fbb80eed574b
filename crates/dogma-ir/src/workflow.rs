//! Validated Workflow - proof-carrying IR
//!
//! A [`Workflow`] can only be obtained from
//! [`StructuralValidator::validate`](crate::validation::StructuralValidator::validate).
//! Holding one means the graph is acyclic, every reference resolves, every
//! node has a legal arity, and every node's output schema has been resolved.

use crate::id::{ColumnName, NodeId};
use crate::node::Node;
use crate::op::OpKind;
use std::collections::HashMap;

/// Structurally valid workflow with resolved schemas
#[derive(Debug, Clone)]
pub struct Workflow {
    nodes: Vec<Node>,
    slots: HashMap<NodeId, usize>,
    schemas: Vec<Vec<ColumnName>>,
    order: Vec<NodeId>,
    consumers: Vec<Vec<NodeId>>,
}

impl Workflow {
    /// Assemble a validated workflow (validator only)
    pub(crate) fn sealed(
        nodes: Vec<Node>,
        slots: HashMap<NodeId, usize>,
        schemas: Vec<Vec<ColumnName>>,
        order: Vec<NodeId>,
    ) -> Self {
        let mut consumers = vec![Vec::new(); nodes.len()];
        for node in &nodes {
            for (dep, _) in node.dependencies() {
                if let Some(&slot) = slots.get(&dep) {
                    if !consumers[slot].contains(&node.id) {
                        consumers[slot].push(node.id);
                    }
                }
            }
        }

        Self {
            nodes,
            slots,
            schemas,
            order,
            consumers,
        }
    }

    /// Number of nodes
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of dependency edges (inputs plus predicates)
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.nodes
            .iter()
            .map(|n| n.inputs.len() + n.predicates.len())
            .sum()
    }

    /// Look up a node
    #[inline]
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(&id).map(|&slot| &self.nodes[slot])
    }

    /// Operation of a node
    #[inline]
    #[must_use]
    pub fn op(&self, id: NodeId) -> Option<&OpKind> {
        self.node(id).map(|n| &n.op)
    }

    /// Data inputs of a node (empty for unknown ids)
    #[must_use]
    pub fn inputs(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map_or(&[], |n| n.inputs.as_slice())
    }

    /// Predicates of a node (empty for unknown ids)
    #[must_use]
    pub fn predicates(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map_or(&[], |n| n.predicates.as_slice())
    }

    /// Resolved output columns of a node
    #[inline]
    #[must_use]
    pub fn outputs(&self, id: NodeId) -> Option<&[ColumnName]> {
        self.slots
            .get(&id)
            .map(|&slot| self.schemas[slot].as_slice())
    }

    /// Nodes that use `id` as input or predicate
    #[must_use]
    pub fn consumers(&self, id: NodeId) -> &[NodeId] {
        self.slots
            .get(&id)
            .map_or(&[], |&slot| self.consumers[slot].as_slice())
    }

    /// Dependency order: every node appears after all of its inputs and predicates
    #[inline]
    #[must_use]
    pub fn topological_order(&self) -> &[NodeId] {
        &self.order
    }

    /// All nodes in document order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Ids of `Sink` nodes, ascending
    #[must_use]
    pub fn sinks(&self) -> Vec<NodeId> {
        self.ids_where(OpKind::is_sink)
    }

    /// Ids of `Source` nodes, ascending
    #[must_use]
    pub fn sources(&self) -> Vec<NodeId> {
        self.ids_where(OpKind::is_source)
    }

    fn ids_where(&self, pred: impl Fn(&OpKind) -> bool) -> Vec<NodeId> {
        let mut ids: Vec<_> = self
            .nodes
            .iter()
            .filter(|n| pred(&n.op))
            .map(|n| n.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Nodes from which at least one `Sink` is reachable, sinks included
    #[must_use]
    pub fn observable_nodes(&self) -> Vec<NodeId> {
        let mut seen = vec![false; self.nodes.len()];
        let mut stack = self.sinks();
        let mut out = Vec::new();

        while let Some(id) = stack.pop() {
            let Some(&slot) = self.slots.get(&id) else {
                continue;
            };
            if seen[slot] {
                continue;
            }
            seen[slot] = true;
            out.push(id);
            stack.extend(self.nodes[slot].dependencies().map(|(dep, _)| dep));
        }

        out.sort_unstable();
        out
    }
}
