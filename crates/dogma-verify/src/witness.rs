//! Witness paths
//!
//! A witness explains a finding: the shortest dependency chain from the
//! `Source` that reads the forbidden column to the node the finding is
//! located at. Witnesses are diagnostics only and never affect a verdict.

use crate::provenance::ProvenanceMap;
use dogma_ir::{ColumnName, ColumnRef, EdgeKind, Node, NodeId, OpKind, Workflow};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::fmt;

/// One hop of a witness path
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct WitnessStep {
    /// Node on the path
    pub node: NodeId,
    /// Operation name of the node
    pub op: &'static str,
    /// Edge by which this node feeds the next step (`None` on the last step)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub via: Option<EdgeKind>,
}

/// Source-first dependency chain
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct WitnessPath(Vec<WitnessStep>);

impl WitnessPath {
    /// Path not computed
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Steps, source first
    #[inline]
    #[must_use]
    pub fn steps(&self) -> &[WitnessStep] {
        &self.0
    }

    /// Number of steps
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if no path was computed
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First node (the supplying source)
    #[must_use]
    pub fn origin(&self) -> Option<NodeId> {
        self.0.first().map(|s| s.node)
    }

    /// Last node (where the finding is located)
    #[must_use]
    pub fn target(&self) -> Option<NodeId> {
        self.0.last().map(|s| s.node)
    }
}

impl fmt::Display for WitnessPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.0 {
            write!(f, "{} {}", step.op, step.node)?;
            if let Some(edge) = step.via {
                write!(f, " -[{edge}]-> ")?;
            }
        }
        Ok(())
    }
}

fn reads(op: &OpKind, column: &ColumnRef) -> bool {
    match op {
        OpKind::Source { file, columns } => *file == column.file && columns.contains(&column.column),
        _ => false,
    }
}

/// True if `column` reaches the data columns of `consumer` through its input `dep`
///
/// A node may carry a reference only through its predicates while its input
/// edge forwards none of the columns that hold it.
fn flows_through(
    provenance: &ProvenanceMap,
    consumer: &Node,
    dep: NodeId,
    column: &ColumnRef,
) -> bool {
    let Some(facts) = provenance.node(dep) else {
        return false;
    };
    let holds = |name: &ColumnName| {
        facts
            .column(name.as_str())
            .is_some_and(|set| set.contains(column))
    };

    match &consumer.op {
        OpKind::Source { .. } => false,
        OpKind::Project { columns } => columns.iter().any(holds),
        OpKind::Map { outputs } => outputs.iter().flat_map(|d| &d.from).any(holds),
        OpKind::Aggregate {
            group_by,
            aggregates,
        } => group_by
            .iter()
            .chain(aggregates.iter().flat_map(|d| &d.from))
            .any(holds),
        OpKind::Filter | OpKind::Join { .. } | OpKind::Concat | OpKind::Sink { .. } => {
            facts.full().contains(column)
        }
    }
}

/// Shortest chain from a source reading `column` to `target`
///
/// Breadth-first search backwards over inputs, then predicates. An input edge
/// is followed only if the consumer reads `column` through it, a predicate
/// edge only if the predicate node carries `column`. Returns an empty path if
/// no such chain exists.
#[must_use]
pub fn find_witness(
    workflow: &Workflow,
    provenance: &ProvenanceMap,
    target: NodeId,
    column: &ColumnRef,
) -> WitnessPath {
    let carries = |id: NodeId| {
        provenance
            .node(id)
            .is_some_and(|facts| facts.full().contains(column))
    };

    // node -> (consumer towards target, edge from node to that consumer)
    let mut parent: HashMap<NodeId, Option<(NodeId, EdgeKind)>> = HashMap::new();
    let mut queue = VecDeque::new();

    if carries(target) {
        parent.insert(target, None);
        queue.push_back(target);
    }

    while let Some(id) = queue.pop_front() {
        let Some(node) = workflow.node(id) else {
            continue;
        };

        if reads(&node.op, column) {
            let mut steps = Vec::new();
            let mut cursor = Some(id);
            while let Some(current) = cursor {
                let link = parent.get(&current).copied().flatten();
                if let Some(op) = workflow.op(current) {
                    steps.push(WitnessStep {
                        node: current,
                        op: op.name(),
                        via: link.map(|(_, edge)| edge),
                    });
                }
                cursor = link.map(|(next, _)| next);
            }
            return WitnessPath(steps);
        }

        for (dep, edge) in node.dependencies() {
            let follows = match edge {
                EdgeKind::Input => flows_through(provenance, node, dep, column),
                EdgeKind::Predicate => carries(dep),
            };
            if parent.contains_key(&dep) || !follows {
                continue;
            }
            parent.insert(dep, Some((id, edge)));
            queue.push_back(dep);
        }
    }

    WitnessPath::empty()
}
