//! Workflow nodes

use crate::id::NodeId;
use crate::op::{EdgeKind, OpKind};
use serde::{Deserialize, Serialize};

/// One operation in the workflow graph
///
/// Dependencies are ids into the owning graph. `inputs` are data
/// dependencies in positional order; `predicates` gate the node's execution
/// or row selection and are tracked for implicit flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Node {
    /// Unique id within the workflow
    pub id: NodeId,
    /// Operation performed
    pub op: OpKind,
    /// Data inputs
    #[serde(default)]
    pub inputs: Vec<NodeId>,
    /// Governing predicates
    #[serde(default)]
    pub predicates: Vec<NodeId>,
}

impl Node {
    /// Create node without predicates
    #[must_use]
    pub fn new(id: NodeId, op: OpKind, inputs: Vec<NodeId>) -> Self {
        Self {
            id,
            op,
            inputs,
            predicates: Vec::new(),
        }
    }

    /// Add governing predicates
    #[must_use]
    pub fn with_predicates(mut self, predicates: Vec<NodeId>) -> Self {
        self.predicates = predicates;
        self
    }

    /// All dependencies, inputs first, each tagged with how it is used
    pub fn dependencies(&self) -> impl Iterator<Item = (NodeId, EdgeKind)> + '_ {
        self.inputs
            .iter()
            .map(|&id| (id, EdgeKind::Input))
            .chain(self.predicates.iter().map(|&id| (id, EdgeKind::Predicate)))
    }
}
