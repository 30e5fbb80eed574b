//! Workflow Builder
//!
//! Programmatic construction of workflow IR, producing a validated
//! [`Workflow`].
//!
//! Usage:
//! ```rust
//! use dogma_ir::WorkflowBuilder;
//!
//! let mut b = WorkflowBuilder::new();
//! let people = b.source("people.csv", ["a", "b", "c"]);
//! let on_b = b.project(people, ["b"]);
//! let kept = b.filter(people, on_b);
//! let out = b.project(kept, ["a"]);
//! b.sink(out, "report");
//!
//! let workflow = b.build().unwrap();
//! assert_eq!(workflow.node_count(), 5);
//! ```

use crate::error::IrError;
use crate::graph::WorkflowGraph;
use crate::id::{ColumnName, FileId, NodeId};
use crate::node::Node;
use crate::op::{DerivedColumn, OpKind};
use crate::validation::{StructuralValidator, ValidationContext};
use crate::workflow::Workflow;

/// Builder for workflow graphs
///
/// Node ids are allocated sequentially from zero. The builder performs no
/// checks of its own; everything is validated by [`build`](Self::build).
#[derive(Debug, Clone, Default)]
pub struct WorkflowBuilder {
    nodes: Vec<Node>,
    next_id: u32,
}

fn names<I, C>(columns: I) -> Vec<ColumnName>
where
    I: IntoIterator<Item = C>,
    C: Into<ColumnName>,
{
    columns.into_iter().map(Into::into).collect()
}

impl WorkflowBuilder {
    /// Create an empty builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes added so far
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Add a node with explicit dependencies
    pub fn add_node(&mut self, op: OpKind, inputs: Vec<NodeId>, predicates: Vec<NodeId>) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.push(Node {
            id,
            op,
            inputs,
            predicates,
        });
        id
    }

    /// Read every declared column of `file`
    pub fn source<I, C>(&mut self, file: impl Into<FileId>, columns: I) -> NodeId
    where
        I: IntoIterator<Item = C>,
        C: Into<ColumnName>,
    {
        self.add_node(
            OpKind::Source {
                file: file.into(),
                columns: names(columns),
            },
            vec![],
            vec![],
        )
    }

    /// Keep a subset of `input`'s columns
    pub fn project<I, C>(&mut self, input: NodeId, columns: I) -> NodeId
    where
        I: IntoIterator<Item = C>,
        C: Into<ColumnName>,
    {
        self.add_node(
            OpKind::Project {
                columns: names(columns),
            },
            vec![input],
            vec![],
        )
    }

    /// Compute new columns from declared reads of `input`
    pub fn map(&mut self, input: NodeId, outputs: impl IntoIterator<Item = DerivedColumn>) -> NodeId {
        self.add_node(
            OpKind::Map {
                outputs: outputs.into_iter().collect(),
            },
            vec![input],
            vec![],
        )
    }

    /// Keep the rows of `input` selected by `predicate`
    pub fn filter(&mut self, input: NodeId, predicate: NodeId) -> NodeId {
        self.add_node(OpKind::Filter, vec![input], vec![predicate])
    }

    /// Equi-join `left` and `right` on aligned key lists
    pub fn join<L, R, CL, CR>(&mut self, left: NodeId, right: NodeId, left_keys: L, right_keys: R) -> NodeId
    where
        L: IntoIterator<Item = CL>,
        R: IntoIterator<Item = CR>,
        CL: Into<ColumnName>,
        CR: Into<ColumnName>,
    {
        self.add_node(
            OpKind::Join {
                left_keys: names(left_keys),
                right_keys: names(right_keys),
            },
            vec![left, right],
            vec![],
        )
    }

    /// Group `input` and reduce columns per group
    pub fn aggregate<G, C>(
        &mut self,
        input: NodeId,
        group_by: G,
        aggregates: impl IntoIterator<Item = DerivedColumn>,
    ) -> NodeId
    where
        G: IntoIterator<Item = C>,
        C: Into<ColumnName>,
    {
        self.add_node(
            OpKind::Aggregate {
                group_by: names(group_by),
                aggregates: aggregates.into_iter().collect(),
            },
            vec![input],
            vec![],
        )
    }

    /// Row-wise union of `inputs`
    pub fn concat(&mut self, inputs: impl IntoIterator<Item = NodeId>) -> NodeId {
        self.add_node(OpKind::Concat, inputs.into_iter().collect(), vec![])
    }

    /// Publish `input` as a workflow result
    pub fn sink(&mut self, input: NodeId, label: impl Into<String>) -> NodeId {
        self.add_node(
            OpKind::Sink {
                label: label.into(),
            },
            vec![input],
            vec![],
        )
    }

    /// Add a governing predicate to an existing node
    ///
    /// # Errors
    /// `IrError::DanglingReference` if `node` was not created by this builder.
    pub fn gate(&mut self, node: NodeId, predicate: NodeId) -> Result<(), IrError> {
        let target = self
            .nodes
            .iter_mut()
            .find(|n| n.id == node)
            .ok_or(IrError::DanglingReference {
                node: predicate,
                missing: node,
                edge: crate::op::EdgeKind::Predicate,
            })?;
        target.predicates.push(predicate);
        Ok(())
    }

    /// Unvalidated graph
    #[must_use]
    pub fn into_graph(self) -> WorkflowGraph {
        WorkflowGraph::from_nodes(self.nodes)
    }

    /// Validate with default limits
    ///
    /// # Errors
    /// Any structural violation.
    pub fn build(self) -> Result<Workflow, IrError> {
        self.into_graph().validate()
    }

    /// Validate with custom limits
    ///
    /// # Errors
    /// Any structural violation.
    pub fn build_with(self, context: ValidationContext) -> Result<Workflow, IrError> {
        StructuralValidator::with_context(context).validate(self.into_graph())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_sequential_ids() {
        let mut b = WorkflowBuilder::new();
        let a = b.source("f", ["x"]);
        let c = b.sink(a, "out");
        assert_eq!(a, NodeId(0));
        assert_eq!(c, NodeId(1));
        assert_eq!(b.node_count(), 2);
    }

    #[test]
    fn gate_adds_predicate() {
        let mut b = WorkflowBuilder::new();
        let src = b.source("f", ["x", "y"]);
        let cond = b.project(src, ["y"]);
        let out = b.project(src, ["x"]);
        b.gate(out, cond).unwrap();

        let graph = b.into_graph();
        assert_eq!(graph.nodes[2].predicates, vec![cond]);
    }

    #[test]
    fn gate_unknown_node_fails() {
        let mut b = WorkflowBuilder::new();
        let src = b.source("f", ["x"]);
        assert!(b.gate(NodeId(42), src).is_err());
    }

    #[test]
    fn build_with_applies_limits() {
        let mut b = WorkflowBuilder::new();
        b.source("f", ["x"]);
        b.source("g", ["y"]);
        let result = b.build_with(ValidationContext { max_nodes: 1 });
        assert!(matches!(result, Err(IrError::TooManyNodes { .. })));
    }
}
