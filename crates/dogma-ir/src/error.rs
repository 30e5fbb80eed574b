//! Structural errors
//!
//! A structural error means the IR itself is malformed. It is always fatal:
//! no policy question is meaningful until the caller fixes the input.

use crate::id::{ColumnName, NodeId};
use crate::op::{Arity, EdgeKind};

/// Malformed workflow IR
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IrError {
    /// IR document could not be decoded
    #[error("malformed IR document: {0}")]
    Malformed(String),

    /// Workflow exceeds the configured node limit
    #[error("workflow has {actual} nodes, limit is {limit}")]
    TooManyNodes { actual: usize, limit: usize },

    /// Two nodes share an id
    #[error("duplicate node id {node}")]
    DuplicateNode { node: NodeId },

    /// Input or predicate refers to a node that does not exist
    #[error("node {node} references missing {edge} node {missing}")]
    DanglingReference {
        node: NodeId,
        missing: NodeId,
        edge: EdgeKind,
    },

    /// Node lists itself as input or predicate
    #[error("node {node} references itself as {edge}")]
    SelfReference { node: NodeId, edge: EdgeKind },

    /// Dependencies (inputs and predicates together) form a cycle
    #[error("cycle detected through node {node}")]
    CycleDetected { node: NodeId },

    /// Wrong number of data inputs for the operation
    #[error("node {node} ({op}) expects {expected} inputs, found {actual}")]
    ArityMismatch {
        node: NodeId,
        op: &'static str,
        expected: Arity,
        actual: usize,
    },

    /// Filter without any predicate node
    #[error("filter node {node} has no predicate")]
    MissingPredicate { node: NodeId },

    /// Operation names a column its input does not produce
    #[error("node {node} references unknown column '{column}'")]
    UnknownColumn { node: NodeId, column: ColumnName },

    /// Output schema contains the same column twice
    #[error("node {node} produces column '{column}' more than once")]
    DuplicateColumn { node: NodeId, column: ColumnName },

    /// Join key lists are empty or of different length
    #[error("join node {node} has {left} left keys and {right} right keys")]
    JoinKeyMismatch {
        node: NodeId,
        left: usize,
        right: usize,
    },

    /// Concat input width differs from the first input
    #[error("concat node {node}: input {input} has {actual} columns, expected {expected}")]
    ConcatWidthMismatch {
        node: NodeId,
        input: NodeId,
        expected: usize,
        actual: usize,
    },

    /// Source without file name or without columns
    #[error("source node {node} is ill-formed: {reason}")]
    IllFormedSource { node: NodeId, reason: String },
}

impl IrError {
    /// Node the violation was detected at, if any
    #[must_use]
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Self::Malformed(_) | Self::TooManyNodes { .. } => None,
            Self::DuplicateNode { node }
            | Self::DanglingReference { node, .. }
            | Self::SelfReference { node, .. }
            | Self::CycleDetected { node }
            | Self::ArityMismatch { node, .. }
            | Self::MissingPredicate { node }
            | Self::UnknownColumn { node, .. }
            | Self::DuplicateColumn { node, .. }
            | Self::JoinKeyMismatch { node, .. }
            | Self::ConcatWidthMismatch { node, .. }
            | Self::IllFormedSource { node, .. } => Some(*node),
        }
    }
}

/// Result type alias for IR operations
pub type IrResult<T> = Result<T, IrError>;
