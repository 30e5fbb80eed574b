//! Unvalidated workflow graph
//!
//! [`WorkflowGraph`] is the ingestion form of the IR: a flat list of nodes as
//! produced by a workflow parser or decoded from a JSON IR document. It must
//! pass [`StructuralValidator`](crate::validation::StructuralValidator) before
//! any analysis can see it.

use crate::error::IrError;
use crate::node::Node;
use crate::validation::StructuralValidator;
use crate::workflow::Workflow;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Workflow IR as ingested, not yet validated
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkflowGraph {
    /// Nodes in document order
    pub nodes: Vec<Node>,
}

impl WorkflowGraph {
    /// Create graph from nodes
    #[inline]
    #[must_use]
    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Decode a JSON IR document
    ///
    /// # Errors
    /// `IrError::Malformed` if the document does not match the IR shape.
    pub fn from_json(content: &str) -> Result<Self, IrError> {
        serde_json::from_str(content).map_err(|e| IrError::Malformed(e.to_string()))
    }

    /// Read and decode a JSON IR document from disk
    ///
    /// # Errors
    /// `IrError::Malformed` on read failure or invalid content.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, IrError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| IrError::Malformed(format!("{}: {e}", path.display())))?;
        Self::from_json(&content)
    }

    /// Encode as pretty JSON
    ///
    /// # Errors
    /// `IrError::Malformed` if encoding fails.
    pub fn to_json(&self) -> Result<String, IrError> {
        serde_json::to_string_pretty(self).map_err(|e| IrError::Malformed(e.to_string()))
    }

    /// Number of nodes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the graph has no nodes
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Validate with default limits
    ///
    /// # Errors
    /// Any structural violation, see [`IrError`].
    pub fn validate(self) -> Result<Workflow, IrError> {
        StructuralValidator::new().validate(self)
    }
}
