//! dogma Workflow IR
//!
//! Typed representation of a data workflow as a directed acyclic graph of
//! operations over named column sets.
//!
//! # Overview
//!
//! - **`WorkflowGraph`**: ingestion form (built in code or decoded from JSON)
//! - **`StructuralValidator`**: rejects malformed graphs with an [`IrError`]
//! - **`Workflow`**: sealed, validated graph with resolved output schemas
//! - **`WorkflowBuilder`**: ergonomic construction with sequential ids
//!
//! Nodes live in an arena and refer to each other by [`NodeId`], so shared
//! sub-expressions never create ownership cycles.
//!
//! # Example
//!
//! ```rust
//! use dogma_ir::{ColumnName, WorkflowBuilder};
//!
//! let mut b = WorkflowBuilder::new();
//! let src = b.source("people.csv", ["a", "b"]);
//! let proj = b.project(src, ["a"]);
//! b.sink(proj, "out");
//!
//! let workflow = b.build().unwrap();
//! assert_eq!(workflow.outputs(proj).unwrap(), &[ColumnName::new("a")]);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod builder;
pub mod error;
pub mod graph;
pub mod id;
pub mod node;
pub mod op;
pub mod validation;
pub mod workflow;

// Re-exports
pub use builder::WorkflowBuilder;
pub use error::{IrError, IrResult};
pub use graph::WorkflowGraph;
pub use id::{ColumnName, ColumnRef, FileId, NodeId};
pub use node::Node;
pub use op::{Arity, DerivedColumn, EdgeKind, OpKind};
pub use validation::{StructuralValidator, ValidationContext, DEFAULT_MAX_NODES};
pub use workflow::Workflow;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for building and inspecting workflows
    pub use crate::{
        ColumnName, ColumnRef, DerivedColumn, EdgeKind, FileId, IrError, Node, NodeId, OpKind,
        Workflow, WorkflowBuilder, WorkflowGraph,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
