//! dogma Verifier
//!
//! Statically decides whether a workflow can expose a column its policy
//! marks `read: false`, directly or through any chain of transformations,
//! joins, aggregations or predicates.
//!
//! # Pipeline
//!
//! ```text
//! Workflow + ColumnPolicy
//!     -> provenance::propagate   (per-node, per-column source sets)
//!     -> checker::AccessChecker  (sinks and unobserved sources)
//!     -> Verdict                 (ALLOW | DENY with witnesses)
//! ```
//!
//! # Example
//!
//! ```rust
//! use dogma_ir::WorkflowBuilder;
//! use dogma_policy::Policy;
//! use dogma_verify::Verifier;
//!
//! let policy = Policy::builder()
//!     .file("people.csv", [("a", true), ("b", false), ("c", false)])
//!     .build();
//!
//! let mut b = WorkflowBuilder::new();
//! let people = b.source("people.csv", ["a", "b", "c"]);
//! let on_b = b.project(people, ["b"]);
//! let kept = b.filter(people, on_b);
//! let out = b.project(kept, ["a"]);
//! b.sink(out, "report");
//!
//! let verdict = Verifier::new().verify(&b.build().unwrap(), &policy).unwrap();
//! assert!(!verdict.is_allowed());
//! assert_eq!(verdict.findings()[0].node, out);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod checker;
pub mod config;
pub mod error;
pub mod provenance;
pub mod verdict;
pub mod verifier;
pub mod witness;

// Re-exports
pub use checker::AccessChecker;
pub use config::VerifierConfig;
pub use error::{VerifyError, VerifyResult};
pub use provenance::{propagate, NodeProvenance, ProvenanceMap, ProvenanceSet};
pub use verdict::{Finding, FindingOrigin, SinkRef, Verdict};
pub use verifier::{verify, Verifier};
pub use witness::{find_witness, WitnessPath, WitnessStep};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for verifying workflows
    pub use crate::{Finding, Verdict, Verifier, VerifierConfig, VerifyError};
    pub use dogma_ir::prelude::*;
    pub use dogma_policy::{ColumnPolicy, Policy, PolicyDocument};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
