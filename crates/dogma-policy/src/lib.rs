//! dogma Policy Model
//!
//! Declarative per-file, per-column read permissions.
//!
//! # Core Concepts
//!
//! - [`PolicyDocument`]: one JSON document, one file
//! - [`Policy`]: union of documents handed to the verifier
//! - [`ColumnPolicy`]: the query interface (`permission(file, column)`)
//!
//! Lookups are fail-closed: a file or column the policy does not mention is
//! forbidden.
//!
//! # Example
//!
//! ```rust
//! use dogma_ir::ColumnRef;
//! use dogma_policy::{ColumnPolicy, Policy, PolicyDocument};
//!
//! let doc = PolicyDocument::from_json(
//!     r#"{"fileName": "people.csv", "columns": {"a": {"read": true}, "b": {"read": false}}}"#,
//! ).unwrap();
//! let policy = Policy::from_documents([doc]);
//!
//! assert!(policy.permits(&ColumnRef::new("people.csv", "a")));
//! assert!(!policy.permits(&ColumnRef::new("people.csv", "b")));
//! assert!(!policy.permits(&ColumnRef::new("people.csv", "zz")));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod document;
pub mod error;
pub mod policy;

// Re-exports
pub use document::{ColumnGrant, PolicyDocument};
pub use error::{PolicyError, PolicyResult};
pub use policy::{ColumnPolicy, Policy, PolicyBuilder};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
