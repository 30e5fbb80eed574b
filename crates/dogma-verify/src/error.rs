//! Error types for verification
//!
//! Policy denials are not errors: they are a successful verification with a
//! `DENY` verdict. Errors here mean no verdict could be produced.

use dogma_ir::{IrError, NodeId};

/// Verification failed before a verdict was reached
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// Workflow IR is malformed
    #[error("structural error: {0}")]
    Structural(#[from] IrError),

    /// Invalid verifier configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Analysis reached a state validation should have excluded
    #[error("internal error at node {node}: {reason}")]
    Internal {
        /// Node being analysed
        node: NodeId,
        /// What went wrong
        reason: String,
    },
}

impl VerifyError {
    /// Create internal error
    pub fn internal(node: NodeId, reason: impl Into<String>) -> Self {
        Self::Internal {
            node,
            reason: reason.into(),
        }
    }

    /// True if the caller must fix the workflow IR
    #[inline]
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Structural(_))
    }
}

/// Result type alias for verification
pub type VerifyResult<T> = Result<T, VerifyError>;
