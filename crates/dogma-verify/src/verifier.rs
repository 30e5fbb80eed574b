//! Verification entry point
//!
//! Orchestrates one admission decision: provenance propagation, access
//! checking, verdict assembly. Every call allocates its own tables, so one
//! [`Verifier`] can serve concurrent requests.

use crate::checker::AccessChecker;
use crate::config::VerifierConfig;
use crate::error::VerifyError;
use crate::provenance::{propagate, ProvenanceMap};
use crate::verdict::Verdict;
use dogma_ir::{IrError, StructuralValidator, Workflow, WorkflowGraph};
use dogma_policy::ColumnPolicy;

/// Static column-policy verifier
#[derive(Debug, Clone, Default)]
pub struct Verifier {
    config: VerifierConfig,
}

impl Verifier {
    /// Create verifier with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create verifier with custom configuration
    #[must_use]
    pub fn with_config(config: VerifierConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Provenance of every node, without consulting a policy
    ///
    /// # Errors
    /// `VerifyError::Structural` if the workflow exceeds the node limit.
    pub fn analyze(&self, workflow: &Workflow) -> Result<ProvenanceMap, VerifyError> {
        self.check_limits(workflow)?;
        propagate(workflow)
    }

    /// Decide whether `workflow` may run under `policy`
    ///
    /// A `Deny` verdict is a successful result carrying every finding.
    ///
    /// # Errors
    /// `VerifyError::Structural` if the workflow exceeds the node limit;
    /// `VerifyError::Internal` on a broken invariant.
    #[tracing::instrument(
        skip_all,
        fields(nodes = workflow.node_count(), edges = workflow.edge_count())
    )]
    pub fn verify<P: ColumnPolicy + ?Sized>(
        &self,
        workflow: &Workflow,
        policy: &P,
    ) -> Result<Verdict, VerifyError> {
        let provenance = self.analyze(workflow)?;

        let findings = AccessChecker::new(workflow, &provenance, policy)
            .unobserved_sources(self.config.check_unobserved_sources)
            .witnesses(self.config.collect_witnesses)
            .findings()?;

        let verdict = Verdict::from_findings(findings);
        tracing::info!(
            allowed = verdict.is_allowed(),
            findings = verdict.findings().len(),
            "verification complete"
        );
        Ok(verdict)
    }

    /// Validate an unchecked graph, then verify it
    ///
    /// # Errors
    /// Any structural violation, then as [`verify`](Self::verify).
    pub fn verify_graph<P: ColumnPolicy + ?Sized>(
        &self,
        graph: WorkflowGraph,
        policy: &P,
    ) -> Result<Verdict, VerifyError> {
        let workflow =
            StructuralValidator::with_context(self.config.validation_context()).validate(graph)?;
        self.verify(&workflow, policy)
    }

    fn check_limits(&self, workflow: &Workflow) -> Result<(), VerifyError> {
        let actual = workflow.node_count();
        if actual > self.config.max_nodes {
            return Err(IrError::TooManyNodes {
                actual,
                limit: self.config.max_nodes,
            }
            .into());
        }
        Ok(())
    }
}

/// Verify with default configuration
///
/// # Errors
/// As [`Verifier::verify`].
pub fn verify<P: ColumnPolicy + ?Sized>(
    workflow: &Workflow,
    policy: &P,
) -> Result<Verdict, VerifyError> {
    Verifier::new().verify(workflow, policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dogma_ir::WorkflowBuilder;
    use dogma_policy::Policy;

    #[test]
    fn node_limit_applies_to_sealed_workflows() {
        let mut b = WorkflowBuilder::new();
        let src = b.source("f", ["a"]);
        b.sink(src, "out");
        let wf = b.build().unwrap();

        let verifier = Verifier::with_config(VerifierConfig::new().with_max_nodes(1));
        let err = verifier.verify(&wf, &Policy::deny_all()).unwrap_err();
        assert!(matches!(
            err,
            VerifyError::Structural(IrError::TooManyNodes { actual: 2, limit: 1 })
        ));
    }

    #[test]
    fn verify_graph_validates_first() {
        let mut b = WorkflowBuilder::new();
        let src = b.source("f", ["a"]);
        b.add_node(dogma_ir::OpKind::Filter, vec![src], vec![]);

        let err = Verifier::new()
            .verify_graph(b.into_graph(), &Policy::deny_all())
            .unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn free_function_uses_defaults() {
        let mut b = WorkflowBuilder::new();
        let src = b.source("f", ["a"]);
        b.sink(src, "out");
        let wf = b.build().unwrap();

        let policy = Policy::builder().file("f", [("a", true)]).build();
        assert!(verify(&wf, &policy).unwrap().is_allowed());
    }

    #[test]
    fn verifier_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Verifier>();
        assert_send_sync::<Workflow>();
        assert_send_sync::<Policy>();
    }
}
