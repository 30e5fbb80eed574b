//! Access checking
//!
//! Consults a [`ColumnPolicy`] for every source column that can influence an
//! externally observable result.

use crate::error::VerifyError;
use crate::provenance::ProvenanceMap;
use crate::verdict::{Finding, FindingOrigin, SinkRef};
use crate::witness::{find_witness, WitnessPath};
use dogma_ir::{ColumnRef, NodeId, OpKind, Workflow};
use dogma_policy::ColumnPolicy;

/// Finds every forbidden flow in one analysed workflow
pub struct AccessChecker<'a, P: ?Sized> {
    workflow: &'a Workflow,
    provenance: &'a ProvenanceMap,
    policy: &'a P,
    check_unobserved_sources: bool,
    collect_witnesses: bool,
}

impl<'a, P: ColumnPolicy + ?Sized> AccessChecker<'a, P> {
    /// Create checker with both sink and unobserved-source checks enabled
    #[must_use]
    pub fn new(workflow: &'a Workflow, provenance: &'a ProvenanceMap, policy: &'a P) -> Self {
        Self {
            workflow,
            provenance,
            policy,
            check_unobserved_sources: true,
            collect_witnesses: true,
        }
    }

    /// Toggle the unobserved-source check
    #[must_use]
    pub fn unobserved_sources(mut self, enabled: bool) -> Self {
        self.check_unobserved_sources = enabled;
        self
    }

    /// Toggle witness computation
    #[must_use]
    pub fn witnesses(mut self, enabled: bool) -> Self {
        self.collect_witnesses = enabled;
        self
    }

    /// All findings, unsorted
    ///
    /// # Errors
    /// `VerifyError::Internal` if a sink or source has no provenance entry.
    pub fn findings(&self) -> Result<Vec<Finding>, VerifyError> {
        let mut findings = Vec::new();
        for sink in self.workflow.sinks() {
            self.check_sink(sink, &mut findings)?;
        }
        if self.check_unobserved_sources {
            self.check_unobserved(&mut findings)?;
        }
        Ok(findings)
    }

    fn witness(&self, node: NodeId, source: &ColumnRef) -> WitnessPath {
        if self.collect_witnesses {
            find_witness(self.workflow, self.provenance, node, source)
        } else {
            WitnessPath::empty()
        }
    }

    fn check_sink(&self, sink: NodeId, findings: &mut Vec<Finding>) -> Result<(), VerifyError> {
        let node = self
            .workflow
            .node(sink)
            .ok_or_else(|| VerifyError::internal(sink, "sink not in workflow"))?;
        let OpKind::Sink { label } = &node.op else {
            return Err(VerifyError::internal(sink, "not a sink"));
        };
        let observed = node
            .inputs
            .first()
            .copied()
            .ok_or_else(|| VerifyError::internal(sink, "sink without input"))?;

        let sink_facts = self
            .provenance
            .node(sink)
            .ok_or_else(|| VerifyError::internal(sink, "no provenance"))?;
        let observed_facts = self
            .provenance
            .node(observed)
            .ok_or_else(|| VerifyError::internal(observed, "no provenance"))?;

        let observed_by = SinkRef {
            node: sink,
            label: label.clone(),
        };

        for (column, set) in sink_facts.columns() {
            let upstream = observed_facts.column(column.as_str());
            for source in set {
                if self.policy.permits(source) {
                    continue;
                }
                // only the sink's own predicates can add influence here
                let at = if upstream.is_some_and(|s| s.contains(source)) {
                    observed
                } else {
                    sink
                };
                tracing::debug!(node = %at, column = %column, source = %source, "forbidden flow");
                findings.push(Finding {
                    node: at,
                    column: column.clone(),
                    source: source.clone(),
                    observed_by: Some(observed_by.clone()),
                    origin: FindingOrigin::ObservedOutput,
                    witness: self.witness(at, source),
                });
            }
        }
        Ok(())
    }

    fn check_unobserved(&self, findings: &mut Vec<Finding>) -> Result<(), VerifyError> {
        let observable = self.workflow.observable_nodes();

        for source in self.workflow.sources() {
            if observable.binary_search(&source).is_ok() {
                continue;
            }
            let facts = self
                .provenance
                .node(source)
                .ok_or_else(|| VerifyError::internal(source, "no provenance"))?;
            let Some(OpKind::Source { file, columns }) = self.workflow.op(source) else {
                return Err(VerifyError::internal(source, "not a source"));
            };

            for column in columns {
                let read = ColumnRef::new(file.clone(), column.clone());
                if self.policy.permits(&read) {
                    continue;
                }
                // direct reads only; predicates gating the source are not reads
                if !facts.column(column.as_str()).is_some_and(|s| s.contains(&read)) {
                    return Err(VerifyError::internal(source, "source lost its own read"));
                }
                tracing::debug!(node = %source, source = %read, "forbidden unobserved read");
                findings.push(Finding {
                    node: source,
                    column: column.clone(),
                    witness: self.witness(source, &read),
                    source: read,
                    observed_by: None,
                    origin: FindingOrigin::UnobservedRead,
                });
            }
        }
        Ok(())
    }
}
