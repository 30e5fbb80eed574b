//! Verdicts and findings

use crate::witness::WitnessPath;
use dogma_ir::{ColumnName, ColumnRef, NodeId};
use serde::Serialize;
use std::fmt;

/// Why a finding was raised
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingOrigin {
    /// Forbidden influence reaches a sink
    ObservedOutput,
    /// A source no sink depends on reads a forbidden column
    UnobservedRead,
}

impl fmt::Display for FindingOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ObservedOutput => f.write_str("observed output"),
            Self::UnobservedRead => f.write_str("unobserved read"),
        }
    }
}

/// Sink through which a finding becomes externally visible
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SinkRef {
    /// Sink node
    pub node: NodeId,
    /// Sink label
    pub label: String,
}

/// One forbidden reference reaching one output column
///
/// Field order is the report order: node, column, source, sink, origin.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Finding {
    /// Node the finding is located at
    pub node: NodeId,
    /// Output column of `node` carrying the forbidden influence
    pub column: ColumnName,
    /// Forbidden source column
    pub source: ColumnRef,
    /// Sink observing `node` (absent for unobserved reads)
    pub observed_by: Option<SinkRef>,
    /// Why the finding was raised
    pub origin: FindingOrigin,
    /// Dependency chain from the supplying source to `node`
    pub witness: WitnessPath,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} column '{}' depends on forbidden {}",
            self.node, self.column, self.source
        )?;
        match &self.observed_by {
            Some(sink) => write!(f, " (observed by sink {} '{}')", sink.node, sink.label)?,
            None => write!(f, " ({})", self.origin)?,
        }
        if !self.witness.is_empty() {
            write!(f, "\n    witness: {}", self.witness)?;
        }
        Ok(())
    }
}

/// Admission decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "UPPERCASE")]
pub enum Verdict {
    /// No forbidden column can reach an observable result
    Allow,
    /// Every forbidden flow found, in report order
    Deny {
        /// Sorted, deduplicated findings
        findings: Vec<Finding>,
    },
}

impl Verdict {
    /// `Allow` for no findings, otherwise `Deny` with sorted, unique findings
    #[must_use]
    pub fn from_findings(mut findings: Vec<Finding>) -> Self {
        if findings.is_empty() {
            return Self::Allow;
        }
        findings.sort();
        findings.dedup();
        Self::Deny { findings }
    }

    /// True for `Allow`
    #[inline]
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Findings (empty for `Allow`)
    #[must_use]
    pub fn findings(&self) -> &[Finding] {
        match self {
            Self::Allow => &[],
            Self::Deny { findings } => findings,
        }
    }

    /// Distinct forbidden source columns cited by the findings
    #[must_use]
    pub fn forbidden_sources(&self) -> Vec<&ColumnRef> {
        let mut sources: Vec<_> = self.findings().iter().map(|f| &f.source).collect();
        sources.sort_unstable();
        sources.dedup();
        sources
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => f.write_str("ALLOW"),
            Self::Deny { findings } => {
                write!(f, "DENY ({} finding", findings.len())?;
                if findings.len() != 1 {
                    f.write_str("s")?;
                }
                f.write_str(")")?;
                for finding in findings {
                    write!(f, "\n  - {finding}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn finding(node: u32, column: &str, file: &str, source: &str) -> Finding {
        Finding {
            node: NodeId(node),
            column: ColumnName::new(column),
            source: ColumnRef::new(file, source),
            observed_by: Some(SinkRef {
                node: NodeId(9),
                label: "out".into(),
            }),
            origin: FindingOrigin::ObservedOutput,
            witness: WitnessPath::empty(),
        }
    }

    #[test]
    fn empty_is_allow() {
        assert!(Verdict::from_findings(vec![]).is_allowed());
        assert_eq!(Verdict::Allow.to_string(), "ALLOW");
    }

    #[test]
    fn findings_sorted_and_deduplicated() {
        let verdict = Verdict::from_findings(vec![
            finding(3, "a", "f", "b"),
            finding(1, "z", "f", "b"),
            finding(3, "a", "f", "b"),
            finding(1, "a", "f", "c"),
            finding(1, "a", "f", "b"),
        ]);

        let keys: Vec<_> = verdict
            .findings()
            .iter()
            .map(|f| (f.node.get(), f.column.as_str(), f.source.column.as_str()))
            .collect();
        assert_eq!(keys, vec![(1, "a", "b"), (1, "a", "c"), (1, "z", "b"), (3, "a", "b")]);
        assert_eq!(verdict.forbidden_sources().len(), 2);
    }

    #[test]
    fn renders_text() {
        let verdict = Verdict::from_findings(vec![finding(2, "a", "people.csv", "b")]);
        assert_eq!(
            verdict.to_string(),
            "DENY (1 finding)\n  - n2 column 'a' depends on forbidden people.csv.b (observed by sink n9 'out')"
        );
    }

    #[test]
    fn serializes_tagged() {
        let json = serde_json::to_value(Verdict::from_findings(vec![finding(2, "a", "f", "b")])).unwrap();
        assert_eq!(json["verdict"], "DENY");
        assert_eq!(json["findings"][0]["node"], 2);
        assert_eq!(json["findings"][0]["source"]["file"], "f");
        assert_eq!(json["findings"][0]["origin"], "observed_output");

        let allow = serde_json::to_value(Verdict::Allow).unwrap();
        assert_eq!(allow, serde_json::json!({"verdict": "ALLOW"}));
    }
}
