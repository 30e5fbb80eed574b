//! Output formatting for the admission command line

use anyhow::Result;
use dogma_ir::Workflow;
use dogma_verify::Verdict;
use serde::Serialize;

/// Text (`Display`) or pretty JSON
pub(crate) fn verdict(verdict: &Verdict, json: bool) -> Result<String> {
    if json {
        Ok(serde_json::to_string_pretty(verdict)?)
    } else {
        Ok(verdict.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct ValidationSummary {
    pub(crate) nodes: usize,
    pub(crate) edges: usize,
    pub(crate) sources: usize,
    pub(crate) sinks: usize,
    pub(crate) order: usize,
}

impl ValidationSummary {
    pub(crate) fn of(workflow: &Workflow) -> Self {
        Self {
            nodes: workflow.node_count(),
            edges: workflow.edge_count(),
            sources: workflow.sources().len(),
            sinks: workflow.sinks().len(),
            order: workflow.topological_order().len(),
        }
    }
}

pub(crate) fn summary(summary: &ValidationSummary, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(summary)?);
    }
    Ok(format!(
        "VALID: {} nodes, {} edges, {} sources, {} sinks, topological order of {}",
        summary.nodes, summary.edges, summary.sources, summary.sinks, summary.order
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dogma_test_utils::{filter_on_b_project_a, project_a, readme_policy};
    use dogma_verify::Verifier;
    use pretty_assertions::assert_eq;

    #[test]
    fn allow_renders_plainly() {
        let (workflow, _) = project_a();
        let v = Verifier::new().verify(&workflow, &readme_policy()).unwrap();
        assert_eq!(verdict(&v, false).unwrap(), "ALLOW");
        assert_eq!(verdict(&v, true).unwrap(), "{\n  \"verdict\": \"ALLOW\"\n}");
    }

    #[test]
    fn deny_json_lists_findings() {
        let (workflow, _) = filter_on_b_project_a();
        let v = Verifier::new().verify(&workflow, &readme_policy()).unwrap();

        let value: serde_json::Value = serde_json::from_str(&verdict(&v, true).unwrap()).unwrap();
        assert_eq!(value["verdict"], "DENY");
        assert_eq!(value["findings"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn summary_text() {
        let (workflow, _) = filter_on_b_project_a();
        let s = ValidationSummary::of(&workflow);
        assert_eq!(
            summary(&s, false).unwrap(),
            "VALID: 5 nodes, 5 edges, 1 sources, 1 sinks, topological order of 5"
        );
    }
}
