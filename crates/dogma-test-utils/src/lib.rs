//! Testing utilities for dogma workspace
//!
//! Shared fixtures: the README policy, its JSON document, and the canonical
//! workflows used across integration tests.

#![allow(missing_docs)]

use dogma_ir::{DerivedColumn, NodeId, Workflow, WorkflowBuilder, WorkflowGraph};
use dogma_policy::{Policy, PolicyDocument};

pub const README_FILE: &str = "people.csv";

pub fn readme_policy_json() -> String {
    serde_json::json!({
        "fileName": README_FILE,
        "columns": {
            "a": {"read": true},
            "b": {"read": false},
            "c": {"read": false}
        }
    })
    .to_string()
}

pub fn readme_document() -> PolicyDocument {
    PolicyDocument::from_json(&readme_policy_json()).unwrap()
}

/// `a` readable, `b` and `c` forbidden
pub fn readme_policy() -> Policy {
    Policy::from_documents([readme_document()])
}

/// Policy granting every listed column of every listed file
pub fn permissive_policy(files: &[(&str, &[&str])]) -> Policy {
    files
        .iter()
        .fold(Policy::builder(), |b, (file, columns)| {
            b.file(*file, columns.iter().map(|c| (*c, true)))
        })
        .build()
}

/// Ids of the interesting nodes of a fixture workflow
#[derive(Debug, Clone, Copy)]
pub struct Fixture {
    pub source: NodeId,
    pub observed: NodeId,
    pub sink: NodeId,
}

/// `Source(people.csv) -> Project([a]) -> Sink`
pub fn project_a() -> (Workflow, Fixture) {
    let mut b = WorkflowBuilder::new();
    let source = b.source(README_FILE, ["a", "b", "c"]);
    let observed = b.project(source, ["a"]);
    let sink = b.sink(observed, "report");
    (b.build().unwrap(), Fixture { source, observed, sink })
}

/// `Source(people.csv) -> Filter(on b) -> Project([a]) -> Sink`
pub fn filter_on_b_project_a() -> (Workflow, Fixture) {
    let mut b = WorkflowBuilder::new();
    let source = b.source(README_FILE, ["a", "b", "c"]);
    let on_b = b.project(source, ["b"]);
    let kept = b.filter(source, on_b);
    let observed = b.project(kept, ["a"]);
    let sink = b.sink(observed, "report");
    (b.build().unwrap(), Fixture { source, observed, sink })
}

/// `Source(people.csv) -> Aggregate(group by b, count(a)) -> Project([n]) -> Sink`
pub fn group_by_b() -> (Workflow, Fixture) {
    let mut b = WorkflowBuilder::new();
    let source = b.source(README_FILE, ["a", "b", "c"]);
    let grouped = b.aggregate(source, ["b"], [DerivedColumn::new("n", ["a"])]);
    let observed = b.project(grouped, ["n"]);
    let sink = b.sink(observed, "counts");
    (b.build().unwrap(), Fixture { source, observed, sink })
}

/// Serialize a builder's graph the way a client would send it
pub fn graph_json(builder: WorkflowBuilder) -> String {
    builder.into_graph().to_json().unwrap()
}

/// Parse an IR document, panicking on malformed JSON
pub fn parse_graph(json: &str) -> WorkflowGraph {
    WorkflowGraph::from_json(json).unwrap()
}
