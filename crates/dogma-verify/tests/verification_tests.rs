use dogma_ir::{ColumnName, ColumnRef, DerivedColumn, WorkflowBuilder};
use dogma_policy::{Policy, PolicyDocument};
use dogma_test_utils::{
    filter_on_b_project_a, group_by_b, permissive_policy, project_a, readme_policy, README_FILE,
};
use dogma_verify::{FindingOrigin, Verdict, Verifier, VerifierConfig};
use pretty_assertions::assert_eq;

fn forbidden(file: &str, column: &str) -> ColumnRef {
    ColumnRef::new(file, column)
}

#[test]
fn test_readme_projection_is_allowed() {
    let (workflow, _) = project_a();
    let verdict = Verifier::new().verify(&workflow, &readme_policy()).unwrap();
    assert_eq!(verdict, Verdict::Allow);
}

#[test]
fn test_readme_filter_on_b_is_denied_at_project() {
    let (workflow, fx) = filter_on_b_project_a();
    let verdict = Verifier::new().verify(&workflow, &readme_policy()).unwrap();

    assert!(!verdict.is_allowed());
    let findings = verdict.findings();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].node, fx.observed);
    assert_eq!(findings[0].column, ColumnName::new("a"));
    assert_eq!(findings[0].source, forbidden(README_FILE, "b"));
    assert_eq!(findings[0].origin, FindingOrigin::ObservedOutput);
    assert_eq!(findings[0].observed_by.as_ref().unwrap().node, fx.sink);
}

#[test]
fn test_direct_forwarding_of_forbidden_column() {
    let mut b = WorkflowBuilder::new();
    let src = b.source(README_FILE, ["a", "b", "c"]);
    let proj = b.project(src, ["a", "c"]);
    b.sink(proj, "out");

    let verdict = Verifier::new()
        .verify(&b.build().unwrap(), &readme_policy())
        .unwrap();
    assert_eq!(verdict.forbidden_sources(), vec![&forbidden(README_FILE, "c")]);
}

#[test]
fn test_filter_taints_every_forwarded_column() {
    let mut b = WorkflowBuilder::new();
    let src = b.source("orders", ["id", "amount", "secret"]);
    let cond = b.project(src, ["secret"]);
    let kept = b.filter(src, cond);
    let proj = b.project(kept, ["id", "amount"]);
    b.sink(proj, "out");

    let policy = Policy::builder()
        .file("orders", [("id", true), ("amount", true), ("secret", false)])
        .build();
    let verdict = Verifier::new().verify(&b.build().unwrap(), &policy).unwrap();

    let columns: Vec<_> = verdict.findings().iter().map(|f| f.column.as_str()).collect();
    assert_eq!(columns, vec!["amount", "id"]);
}

#[test]
fn test_join_key_leaks_into_every_output() {
    let mut b = WorkflowBuilder::new();
    let people = b.source("people", ["ssn", "name"]);
    let claims = b.source("claims", ["holder", "amount"]);
    let joined = b.join(people, claims, ["ssn"], ["holder"]);
    let out = b.project(joined, ["name", "amount"]);
    b.sink(out, "out");

    let policy = Policy::builder()
        .file("people", [("ssn", false), ("name", true)])
        .file("claims", [("holder", true), ("amount", true)])
        .build();
    let verdict = Verifier::new().verify(&b.build().unwrap(), &policy).unwrap();

    let columns: Vec<_> = verdict
        .findings()
        .iter()
        .map(|f| (f.column.as_str(), f.source.column.as_str()))
        .collect();
    assert_eq!(columns, vec![("amount", "ssn"), ("name", "ssn")]);
}

#[test]
fn test_join_on_permitted_keys_is_allowed() {
    let mut b = WorkflowBuilder::new();
    let people = b.source("people", ["id", "name"]);
    let claims = b.source("claims", ["holder", "amount"]);
    let joined = b.join(people, claims, ["id"], ["holder"]);
    b.sink(joined, "out");

    let policy = permissive_policy(&[
        ("people", &["id", "name"][..]),
        ("claims", &["holder", "amount"][..]),
    ]);
    assert!(Verifier::new().verify(&b.build().unwrap(), &policy).unwrap().is_allowed());
}

#[test]
fn test_group_by_leaks_into_reduced_outputs() {
    let (workflow, fx) = group_by_b();
    let verdict = Verifier::new().verify(&workflow, &readme_policy()).unwrap();

    let findings = verdict.findings();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].node, fx.observed);
    assert_eq!(findings[0].column, ColumnName::new("n"));
    assert_eq!(findings[0].source, forbidden(README_FILE, "b"));
}

#[test]
fn test_aggregate_over_permitted_group_is_allowed() {
    let mut b = WorkflowBuilder::new();
    let src = b.source(README_FILE, ["a", "b", "c"]);
    let agg = b.aggregate(src, ["a"], [DerivedColumn::constant("rows")]);
    b.sink(agg, "out");

    let verdict = Verifier::new()
        .verify(&b.build().unwrap(), &readme_policy())
        .unwrap();
    assert!(verdict.is_allowed());
}

#[test]
fn test_map_reads_only_declared_columns() {
    let mut b = WorkflowBuilder::new();
    let src = b.source(README_FILE, ["a", "b", "c"]);
    let derived = b.map(
        src,
        [
            DerivedColumn::new("double_a", ["a"]),
            DerivedColumn::constant("one"),
        ],
    );
    b.sink(derived, "out");

    let verdict = Verifier::new()
        .verify(&b.build().unwrap(), &readme_policy())
        .unwrap();
    assert!(verdict.is_allowed());
}

#[test]
fn test_map_over_forbidden_input_is_denied() {
    let mut b = WorkflowBuilder::new();
    let src = b.source(README_FILE, ["a", "b", "c"]);
    let derived = b.map(src, [DerivedColumn::new("mixed", ["a", "c"])]);
    b.sink(derived, "out");

    let verdict = Verifier::new()
        .verify(&b.build().unwrap(), &readme_policy())
        .unwrap();
    assert_eq!(verdict.forbidden_sources(), vec![&forbidden(README_FILE, "c")]);
}

#[test]
fn test_unknown_file_fails_closed() {
    let mut b = WorkflowBuilder::new();
    let src = b.source("undeclared.csv", ["x", "y"]);
    b.sink(src, "out");

    let verdict = Verifier::new()
        .verify(&b.build().unwrap(), &readme_policy())
        .unwrap();
    assert_eq!(
        verdict.forbidden_sources(),
        vec![&forbidden("undeclared.csv", "x"), &forbidden("undeclared.csv", "y")]
    );
}

#[test]
fn test_unknown_column_fails_closed() {
    let mut b = WorkflowBuilder::new();
    let src = b.source(README_FILE, ["a", "d"]);
    b.sink(src, "out");

    let verdict = Verifier::new()
        .verify(&b.build().unwrap(), &readme_policy())
        .unwrap();
    assert_eq!(verdict.forbidden_sources(), vec![&forbidden(README_FILE, "d")]);
}

#[test]
fn test_concat_unions_provenance() {
    let mut b = WorkflowBuilder::new();
    let public = b.source("public", ["v"]);
    let private = b.source("private", ["v"]);
    let both = b.concat([public, private]);
    b.sink(both, "out");

    let policy = Policy::builder()
        .file("public", [("v", true)])
        .file("private", [("v", false)])
        .build();
    let verdict = Verifier::new().verify(&b.build().unwrap(), &policy).unwrap();
    assert_eq!(verdict.forbidden_sources(), vec![&forbidden("private", "v")]);
}

#[test]
fn test_unobserved_source_check_is_configurable() {
    let mut b = WorkflowBuilder::new();
    let src = b.source(README_FILE, ["a"]);
    b.sink(src, "out");
    let audit = b.source(README_FILE, ["b"]);
    let workflow = b.build().unwrap();

    let on = Verifier::new().verify(&workflow, &readme_policy()).unwrap();
    assert_eq!(on.findings().len(), 1);
    assert_eq!(on.findings()[0].node, audit);
    assert_eq!(on.findings()[0].origin, FindingOrigin::UnobservedRead);

    let off = Verifier::with_config(VerifierConfig::new().with_unobserved_sources(false))
        .verify(&workflow, &readme_policy())
        .unwrap();
    assert!(off.is_allowed());
}

#[test]
fn test_source_feeding_only_predicates_is_observed() {
    let mut b = WorkflowBuilder::new();
    let secret = b.source("secret", ["flag"]);
    let public = b.source("public", ["v"]);
    let kept = b.filter(public, secret);
    b.sink(kept, "out");

    let policy = Policy::builder()
        .file("public", [("v", true)])
        .file("secret", [("flag", false)])
        .build();
    let verdict = Verifier::new().verify(&b.build().unwrap(), &policy).unwrap();

    assert_eq!(verdict.findings().len(), 1);
    assert_eq!(verdict.findings()[0].origin, FindingOrigin::ObservedOutput);
    assert_eq!(verdict.findings()[0].node, kept);
}

#[test]
fn test_every_denial_reported_not_just_first() {
    let mut b = WorkflowBuilder::new();
    let src = b.source(README_FILE, ["a", "b", "c"]);
    let first = b.sink(src, "first");
    let proj = b.project(src, ["c"]);
    let second = b.sink(proj, "second");

    let verdict = Verifier::new()
        .verify(&b.build().unwrap(), &readme_policy())
        .unwrap();
    let sinks: Vec<_> = verdict
        .findings()
        .iter()
        .map(|f| f.observed_by.as_ref().unwrap().node)
        .collect();
    assert_eq!(sinks, vec![first, first, second]);
}

#[test]
fn test_same_node_observed_by_two_sinks() {
    let mut b = WorkflowBuilder::new();
    let src = b.source(README_FILE, ["b"]);
    let one = b.sink(src, "one");
    let two = b.sink(src, "two");

    let verdict = Verifier::new()
        .verify(&b.build().unwrap(), &readme_policy())
        .unwrap();
    let sinks: Vec<_> = verdict
        .findings()
        .iter()
        .map(|f| f.observed_by.as_ref().unwrap().node)
        .collect();
    assert_eq!(sinks, vec![one, two]);
}

#[test]
fn test_repeated_runs_are_identical() {
    let (workflow, _) = filter_on_b_project_a();
    let verifier = Verifier::new();
    let policy = readme_policy();

    let first = verifier.verify(&workflow, &policy).unwrap();
    for _ in 0..10 {
        assert_eq!(verifier.verify(&workflow, &policy).unwrap(), first);
    }
}

#[test]
fn test_duplicate_documents_merge_strictest() {
    let (workflow, _) = project_a();
    let policy = Policy::from_documents([
        PolicyDocument::new(README_FILE).with_column("a", true),
        PolicyDocument::new(README_FILE).with_column("a", false),
    ]);

    let verdict = Verifier::new().verify(&workflow, &policy).unwrap();
    assert!(!verdict.is_allowed());
}

#[test]
fn test_verdict_serializes_to_json() {
    let (workflow, fx) = filter_on_b_project_a();
    let verdict = Verifier::new().verify(&workflow, &readme_policy()).unwrap();

    let json = serde_json::to_value(&verdict).unwrap();
    assert_eq!(json["verdict"], "DENY");
    assert_eq!(json["findings"][0]["node"], fx.observed.get());
    assert_eq!(json["findings"][0]["column"], "a");
    assert_eq!(json["findings"][0]["observed_by"]["label"], "report");
    assert_eq!(json["findings"][0]["witness"][0]["op"], "source");
}
