use dogma_ir::{ColumnName, IrError, Node, NodeId, OpKind, WorkflowBuilder, WorkflowGraph};
use proptest::prelude::*;

fn concat(id: u32, inputs: Vec<u32>) -> Node {
    Node::new(NodeId(id), OpKind::Concat, inputs.into_iter().map(NodeId).collect())
}

proptest! {
    #[test]
    fn prop_validated_order_respects_every_edge(
        node_count in 2..20u32,
        edges in proptest::collection::vec((0..20u32, 0..20u32), 0..50)
    ) {
        // node 0 is the only source; every other node concats its inputs
        let mut inputs: Vec<Vec<u32>> = vec![Vec::new(); node_count as usize];
        for (from, to) in edges {
            if from < node_count && to < node_count && to != 0 && from != to {
                inputs[to as usize].push(from);
            }
        }
        let mut nodes = vec![Node::new(
            NodeId(0),
            OpKind::Source { file: "f".into(), columns: vec![ColumnName::new("x")] },
            vec![],
        )];
        for id in 1..node_count {
            let mut deps = inputs[id as usize].clone();
            if deps.is_empty() {
                deps.push(0);
            }
            nodes.push(concat(id, deps));
        }

        match WorkflowGraph::from_nodes(nodes).validate() {
            Ok(workflow) => {
                let order = workflow.topological_order();
                prop_assert_eq!(order.len(), node_count as usize);
                let pos = |id: NodeId| order.iter().position(|&n| n == id).unwrap();
                for node in workflow.nodes() {
                    for &dep in &node.inputs {
                        prop_assert!(pos(dep) < pos(node.id));
                    }
                }
            }
            Err(err) => prop_assert!(matches!(err, IrError::CycleDetected { .. }), "expected CycleDetected, got {:?}", err),
        }
    }
}

#[test]
fn test_rejects_predicate_cycle() {
    let mut b = WorkflowBuilder::new();
    let src = b.source("f", ["x"]);
    let kept = b.filter(src, src);
    // the predicate now depends on the node it gates
    let cond = b.project(kept, ["x"]);
    b.gate(kept, cond).unwrap();

    assert!(matches!(b.build(), Err(IrError::CycleDetected { .. })));
}

#[test]
fn test_json_document_validates_and_keeps_ids() {
    let mut b = WorkflowBuilder::new();
    let src = b.source("people.csv", ["a", "b"]);
    let cond = b.project(src, ["b"]);
    let kept = b.filter(src, cond);
    b.sink(kept, "out");
    let json = b.into_graph().to_json().unwrap();

    let workflow = WorkflowGraph::from_json(&json).unwrap().validate().unwrap();
    assert_eq!(workflow.predicates(kept), &[cond]);
    assert_eq!(workflow.outputs(kept).unwrap().len(), 2);
}

#[test]
fn test_malformed_document() {
    let err = WorkflowGraph::from_json(r#"{"nodes": [{"id": 0, "op": {"kind": "pivot"}}]}"#)
        .unwrap_err();
    assert!(matches!(err, IrError::Malformed(_)));
}

#[test]
fn test_sink_without_input_is_arity_error() {
    let graph = WorkflowGraph::from_nodes(vec![Node::new(
        NodeId(0),
        OpKind::Sink { label: "out".into() },
        vec![],
    )]);
    assert!(matches!(
        graph.validate(),
        Err(IrError::ArityMismatch { node: NodeId(0), .. })
    ));
}
