//! Structural validation
//!
//! Performs every structural check before analysis begins and produces a
//! sealed [`Workflow`]. No analysis ever sees an unvalidated graph.

use crate::error::IrError;
use crate::graph::WorkflowGraph;
use crate::id::{ColumnName, NodeId};
use crate::node::Node;
use crate::op::{EdgeKind, OpKind};
use crate::workflow::Workflow;
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use std::collections::{HashMap, HashSet};

/// Default upper bound on workflow size
pub const DEFAULT_MAX_NODES: usize = 100_000;

/// Limits applied during validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationContext {
    /// Largest accepted node count
    pub max_nodes: usize,
}

impl Default for ValidationContext {
    fn default() -> Self {
        Self {
            max_nodes: DEFAULT_MAX_NODES,
        }
    }
}

/// Structural validator for workflow IR
#[derive(Debug, Clone, Default)]
pub struct StructuralValidator {
    context: ValidationContext,
}

impl StructuralValidator {
    /// Create validator with default limits
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create validator with custom limits
    #[must_use]
    pub fn with_context(context: ValidationContext) -> Self {
        Self { context }
    }

    /// Limits in effect
    #[must_use]
    pub fn context(&self) -> &ValidationContext {
        &self.context
    }

    /// Validate a graph
    ///
    /// 1. Size limit
    /// 2. Unique node ids
    /// 3. References, arity and per-operation shape
    /// 4. Acyclicity over inputs and predicates together
    /// 5. Output schema of every node, in dependency order
    ///
    /// # Errors
    /// The first structural violation found.
    pub fn validate(&self, graph: WorkflowGraph) -> Result<Workflow, IrError> {
        let nodes = graph.nodes;

        if nodes.len() > self.context.max_nodes {
            return Err(IrError::TooManyNodes {
                actual: nodes.len(),
                limit: self.context.max_nodes,
            });
        }

        let slots = index_nodes(&nodes)?;

        for node in &nodes {
            check_references(node, &slots)?;
            check_shape(node)?;
        }

        let order = dependency_order(&nodes)?;
        let schemas = resolve_schemas(&nodes, &slots, &order)?;

        tracing::debug!(
            nodes = nodes.len(),
            "workflow passed structural validation"
        );

        Ok(Workflow::sealed(nodes, slots, schemas, order))
    }
}

fn index_nodes(nodes: &[Node]) -> Result<HashMap<NodeId, usize>, IrError> {
    let mut slots = HashMap::with_capacity(nodes.len());
    for (slot, node) in nodes.iter().enumerate() {
        if slots.insert(node.id, slot).is_some() {
            return Err(IrError::DuplicateNode { node: node.id });
        }
    }
    Ok(slots)
}

fn check_references(node: &Node, slots: &HashMap<NodeId, usize>) -> Result<(), IrError> {
    for (dep, edge) in node.dependencies() {
        if dep == node.id {
            return Err(IrError::SelfReference { node: node.id, edge });
        }
        if !slots.contains_key(&dep) {
            return Err(IrError::DanglingReference {
                node: node.id,
                missing: dep,
                edge,
            });
        }
    }
    Ok(())
}

fn check_shape(node: &Node) -> Result<(), IrError> {
    let arity = node.op.arity();
    if !arity.accepts(node.inputs.len()) {
        return Err(IrError::ArityMismatch {
            node: node.id,
            op: node.op.name(),
            expected: arity,
            actual: node.inputs.len(),
        });
    }

    match &node.op {
        OpKind::Source { file, columns } => {
            if file.is_empty() {
                return Err(IrError::IllFormedSource {
                    node: node.id,
                    reason: "empty file name".to_string(),
                });
            }
            if columns.is_empty() {
                return Err(IrError::IllFormedSource {
                    node: node.id,
                    reason: format!("file '{file}' declares no columns"),
                });
            }
        }
        OpKind::Filter => {
            if node.predicates.is_empty() {
                return Err(IrError::MissingPredicate { node: node.id });
            }
        }
        OpKind::Join {
            left_keys,
            right_keys,
        } => {
            if left_keys.is_empty() || left_keys.len() != right_keys.len() {
                return Err(IrError::JoinKeyMismatch {
                    node: node.id,
                    left: left_keys.len(),
                    right: right_keys.len(),
                });
            }
        }
        OpKind::Project { .. }
        | OpKind::Map { .. }
        | OpKind::Aggregate { .. }
        | OpKind::Concat
        | OpKind::Sink { .. } => {}
    }

    Ok(())
}

fn dependency_order(nodes: &[Node]) -> Result<Vec<NodeId>, IrError> {
    let edge_count = nodes
        .iter()
        .map(|n| n.inputs.len() + n.predicates.len())
        .sum();
    let mut graph: DiGraphMap<NodeId, EdgeKind> = DiGraphMap::with_capacity(nodes.len(), edge_count);

    for node in nodes {
        graph.add_node(node.id);
    }
    for node in nodes {
        for (dep, edge) in node.dependencies() {
            graph.add_edge(dep, node.id, edge);
        }
    }

    toposort(&graph, None).map_err(|cycle| IrError::CycleDetected {
        node: cycle.node_id(),
    })
}

fn resolve_schemas(
    nodes: &[Node],
    slots: &HashMap<NodeId, usize>,
    order: &[NodeId],
) -> Result<Vec<Vec<ColumnName>>, IrError> {
    let mut schemas: Vec<Option<Vec<ColumnName>>> = vec![None; nodes.len()];

    for id in order {
        let slot = slots[id];
        let node = &nodes[slot];

        let mut inputs = Vec::with_capacity(node.inputs.len());
        for dep in &node.inputs {
            let schema = slots
                .get(dep)
                .and_then(|&s| schemas[s].as_deref())
                .ok_or(IrError::DanglingReference {
                    node: node.id,
                    missing: *dep,
                    edge: EdgeKind::Input,
                })?;
            inputs.push(schema);
        }

        let schema = resolve_schema(node, &inputs)?;
        ensure_unique(node.id, &schema)?;
        schemas[slot] = Some(schema);
    }

    Ok(schemas.into_iter().map(Option::unwrap_or_default).collect())
}

/// Output columns of `node` given the schemas of its inputs
fn resolve_schema(node: &Node, inputs: &[&[ColumnName]]) -> Result<Vec<ColumnName>, IrError> {
    let require = |schema: &[ColumnName], column: &ColumnName| {
        if schema.contains(column) {
            Ok(())
        } else {
            Err(IrError::UnknownColumn {
                node: node.id,
                column: column.clone(),
            })
        }
    };

    let schema = match &node.op {
        OpKind::Source { columns, .. } => columns.clone(),
        OpKind::Project { columns } => {
            for column in columns {
                require(inputs[0], column)?;
            }
            columns.clone()
        }
        OpKind::Map { outputs } => {
            for derived in outputs {
                for column in &derived.from {
                    require(inputs[0], column)?;
                }
            }
            outputs.iter().map(|d| d.name.clone()).collect()
        }
        OpKind::Filter | OpKind::Sink { .. } => inputs[0].to_vec(),
        OpKind::Join {
            left_keys,
            right_keys,
        } => {
            let (left, right) = (inputs[0], inputs[1]);
            for key in left_keys {
                require(left, key)?;
            }
            for key in right_keys {
                require(right, key)?;
            }
            let mut out = left.to_vec();
            out.extend(right.iter().filter(|c| !right_keys.contains(c)).cloned());
            out
        }
        OpKind::Aggregate {
            group_by,
            aggregates,
        } => {
            for column in group_by {
                require(inputs[0], column)?;
            }
            for derived in aggregates {
                for column in &derived.from {
                    require(inputs[0], column)?;
                }
            }
            group_by
                .iter()
                .cloned()
                .chain(aggregates.iter().map(|d| d.name.clone()))
                .collect()
        }
        OpKind::Concat => {
            let expected = inputs[0].len();
            for (schema, input) in inputs.iter().zip(&node.inputs).skip(1) {
                if schema.len() != expected {
                    return Err(IrError::ConcatWidthMismatch {
                        node: node.id,
                        input: *input,
                        expected,
                        actual: schema.len(),
                    });
                }
            }
            inputs[0].to_vec()
        }
    };

    Ok(schema)
}

fn ensure_unique(node: NodeId, schema: &[ColumnName]) -> Result<(), IrError> {
    let mut seen = HashSet::with_capacity(schema.len());
    for column in schema {
        if !seen.insert(column) {
            return Err(IrError::DuplicateColumn {
                node,
                column: column.clone(),
            });
        }
    }
    Ok(())
}
