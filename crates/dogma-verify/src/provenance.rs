//! Provenance propagation
//!
//! Computes, for every node and every output column, the set of source
//! columns that causally influence it. Nodes are processed once each, in
//! dependency order, and every result is memoized so shared sub-expressions
//! are never recomputed.
//!
//! Rules (on top of each, the full provenance of every predicate node is
//! added to every output column):
//!
//! | op          | provenance of output column `c`                                    |
//! |-------------|---------------------------------------------------------------------|
//! | `Source`    | `{(file, c)}`                                                       |
//! | `Project`   | input's `c`                                                         |
//! | `Map`       | union of input columns `c` declares it reads                        |
//! | `Filter`    | input's `c` (predicates cover the implicit flow)                    |
//! | `Join`      | own column (merged keys: both sides) ∪ every key column of both sides |
//! | `Aggregate` | reduced columns or own group column, ∪ every group-by column        |
//! | `Concat`    | union of column at the same position in every input                 |
//! | `Sink`      | input's `c`                                                         |

use crate::error::VerifyError;
use dogma_ir::{ColumnName, ColumnRef, Node, NodeId, OpKind, Workflow};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Set of source columns influencing a value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ProvenanceSet(BTreeSet<ColumnRef>);

impl ProvenanceSet {
    /// Empty set (constant-derived value)
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set holding one reference
    #[must_use]
    pub fn singleton(column: ColumnRef) -> Self {
        Self(BTreeSet::from([column]))
    }

    /// Add every reference of `other`
    pub fn absorb(&mut self, other: &ProvenanceSet) {
        self.0.extend(other.0.iter().cloned());
    }

    /// Membership test
    #[inline]
    #[must_use]
    pub fn contains(&self, column: &ColumnRef) -> bool {
        self.0.contains(column)
    }

    /// True for constant-derived values
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of references
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// References in order
    pub fn iter(&self) -> impl Iterator<Item = &ColumnRef> {
        self.0.iter()
    }

    /// True if every reference of `self` is also in `other`
    #[must_use]
    pub fn is_subset(&self, other: &ProvenanceSet) -> bool {
        self.0.is_subset(&other.0)
    }
}

impl FromIterator<ColumnRef> for ProvenanceSet {
    fn from_iter<I: IntoIterator<Item = ColumnRef>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ProvenanceSet {
    type Item = &'a ColumnRef;
    type IntoIter = std::collections::btree_set::Iter<'a, ColumnRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Provenance of every output column of one node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NodeProvenance {
    columns: BTreeMap<ColumnName, ProvenanceSet>,
    #[serde(skip)]
    full: ProvenanceSet,
}

impl NodeProvenance {
    fn new(columns: BTreeMap<ColumnName, ProvenanceSet>) -> Self {
        let mut full = ProvenanceSet::new();
        for set in columns.values() {
            full.absorb(set);
        }
        Self { columns, full }
    }

    /// Provenance of one output column
    #[inline]
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ProvenanceSet> {
        self.columns.get(name)
    }

    /// Union over all output columns
    #[inline]
    #[must_use]
    pub fn full(&self) -> &ProvenanceSet {
        &self.full
    }

    /// Output columns with their provenance, by name
    pub fn columns(&self) -> impl Iterator<Item = (&ColumnName, &ProvenanceSet)> {
        self.columns.iter()
    }
}

/// Immutable provenance facts for a whole workflow
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProvenanceMap {
    nodes: BTreeMap<NodeId, NodeProvenance>,
}

impl ProvenanceMap {
    /// Facts for one node
    #[inline]
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&NodeProvenance> {
        self.nodes.get(&id)
    }

    /// Provenance of `column` at `node`
    #[must_use]
    pub fn column(&self, node: NodeId, column: &str) -> Option<&ProvenanceSet> {
        self.node(node).and_then(|n| n.column(column))
    }

    /// Number of nodes analysed
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if no node was analysed
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Compute provenance for every node of a validated workflow
///
/// # Errors
/// `VerifyError::Internal` only if the workflow violates an invariant that
/// structural validation guarantees.
pub fn propagate(workflow: &Workflow) -> Result<ProvenanceMap, VerifyError> {
    let mut memo: BTreeMap<NodeId, NodeProvenance> = BTreeMap::new();

    for &id in workflow.topological_order() {
        let node = workflow
            .node(id)
            .ok_or_else(|| VerifyError::internal(id, "node in order but not in arena"))?;

        let mut columns = derive_columns(workflow, node, &memo)?;

        let gate = predicate_provenance(node, &memo)?;
        if !gate.is_empty() {
            for set in columns.values_mut() {
                set.absorb(&gate);
            }
        }

        tracing::debug!(
            node = %id,
            op = node.op.name(),
            columns = columns.len(),
            "propagated provenance"
        );
        memo.insert(id, NodeProvenance::new(columns));
    }

    Ok(ProvenanceMap { nodes: memo })
}

fn lookup<'m>(
    memo: &'m BTreeMap<NodeId, NodeProvenance>,
    node: NodeId,
    dep: NodeId,
) -> Result<&'m NodeProvenance, VerifyError> {
    memo.get(&dep)
        .ok_or_else(|| VerifyError::internal(node, format!("dependency {dep} not yet analysed")))
}

fn input<'m>(
    memo: &'m BTreeMap<NodeId, NodeProvenance>,
    node: &Node,
    position: usize,
) -> Result<&'m NodeProvenance, VerifyError> {
    let dep = node
        .inputs
        .get(position)
        .copied()
        .ok_or_else(|| VerifyError::internal(node.id, format!("missing input {position}")))?;
    lookup(memo, node.id, dep)
}

fn column_of<'m>(
    facts: &'m NodeProvenance,
    node: NodeId,
    column: &ColumnName,
) -> Result<&'m ProvenanceSet, VerifyError> {
    facts
        .column(column.as_str())
        .ok_or_else(|| VerifyError::internal(node, format!("input lacks column '{column}'")))
}

/// Union of the provenance of `columns` in `facts`
fn union_of<'c>(
    facts: &NodeProvenance,
    node: NodeId,
    columns: impl IntoIterator<Item = &'c ColumnName>,
) -> Result<ProvenanceSet, VerifyError> {
    let mut set = ProvenanceSet::new();
    for column in columns {
        set.absorb(column_of(facts, node, column)?);
    }
    Ok(set)
}

fn predicate_provenance(
    node: &Node,
    memo: &BTreeMap<NodeId, NodeProvenance>,
) -> Result<ProvenanceSet, VerifyError> {
    let mut gate = ProvenanceSet::new();
    for &pred in &node.predicates {
        gate.absorb(lookup(memo, node.id, pred)?.full());
    }
    Ok(gate)
}

fn forward(facts: &NodeProvenance) -> BTreeMap<ColumnName, ProvenanceSet> {
    facts
        .columns()
        .map(|(name, set)| (name.clone(), set.clone()))
        .collect()
}

/// Per-column provenance from data inputs alone
fn derive_columns(
    workflow: &Workflow,
    node: &Node,
    memo: &BTreeMap<NodeId, NodeProvenance>,
) -> Result<BTreeMap<ColumnName, ProvenanceSet>, VerifyError> {
    let id = node.id;
    let mut out = BTreeMap::new();

    match &node.op {
        OpKind::Source { file, columns } => {
            for column in columns {
                out.insert(
                    column.clone(),
                    ProvenanceSet::singleton(ColumnRef::new(file.clone(), column.clone())),
                );
            }
        }

        OpKind::Project { columns } => {
            let facts = input(memo, node, 0)?;
            for column in columns {
                out.insert(column.clone(), column_of(facts, id, column)?.clone());
            }
        }

        OpKind::Map { outputs } => {
            let facts = input(memo, node, 0)?;
            for derived in outputs {
                out.insert(derived.name.clone(), union_of(facts, id, &derived.from)?);
            }
        }

        OpKind::Filter | OpKind::Sink { .. } => {
            out = forward(input(memo, node, 0)?);
        }

        OpKind::Join {
            left_keys,
            right_keys,
        } => {
            let left = input(memo, node, 0)?;
            let right = input(memo, node, 1)?;

            // matching rows reveals key values of both sides to every column
            let mut keys = union_of(left, id, left_keys)?;
            keys.absorb(&union_of(right, id, right_keys)?);

            for (name, set) in left.columns() {
                let mut own = set.clone();
                if let Some(pos) = left_keys.iter().position(|k| k == name) {
                    let partner = right_keys
                        .get(pos)
                        .ok_or_else(|| VerifyError::internal(id, "join key lists differ in length"))?;
                    own.absorb(column_of(right, id, partner)?);
                }
                own.absorb(&keys);
                out.insert(name.clone(), own);
            }
            for (name, set) in right.columns() {
                if right_keys.contains(name) {
                    continue;
                }
                let mut own = set.clone();
                own.absorb(&keys);
                out.insert(name.clone(), own);
            }
        }

        OpKind::Aggregate {
            group_by,
            aggregates,
        } => {
            let facts = input(memo, node, 0)?;
            let groups = union_of(facts, id, group_by)?;

            for column in group_by {
                out.insert(column.clone(), groups.clone());
            }
            for derived in aggregates {
                let mut set = union_of(facts, id, &derived.from)?;
                set.absorb(&groups);
                out.insert(derived.name.clone(), set);
            }
        }

        OpKind::Concat => {
            let schema = workflow
                .outputs(id)
                .ok_or_else(|| VerifyError::internal(id, "schema not resolved"))?;
            let mut positional = vec![ProvenanceSet::new(); schema.len()];

            for &dep in &node.inputs {
                let dep_schema = workflow
                    .outputs(dep)
                    .ok_or_else(|| VerifyError::internal(id, format!("schema of {dep} not resolved")))?;
                let facts = lookup(memo, id, dep)?;
                for (slot, column) in positional.iter_mut().zip(dep_schema) {
                    slot.absorb(column_of(facts, id, column)?);
                }
            }

            out.extend(schema.iter().cloned().zip(positional));
        }
    }

    Ok(out)
}
