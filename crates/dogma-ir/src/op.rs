//! Operation kinds
//!
//! The set of operations is closed: every analysis matches on [`OpKind`]
//! exhaustively, so a new variant cannot be added without revisiting each
//! propagation rule.

use crate::id::{ColumnName, FileId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An output column computed from a declared subset of input columns
///
/// Used by `Map` (pure per-row function) and `Aggregate` (reduction).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DerivedColumn {
    /// Output column name
    pub name: ColumnName,
    /// Input columns the value is computed from
    #[serde(default)]
    pub from: Vec<ColumnName>,
}

impl DerivedColumn {
    /// Create derived column `name` computed from `from`
    #[must_use]
    pub fn new<I, C>(name: impl Into<ColumnName>, from: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ColumnName>,
    {
        Self {
            name: name.into(),
            from: from.into_iter().map(Into::into).collect(),
        }
    }

    /// Constant-valued column (reads nothing)
    #[must_use]
    pub fn constant(name: impl Into<ColumnName>) -> Self {
        Self {
            name: name.into(),
            from: Vec::new(),
        }
    }
}

/// Operation performed by a node
///
/// Decoding rejects fields the operation does not declare, so a misspelled
/// key can never silently drop part of a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", from = "OpDocument")]
pub enum OpKind {
    /// Read every declared column of `file`
    Source {
        /// File being read
        file: FileId,
        /// Declared columns of the file
        columns: Vec<ColumnName>,
    },

    /// Forward a subset of the input's columns unchanged
    Project {
        /// Columns kept, in output order
        columns: Vec<ColumnName>,
    },

    /// Compute each output column from declared input columns
    Map {
        /// Output columns and what they read
        outputs: Vec<DerivedColumn>,
    },

    /// Keep the rows of the input selected by the predicate nodes
    Filter,

    /// Equi-join of two inputs on aligned key lists
    Join {
        /// Key columns of the left input
        left_keys: Vec<ColumnName>,
        /// Key columns of the right input, aligned with `left_keys`
        right_keys: Vec<ColumnName>,
    },

    /// Group rows and reduce columns per group
    Aggregate {
        /// Grouping columns, forwarded to the output
        #[serde(default)]
        group_by: Vec<ColumnName>,
        /// Reduced output columns
        #[serde(default)]
        aggregates: Vec<DerivedColumn>,
    },

    /// Row-wise union of inputs with positionally aligned columns
    Concat,

    /// Externally observable workflow result
    Sink {
        /// Human-readable name of the output
        label: String,
    },
}

/// Wire form of [`OpKind`]: every variant is a struct with closed fields
#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
enum OpDocument {
    Source {
        file: FileId,
        columns: Vec<ColumnName>,
    },
    Project {
        columns: Vec<ColumnName>,
    },
    Map {
        outputs: Vec<DerivedColumn>,
    },
    Filter {},
    Join {
        left_keys: Vec<ColumnName>,
        right_keys: Vec<ColumnName>,
    },
    Aggregate {
        #[serde(default)]
        group_by: Vec<ColumnName>,
        #[serde(default)]
        aggregates: Vec<DerivedColumn>,
    },
    Concat {},
    Sink {
        label: String,
    },
}

impl From<OpDocument> for OpKind {
    fn from(doc: OpDocument) -> Self {
        match doc {
            OpDocument::Source { file, columns } => Self::Source { file, columns },
            OpDocument::Project { columns } => Self::Project { columns },
            OpDocument::Map { outputs } => Self::Map { outputs },
            OpDocument::Filter {} => Self::Filter,
            OpDocument::Join {
                left_keys,
                right_keys,
            } => Self::Join {
                left_keys,
                right_keys,
            },
            OpDocument::Aggregate {
                group_by,
                aggregates,
            } => Self::Aggregate {
                group_by,
                aggregates,
            },
            OpDocument::Concat {} => Self::Concat,
            OpDocument::Sink { label } => Self::Sink { label },
        }
    }
}

impl OpKind {
    /// Short lowercase name of the operation
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Source { .. } => "source",
            Self::Project { .. } => "project",
            Self::Map { .. } => "map",
            Self::Filter => "filter",
            Self::Join { .. } => "join",
            Self::Aggregate { .. } => "aggregate",
            Self::Concat => "concat",
            Self::Sink { .. } => "sink",
        }
    }

    /// Number of data inputs the operation accepts
    #[must_use]
    pub const fn arity(&self) -> Arity {
        match self {
            Self::Source { .. } => Arity::Exactly(0),
            Self::Project { .. }
            | Self::Map { .. }
            | Self::Filter
            | Self::Aggregate { .. }
            | Self::Sink { .. } => Arity::Exactly(1),
            Self::Join { .. } => Arity::Exactly(2),
            Self::Concat => Arity::AtLeast(1),
        }
    }

    /// True for `Source`
    #[inline]
    #[must_use]
    pub const fn is_source(&self) -> bool {
        matches!(self, Self::Source { .. })
    }

    /// True for `Sink`
    #[inline]
    #[must_use]
    pub const fn is_sink(&self) -> bool {
        matches!(self, Self::Sink { .. })
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepted input count of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly `n` inputs
    Exactly(usize),
    /// At least `n` inputs
    AtLeast(usize),
}

impl Arity {
    /// Check an input count against this arity
    #[inline]
    #[must_use]
    pub const fn accepts(self, count: usize) -> bool {
        match self {
            Self::Exactly(n) => count == n,
            Self::AtLeast(n) => count >= n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exactly(n) => write!(f, "exactly {n}"),
            Self::AtLeast(n) => write!(f, "at least {n}"),
        }
    }
}

/// How a dependency feeds the node that uses it
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Data input
    Input,
    /// Condition gating execution or row selection
    Predicate,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => f.write_str("input"),
            Self::Predicate => f.write_str("predicate"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arity_per_kind() {
        let source = OpKind::Source {
            file: FileId::new("f"),
            columns: vec![ColumnName::new("a")],
        };
        assert_eq!(source.arity(), Arity::Exactly(0));
        assert_eq!(OpKind::Filter.arity(), Arity::Exactly(1));
        assert_eq!(OpKind::Concat.arity(), Arity::AtLeast(1));
        assert!(OpKind::Concat.arity().accepts(3));
        assert!(!OpKind::Sink { label: "out".into() }.arity().accepts(0));
    }

    #[test]
    fn op_kind_json_shape() {
        let op: OpKind = serde_json::from_str(
            r#"{"kind": "map", "outputs": [{"name": "total", "from": ["a", "b"]}]}"#,
        )
        .unwrap();
        assert_eq!(
            op,
            OpKind::Map {
                outputs: vec![DerivedColumn::new("total", ["a", "b"])]
            }
        );

        let filter: OpKind = serde_json::from_str(r#"{"kind": "filter"}"#).unwrap();
        assert_eq!(filter, OpKind::Filter);
    }

    #[test]
    fn unknown_kind_rejected() {
        let result: Result<OpKind, _> = serde_json::from_str(r#"{"kind": "shuffle"}"#);
        assert!(result.is_err());
    }
}
