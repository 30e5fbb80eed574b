//! Policy documents
//!
//! One document declares the read permissions of one file:
//!
//! ```json
//! {
//!   "fileName": "people.csv",
//!   "columns": {
//!     "a": {"read": true},
//!     "b": {"read": false}
//!   }
//! }
//! ```
//!
//! Unknown fields are rejected at every level.

use crate::error::PolicyError;
use dogma_ir::{ColumnName, FileId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Permission entry for one column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnGrant {
    /// May the column reach an observable result
    pub read: bool,
}

/// Policy for a single file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PolicyDocument {
    /// File the policy applies to
    pub file_name: FileId,
    /// Per-column grants
    pub columns: BTreeMap<ColumnName, ColumnGrant>,
}

impl PolicyDocument {
    /// Create an empty document for `file` (every column forbidden)
    #[must_use]
    pub fn new(file: impl Into<FileId>) -> Self {
        Self {
            file_name: file.into(),
            columns: BTreeMap::new(),
        }
    }

    /// Add or replace a column grant
    #[must_use]
    pub fn with_column(mut self, column: impl Into<ColumnName>, read: bool) -> Self {
        self.columns.insert(column.into(), ColumnGrant { read });
        self
    }

    /// Parse a JSON document
    ///
    /// # Errors
    /// `InvalidDocument` on malformed JSON or schema mismatch,
    /// `EmptyFileName` if `fileName` is empty.
    pub fn from_json(content: &str) -> Result<Self, PolicyError> {
        let doc: Self =
            serde_json::from_str(content).map_err(|e| PolicyError::invalid(e.to_string()))?;
        doc.validated()
    }

    /// Convert an already-parsed JSON value
    ///
    /// # Errors
    /// Same as [`from_json`](Self::from_json).
    pub fn from_value(value: Value) -> Result<Self, PolicyError> {
        let doc: Self =
            serde_json::from_value(value).map_err(|e| PolicyError::invalid(e.to_string()))?;
        doc.validated()
    }

    /// Read a JSON document from disk
    ///
    /// # Errors
    /// `Io` if the file cannot be read, otherwise as [`from_json`](Self::from_json).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| PolicyError::io_error(path, e))?;
        Self::from_json(&content)
    }

    fn validated(self) -> Result<Self, PolicyError> {
        if self.file_name.is_empty() {
            return Err(PolicyError::EmptyFileName);
        }
        Ok(self)
    }

    /// Declared grant for a column, `None` if the document is silent
    #[must_use]
    pub fn grant(&self, column: &str) -> Option<bool> {
        self.columns.get(column).map(|g| g.read)
    }

    /// Columns explicitly granted `read: true`
    pub fn readable_columns(&self) -> impl Iterator<Item = &ColumnName> {
        self.columns
            .iter()
            .filter(|(_, g)| g.read)
            .map(|(c, _)| c)
    }
}
