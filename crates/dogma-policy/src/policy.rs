//! Policy model
//!
//! [`ColumnPolicy`] is the only interface the verifier consults. [`Policy`] is
//! the standard implementation: the union of per-file documents with a
//! fail-closed default for anything not explicitly granted.

use crate::document::PolicyDocument;
use dogma_ir::{ColumnName, ColumnRef, FileId};
use serde::Serialize;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// Read-permission query
///
/// Implementations must be fail-closed: an unknown file or column is
/// forbidden.
pub trait ColumnPolicy {
    /// May `file.column` reach an externally observable result
    fn permission(&self, file: &FileId, column: &ColumnName) -> bool;

    /// [`permission`](Self::permission) for a column reference
    fn permits(&self, column: &ColumnRef) -> bool {
        self.permission(&column.file, &column.column)
    }
}

impl<T: ColumnPolicy + ?Sized> ColumnPolicy for &T {
    fn permission(&self, file: &FileId, column: &ColumnName) -> bool {
        (**self).permission(file, column)
    }
}

impl<T: ColumnPolicy + ?Sized> ColumnPolicy for Box<T> {
    fn permission(&self, file: &FileId, column: &ColumnName) -> bool {
        (**self).permission(file, column)
    }
}

/// Union of per-file column grants
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Policy {
    files: BTreeMap<FileId, BTreeMap<ColumnName, bool>>,
}

impl Policy {
    /// Policy that grants nothing
    #[must_use]
    pub fn deny_all() -> Self {
        Self::default()
    }

    /// Start a programmatic policy
    #[must_use]
    pub fn builder() -> PolicyBuilder {
        PolicyBuilder::default()
    }

    /// Union of documents
    ///
    /// Documents for distinct files are independent. When several documents
    /// name the same file, the strictest wins: a column stays readable only
    /// if every one of those documents grants it.
    #[must_use]
    pub fn from_documents(documents: impl IntoIterator<Item = PolicyDocument>) -> Self {
        let mut policy = Self::default();
        for doc in documents {
            policy.add_document(doc);
        }
        policy
    }

    /// Merge one more document into the union
    pub fn add_document(&mut self, doc: PolicyDocument) {
        let incoming: BTreeMap<ColumnName, bool> = doc
            .columns
            .into_iter()
            .map(|(column, grant)| (column, grant.read))
            .collect();

        match self.files.entry(doc.file_name) {
            Entry::Vacant(slot) => {
                slot.insert(incoming);
            }
            Entry::Occupied(mut slot) => {
                tracing::warn!(
                    file = %slot.key(),
                    "multiple policy documents for one file; keeping the strictest grants"
                );
                let existing = slot.get_mut();
                let mut merged = BTreeMap::new();
                for column in existing.keys().chain(incoming.keys()) {
                    let read = existing.get(column).copied().unwrap_or(false)
                        && incoming.get(column).copied().unwrap_or(false);
                    merged.insert(column.clone(), read);
                }
                *existing = merged;
            }
        }
    }

    /// True if the policy declares anything about `file`
    #[must_use]
    pub fn covers(&self, file: &FileId) -> bool {
        self.files.contains_key(file)
    }

    /// Files with at least one declaration
    pub fn files(&self) -> impl Iterator<Item = &FileId> {
        self.files.keys()
    }

    /// Number of files declared
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

impl ColumnPolicy for Policy {
    fn permission(&self, file: &FileId, column: &ColumnName) -> bool {
        self.files
            .get(file)
            .and_then(|columns| columns.get(column))
            .copied()
            .unwrap_or(false)
    }
}

impl FromIterator<PolicyDocument> for Policy {
    fn from_iter<I: IntoIterator<Item = PolicyDocument>>(iter: I) -> Self {
        Self::from_documents(iter)
    }
}

/// Builder for [`Policy`]
#[derive(Debug, Clone, Default)]
pub struct PolicyBuilder {
    documents: Vec<PolicyDocument>,
}

impl PolicyBuilder {
    /// Declare grants for `file`
    #[must_use]
    pub fn file<I, C>(mut self, file: impl Into<FileId>, grants: I) -> Self
    where
        I: IntoIterator<Item = (C, bool)>,
        C: Into<ColumnName>,
    {
        let doc = grants
            .into_iter()
            .fold(PolicyDocument::new(file), |doc, (column, read)| {
                doc.with_column(column, read)
            });
        self.documents.push(doc);
        self
    }

    /// Add a parsed document
    #[must_use]
    pub fn document(mut self, doc: PolicyDocument) -> Self {
        self.documents.push(doc);
        self
    }

    /// Finish the union
    #[must_use]
    pub fn build(self) -> Policy {
        Policy::from_documents(self.documents)
    }
}
