//! Replication report.
//!
//! The report is owned by the run and lent to one job at a time. Entries are
//! kept in the order collections were started; a collection that was never
//! started has no entry.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::document::DocumentId;

/// Counts for a single collection.
///
/// The serialized form omits `duplicates` when zero and `duplicateIds` when
/// empty, so a clean collection reports as `{"copied": N}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionReport {
    /// Documents written (or that would have been, in dry-run mode).
    pub copied: u64,
    /// Documents rejected because their id already existed.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub duplicates: u64,
    /// Ids of rejected documents, in source read order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub duplicate_ids: Vec<DocumentId>,
}

fn is_zero(n: &u64) -> bool {
    *n == 0
}

impl CollectionReport {
    /// Creates a report for a collection where `copied` documents were written.
    #[must_use]
    pub fn copied(copied: u64) -> Self {
        Self {
            copied,
            ..Self::default()
        }
    }

    /// Records a successful write.
    pub fn record_copied(&mut self) {
        self.copied += 1;
    }

    /// Records a duplicate-key conflict.
    pub fn record_duplicate(&mut self, id: DocumentId) {
        self.duplicates += 1;
        self.duplicate_ids.push(id);
    }

    /// Documents that reached the sink writer.
    #[must_use]
    pub fn processed(&self) -> u64 {
        self.copied + self.duplicates
    }
}

/// Per-collection results of a run, keyed by collection name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReplicationReport {
    collections: IndexMap<String, CollectionReport>,
}

impl ReplicationReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a fresh entry for a collection that is about to be replicated.
    ///
    /// An existing entry with the same name is reset.
    pub fn start(&mut self, collection: &str) -> &mut CollectionReport {
        let entry = self.collections.entry(collection.to_string()).or_default();
        *entry = CollectionReport::default();
        entry
    }

    /// Returns the entry for a collection.
    #[must_use]
    pub fn get(&self, collection: &str) -> Option<&CollectionReport> {
        self.collections.get(collection)
    }

    /// Iterates entries in the order collections were started.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CollectionReport)> {
        self.collections.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of collections that were started.
    #[must_use]
    pub fn len(&self) -> usize {
        self.collections.len()
    }

    /// Returns true if no collection was started.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    /// Sum of `copied` over all collections.
    #[must_use]
    pub fn total_copied(&self) -> u64 {
        self.collections.values().map(|c| c.copied).sum()
    }

    /// Sum of `duplicates` over all collections.
    #[must_use]
    pub fn total_duplicates(&self) -> u64 {
        self.collections.values().map(|c| c.duplicates).sum()
    }
}

impl<S: Into<String>> FromIterator<(S, CollectionReport)> for ReplicationReport {
    fn from_iter<I: IntoIterator<Item = (S, CollectionReport)>>(iter: I) -> Self {
        Self {
            collections: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
