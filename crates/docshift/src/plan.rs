//! What to replicate, and how.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::document::Filter;
use crate::transform::Transform;

/// Default number of documents allowed in the transform stage at once.
pub const DEFAULT_TRANSFORM_WINDOW: usize = 8;

/// Replication settings for one collection.
#[derive(Clone, Default)]
pub struct CollectionPlan {
    /// Documents to read from the source. Empty = all.
    pub filter: Filter,
    /// Optional transform; `None` copies documents unchanged.
    pub transform: Option<Arc<dyn Transform>>,
}

impl CollectionPlan {
    /// Creates a plan that copies every document unchanged.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source filter.
    #[must_use]
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// Sets the transform.
    #[must_use]
    pub fn with_transform(mut self, transform: Arc<dyn Transform>) -> Self {
        self.transform = Some(transform);
        self
    }
}

impl fmt::Debug for CollectionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionPlan")
            .field("filter", &self.filter)
            .field("transform", &self.transform.as_ref().map(|_| "<transform>"))
            .finish()
    }
}

/// Ordered set of collections to replicate.
///
/// Collections run in the order they were added. Adding a name twice
/// replaces its plan but keeps its original position.
#[derive(Debug, Clone, Default)]
pub struct ReplicationPlan {
    collections: IndexMap<String, CollectionPlan>,
}

impl ReplicationPlan {
    /// Creates an empty plan.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a collection (builder style).
    #[must_use]
    pub fn collection(mut self, name: impl Into<String>, plan: CollectionPlan) -> Self {
        self.insert(name, plan);
        self
    }

    /// Adds a collection.
    pub fn insert(&mut self, name: impl Into<String>, plan: CollectionPlan) {
        self.collections.insert(name.into(), plan);
    }

    /// Returns the plan for a collection.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CollectionPlan> {
        self.collections.get(name)
    }

    /// Iterates collections in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CollectionPlan)> {
        self.collections.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Collection names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }

    /// Number of collections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.collections.len()
    }

    /// Returns true if there is nothing to replicate.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }
}

/// Run-wide options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOptions {
    /// Read and transform, but never write to the destination.
    #[serde(default)]
    pub dry_run: bool,
    /// Count duplicate-key conflicts and keep going instead of aborting.
    #[serde(default)]
    pub ignore_duplicates: bool,
    /// Maximum number of documents in the transform stage at once.
    #[serde(default = "default_transform_window")]
    pub transform_window: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            ignore_duplicates: false,
            transform_window: default_transform_window(),
        }
    }
}

fn default_transform_window() -> usize {
    DEFAULT_TRANSFORM_WINDOW
}
