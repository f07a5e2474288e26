//! In-memory document store.
//!
//! [`MemoryStore`] implements both [`DocumentSource`] and [`DocumentSink`],
//! so a single instance can act as either end of a run. Clones share the
//! same data.
//!
//! Collections keep insertion order and enforce unique `_id`s, mirroring
//! the default unique index MongoDB maintains. An unknown but valid
//! collection path reads as empty.
//!
//! # Example
//!
//! ```rust
//! use docshift::store::memory::MemoryStore;
//! use mongodb::bson::doc;
//!
//! let store = MemoryStore::new();
//! store.insert_many("products", [doc! { "_id": 1, "name": "apple" }]).unwrap();
//! assert_eq!(store.count("products"), 1);
//! ```

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use mongodb::bson::{oid::ObjectId, Document};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

use crate::document::{document_id, validate_collection_path, Filter, IdKey, ID_FIELD};
use crate::error::{Error, Result};
use crate::sink::{CollectionWriter, DocumentSink, WriteOutcome};
use crate::source::{DocumentSource, DocumentStream};
use crate::store::filter;

/// Documents in insertion order plus an index of their ids.
#[derive(Debug, Default)]
struct Collection {
    docs: Vec<Document>,
    ids: HashSet<IdKey>,
}

type Collections = HashMap<String, Collection>;

/// Shared in-memory collections.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<Collections>>,
    opened: Arc<Mutex<Vec<String>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts documents, failing on the first duplicate id.
    ///
    /// Documents without `_id` get a fresh `ObjectId`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DestinationUnavailable`] for an invalid path and
    /// [`Error::Conflict`] when an id already exists.
    pub fn insert_many(
        &self,
        collection: &str,
        docs: impl IntoIterator<Item = Document>,
    ) -> Result<usize> {
        validate_collection_path(collection).map_err(|reason| Error::DestinationUnavailable {
            collection: collection.to_string(),
            reason,
        })?;

        let mut inserted = 0;
        for doc in docs {
            if let WriteOutcome::Conflict(id) = self.insert_one(collection, doc) {
                return Err(Error::Conflict {
                    collection: collection.to_string(),
                    id,
                });
            }
            inserted += 1;
        }
        Ok(inserted)
    }

    fn insert_one(&self, collection: &str, mut doc: Document) -> WriteOutcome {
        if !doc.contains_key(ID_FIELD) {
            doc.insert(ID_FIELD, ObjectId::new());
        }
        let id = document_id(&doc);

        let mut collections = self.collections.write();
        let entry = collections.entry(collection.to_string()).or_default();
        if !entry.ids.insert(IdKey::new(&id)) {
            return WriteOutcome::Conflict(id);
        }
        entry.docs.push(doc);
        WriteOutcome::Written
    }

    /// Returns a copy of a collection's documents in insertion order.
    #[must_use]
    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.collections
            .read()
            .get(collection)
            .map(|c| c.docs.clone())
            .unwrap_or_default()
    }

    /// Number of documents in a collection.
    #[must_use]
    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map_or(0, |c| c.docs.len())
    }

    /// Names of collections that hold at least one document, sorted.
    #[must_use]
    pub fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .collections
            .read()
            .iter()
            .filter(|(_, c)| !c.docs.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Removes a collection. Returns true if it existed.
    pub fn drop_collection(&self, collection: &str) -> bool {
        self.collections.write().remove(collection).is_some()
    }

    /// Collections opened as a source, in call order.
    #[must_use]
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().clone()
    }

    /// Finds the next document at or after `position` that matches `filter`.
    fn next_match(
        &self,
        collection: &str,
        filter: &Filter,
        position: usize,
    ) -> Option<(usize, Document)> {
        let collections = self.collections.read();
        let docs = &collections.get(collection)?.docs;
        docs.iter()
            .enumerate()
            .skip(position)
            .find(|(_, d)| filter::matches(d, filter))
            .map(|(i, d)| (i, d.clone()))
    }
}

#[async_trait]
impl DocumentSource for MemoryStore {
    fn source_type(&self) -> &'static str {
        "memory"
    }

    async fn open(&self, collection: &str, filter: &Filter) -> Result<DocumentStream> {
        validate_collection_path(collection).map_err(|reason| Error::SourceUnavailable {
            collection: collection.to_string(),
            reason,
        })?;
        filter::check_supported(filter).map_err(|reason| {
            Error::Config(format!("filter for '{}': {}", collection, reason))
        })?;

        self.opened.lock().push(collection.to_string());
        debug!("memory: opened {} with filter {}", collection, filter);

        let store = self.clone();
        let collection = collection.to_string();
        let filter = filter.clone();

        // Each poll re-locks and scans forward from the last position, so
        // nothing is read ahead of the consumer.
        let stream = stream::unfold(0usize, move |position| {
            let next = store.next_match(&collection, &filter, position);
            async move { next.map(|(index, doc)| (Ok(doc), index + 1)) }
        });

        Ok(stream.boxed())
    }
}

/// Writer for one in-memory collection.
struct MemoryWriter {
    store: MemoryStore,
    collection: String,
}

#[async_trait]
impl CollectionWriter for MemoryWriter {
    async fn insert(&self, doc: Document) -> Result<WriteOutcome> {
        Ok(self.store.insert_one(&self.collection, doc))
    }
}

#[async_trait]
impl DocumentSink for MemoryStore {
    fn sink_type(&self) -> &'static str {
        "memory"
    }

    async fn collection(&self, name: &str) -> Result<Box<dyn CollectionWriter>> {
        validate_collection_path(name).map_err(|reason| Error::DestinationUnavailable {
            collection: name.to_string(),
            reason,
        })?;
        Ok(Box::new(MemoryWriter {
            store: self.clone(),
            collection: name.to_string(),
        }))
    }
}

/// Returns the id of each document as stored.
#[cfg(test)]
pub(crate) fn ids(docs: &[Document]) -> Vec<mongodb::bson::Bson> {
    docs.iter().map(document_id).collect()
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
