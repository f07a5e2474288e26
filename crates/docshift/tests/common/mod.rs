//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use docshift::{
    transform_fn, CollectionPlan, CollectionWriter, DocumentSink, Error, MemoryStore,
    ReplicationPlan, ReplicationReport, Replicator, Result, RunFailure, RunOptions,
    TransformResult, WriteOutcome,
};
use mongodb::bson::{doc, Bson, Document};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub fn products() -> Vec<Document> {
    vec![
        doc! { "userId": 1, "_id": 1, "name": "apple" },
        doc! { "userId": 1, "_id": 2, "name": "orange" },
    ]
}

pub fn customers() -> Vec<Document> {
    vec![
        doc! { "userId": 1, "_id": 1, "name": "bob" },
        doc! { "userId": 1, "_id": 2, "name": "rob" },
        doc! { "userId": 2, "_id": 3, "name": "li" },
    ]
}

pub fn countries() -> Vec<Document> {
    vec![
        doc! { "_id": 1, "code": "UA" },
        doc! { "_id": 2, "code": "ES" },
        doc! { "_id": 3, "code": "DK" },
    ]
}

/// A production-like store holding products, customers and countries.
pub fn prod() -> MemoryStore {
    let store = MemoryStore::new();
    store.insert_many("products", products()).unwrap();
    store.insert_many("customers", customers()).unwrap();
    store.insert_many("countries", countries()).unwrap();
    store
}

/// Appends to `name` after a short delay.
pub fn append_name(suffix: &'static str) -> CollectionPlan {
    CollectionPlan::new()
        .with_filter(doc! { "userId": 1 })
        .with_transform(transform_fn(move |mut d: Document| async move {
            tokio::time::sleep(Duration::from_millis(1)).await;
            if let Some(Bson::String(name)) = d.get_mut("name") {
                name.push_str(suffix);
            }
            TransformResult::Ok(Some(d))
        }))
}

/// Prefixes `name` synchronously.
pub fn prefix_name(prefix: &'static str) -> CollectionPlan {
    CollectionPlan::new()
        .with_filter(doc! { "userId": 1 })
        .with_transform(transform_fn(move |mut d: Document| async move {
            if let Ok(name) = d.get_str("name") {
                let renamed = format!("{}{}", prefix, name);
                d.insert("name", renamed);
            }
            TransformResult::Ok(Some(d))
        }))
}

/// products (delayed " xxl"), customers ("mr " prefix), countries (as is).
pub fn shop_plan() -> ReplicationPlan {
    ReplicationPlan::new()
        .collection("products", append_name(" xxl"))
        .collection("customers", prefix_name("mr "))
        .collection("countries", CollectionPlan::new())
}

pub async fn replicate(
    from: &MemoryStore,
    to: Arc<dyn DocumentSink>,
    plan: ReplicationPlan,
    options: RunOptions,
) -> std::result::Result<ReplicationReport, RunFailure> {
    Replicator::new(Arc::new(from.clone()), to, plan, options)
        .run()
        .await
}

/// Sink over a [`MemoryStore`] that fails fatally on one collection.
pub struct FailingSink {
    pub inner: MemoryStore,
    pub collection: &'static str,
    /// 1-based write attempt that fails.
    pub fail_on: usize,
    pub attempts: Arc<AtomicUsize>,
}

impl FailingSink {
    pub fn new(inner: MemoryStore, collection: &'static str, fail_on: usize) -> Self {
        Self {
            inner,
            collection,
            fail_on,
            attempts: Arc::new(AtomicUsize::new(0)),
        }
    }
}

struct FailingWriter {
    inner: Box<dyn CollectionWriter>,
    collection: String,
    fail_on: Option<usize>,
    attempts: Arc<AtomicUsize>,
}

#[async_trait]
impl CollectionWriter for FailingWriter {
    async fn insert(&self, doc: Document) -> Result<WriteOutcome> {
        if let Some(fail_on) = self.fail_on {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            if attempt == fail_on {
                return Err(Error::FatalWrite {
                    collection: self.collection.clone(),
                    message: "disk full".to_string(),
                });
            }
        }
        self.inner.insert(doc).await
    }
}

#[async_trait]
impl DocumentSink for FailingSink {
    fn sink_type(&self) -> &'static str {
        "failing"
    }

    async fn collection(&self, name: &str) -> Result<Box<dyn CollectionWriter>> {
        Ok(Box::new(FailingWriter {
            inner: self.inner.collection(name).await?,
            collection: name.to_string(),
            fail_on: (name == self.collection).then_some(self.fail_on),
            attempts: self.attempts.clone(),
        }))
    }
}
