//! Integration tests against a real MongoDB server.
//!
//! These tests require an environment variable to be set:
//! - `DOCSHIFT_MONGODB_URI`: connection string of a disposable server
//!
//! Run with: `cargo test -p docshift --test mongodb_test -- --ignored`

#![allow(clippy::pedantic)]

mod common;

use common::*;
use docshift::{
    CollectionWriter, ConnectionRef, DocumentSink, DocumentSource, MongoStore, ReplicationPlan,
    Replicator, RunOptions, WriteOutcome,
};
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use serde_json::json;
use std::env;
use std::sync::Arc;

/// Helper to check if real server tests are enabled
fn mongodb_uri() -> Option<String> {
    env::var("DOCSHIFT_MONGODB_URI").ok()
}

/// Connects to a freshly dropped database.
async fn fresh_store(uri: &str, database: &str) -> MongoStore {
    let store = MongoStore::connect(ConnectionRef::needs_open(uri, Some(database.to_string())))
        .await
        .expect("Failed to connect");
    store.database().drop().await.expect("Failed to drop database");
    store
}

async fn seed(store: &MongoStore, collection: &str, docs: Vec<Document>) {
    store
        .database()
        .collection::<Document>(collection)
        .insert_many(docs)
        .await
        .expect("Failed to seed collection");
}

async fn read_all(store: &MongoStore, collection: &str) -> Vec<Document> {
    store
        .database()
        .collection::<Document>(collection)
        .find(doc! {})
        .sort(doc! { "_id": 1 })
        .await
        .expect("Failed to query")
        .try_collect()
        .await
        .expect("Failed to read cursor")
}

async fn run(
    prod: &MongoStore,
    stage: &MongoStore,
    plan: ReplicationPlan,
    options: RunOptions,
) -> Result<docshift::ReplicationReport, docshift::RunFailure> {
    Replicator::new(Arc::new(prod.clone()), Arc::new(stage.clone()), plan, options)
        .run()
        .await
}

#[tokio::test]
#[ignore] // Run with --ignored flag when DOCSHIFT_MONGODB_URI is set
async fn test_mongodb_full_replication_cycle() {
    let Some(uri) = mongodb_uri() else {
        eprintln!("Skipping: DOCSHIFT_MONGODB_URI not set");
        return;
    };

    let prod = fresh_store(&uri, "docshift_xprod").await;
    let stage = fresh_store(&uri, "docshift_xstage").await;
    seed(&prod, "products", products()).await;
    seed(&prod, "customers", customers()).await;
    seed(&prod, "countries", countries()).await;

    let report = run(&prod, &stage, shop_plan(), RunOptions::default())
        .await
        .expect("First run failed");
    assert_eq!(
        serde_json::to_value(&report).unwrap(),
        json!({
            "products": { "copied": 2 },
            "customers": { "copied": 2 },
            "countries": { "copied": 3 }
        })
    );
    assert_eq!(
        read_all(&stage, "products").await,
        vec![
            doc! { "userId": 1, "_id": 1, "name": "apple xxl" },
            doc! { "userId": 1, "_id": 2, "name": "orange xxl" },
        ]
    );
    assert_eq!(read_all(&stage, "countries").await, countries());

    let ignoring = RunOptions {
        ignore_duplicates: true,
        ..Default::default()
    };
    let report = run(&prod, &stage, shop_plan(), ignoring)
        .await
        .expect("Ignoring run failed");
    assert_eq!(report.total_copied(), 0);
    assert_eq!(
        report.get("countries").unwrap().duplicate_ids,
        vec![Bson::Int32(1), Bson::Int32(2), Bson::Int32(3)]
    );

    let failure = run(&prod, &stage, shop_plan(), RunOptions::default())
        .await
        .expect_err("Duplicate should abort the run");
    assert!(failure.error().is_conflict());
    assert_eq!(
        serde_json::to_value(failure.report()).unwrap(),
        json!({ "products": { "copied": 0, "duplicates": 1, "duplicateIds": [1] } })
    );
}

#[tokio::test]
#[ignore]
async fn test_mongodb_dry_run_writes_nothing() {
    let Some(uri) = mongodb_uri() else {
        return;
    };

    let prod = fresh_store(&uri, "docshift_dry_xprod").await;
    let stage = fresh_store(&uri, "docshift_dry_xstage").await;
    seed(&prod, "countries", countries()).await;

    let options = RunOptions {
        dry_run: true,
        ..Default::default()
    };
    let plan = ReplicationPlan::new().collection("countries", docshift::CollectionPlan::new());
    let report = run(&prod, &stage, plan, options).await.expect("Dry run failed");

    assert_eq!(report.get("countries").unwrap().copied, 3);
    assert!(read_all(&stage, "countries").await.is_empty());
}

#[tokio::test]
#[ignore]
async fn test_mongodb_duplicate_key_is_conflict() {
    let Some(uri) = mongodb_uri() else {
        return;
    };

    let stage = fresh_store(&uri, "docshift_conflict").await;
    let writer = stage.collection("things").await.expect("Failed to resolve");

    let first = writer.insert(doc! { "_id": "a" }).await.expect("Insert failed");
    assert_eq!(first, WriteOutcome::Written);

    let second = writer.insert(doc! { "_id": "a" }).await.expect("Insert failed");
    assert_eq!(second, WriteOutcome::Conflict(Bson::String("a".to_string())));
}

#[tokio::test]
#[ignore]
async fn test_mongodb_source_streams_filtered() {
    let Some(uri) = mongodb_uri() else {
        return;
    };

    let prod = fresh_store(&uri, "docshift_source").await;
    seed(&prod, "customers", customers()).await;

    let docs: Vec<Document> = prod
        .open("customers", &doc! { "userId": 2 })
        .await
        .expect("Failed to open")
        .try_collect()
        .await
        .expect("Failed to read");

    assert_eq!(docs, vec![doc! { "userId": 2, "_id": 3, "name": "li" }]);
}
