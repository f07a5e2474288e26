//! Tests for the in-memory store.

use super::*;
use futures::StreamExt;
use mongodb::bson::{doc, Bson};

fn seeded() -> MemoryStore {
    let store = MemoryStore::new();
    store
        .insert_many(
            "customers",
            [
                doc! { "userId": 1, "_id": 1, "name": "bob" },
                doc! { "userId": 1, "_id": 2, "name": "rob" },
                doc! { "userId": 2, "_id": 3, "name": "li" },
            ],
        )
        .unwrap();
    store
}

#[test]
fn test_insert_many_rejects_duplicate() {
    let store = seeded();
    let err = store
        .insert_many("customers", [doc! { "_id": 2, "name": "again" }])
        .unwrap_err();
    assert!(matches!(err, Error::Conflict { .. }));
    assert_eq!(store.count("customers"), 3);
}

#[test]
fn test_insert_generates_missing_id() {
    let store = MemoryStore::new();
    store
        .insert_many("notes", [doc! { "text": "a" }, doc! { "text": "b" }])
        .unwrap();
    let docs = store.documents("notes");
    assert_eq!(docs.len(), 2);
    assert!(docs.iter().all(|d| d.get_object_id("_id").is_ok()));
}

#[test]
fn test_duplicate_detection_is_numeric_aware() {
    let store = MemoryStore::new();
    store.insert_many("c", [doc! { "_id": 1 }]).unwrap();
    assert!(store.insert_many("c", [doc! { "_id": 1_i64 }]).is_err());
}

#[test]
fn test_large_int64_ids_stay_distinct() {
    let store = MemoryStore::new();
    store
        .insert_many("c", [doc! { "_id": 9_007_199_254_740_992_i64 }])
        .unwrap();
    store
        .insert_many("c", [doc! { "_id": 9_007_199_254_740_993_i64 }])
        .unwrap();
    assert_eq!(store.count("c"), 2);
    assert!(store
        .insert_many("c", [doc! { "_id": 9_007_199_254_740_993_i64 }])
        .is_err());
}

#[test]
fn test_subdocument_ids_compare_in_field_order() {
    let store = MemoryStore::new();
    store
        .insert_many("c", [doc! { "_id": { "a": 1, "b": 2 } }])
        .unwrap();
    store
        .insert_many("c", [doc! { "_id": { "b": 2, "a": 1 } }])
        .unwrap();
    assert_eq!(store.count("c"), 2);
    let err = store
        .insert_many("c", [doc! { "_id": { "a": 1_i64, "b": 2.0 } }])
        .unwrap_err();
    assert!(matches!(err, Error::Conflict { .. }));
}

#[tokio::test]
async fn test_dropped_collection_forgets_ids() {
    let store = MemoryStore::new();
    store.insert_many("c", [doc! { "_id": 1 }]).unwrap();
    store.drop_collection("c");
    let writer = store.collection("c").await.unwrap();
    assert_eq!(writer.insert(doc! { "_id": 1 }).await.unwrap(), WriteOutcome::Written);
}

#[test]
fn test_collection_names_and_drop() {
    let store = seeded();
    store.insert_many("countries", [doc! { "_id": 1 }]).unwrap();
    assert_eq!(store.collection_names(), vec!["countries", "customers"]);
    assert!(store.drop_collection("countries"));
    assert!(!store.drop_collection("countries"));
    assert_eq!(store.count("countries"), 0);
}

#[tokio::test]
async fn test_open_streams_matching_documents_in_order() {
    let store = seeded();
    let stream = store
        .open("customers", &doc! { "userId": 1 })
        .await
        .unwrap();
    let docs: Vec<Document> = stream.map(|r| r.unwrap()).collect().await;
    assert_eq!(ids(&docs), vec![Bson::Int32(1), Bson::Int32(2)]);
    assert_eq!(store.opened(), vec!["customers".to_string()]);
}

#[tokio::test]
async fn test_open_unknown_collection_is_empty() {
    let store = MemoryStore::new();
    let stream = store.open("nothing.here", &doc! {}).await.unwrap();
    assert_eq!(stream.count().await, 0);
}

#[tokio::test]
async fn test_open_invalid_path_is_source_unavailable() {
    let store = MemoryStore::new();
    let err = store.open("bad..path", &doc! {}).await.err().unwrap();
    assert!(matches!(err, Error::SourceUnavailable { .. }));
    assert!(store.opened().is_empty());
}

#[tokio::test]
async fn test_open_rejects_unsupported_filter() {
    let store = seeded();
    let err = store
        .open("customers", &doc! { "name": { "$regex": "^b" } })
        .await
        .err()
        .unwrap();
    assert!(matches!(err, Error::Config(_)));
}

#[tokio::test]
async fn test_stream_sees_documents_appended_before_poll() {
    let store = seeded();
    let mut stream = store.open("customers", &doc! {}).await.unwrap();

    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first.get_i32("_id").unwrap(), 1);

    store
        .insert_many("customers", [doc! { "_id": 4, "name": "ann" }])
        .unwrap();
    let rest: Vec<Document> = stream.map(|r| r.unwrap()).collect().await;
    assert_eq!(rest.len(), 3);
}

#[tokio::test]
async fn test_sink_writes_and_reports_conflicts() {
    let store = seeded();
    let writer = store.collection("customers").await.unwrap();

    let outcome = writer.insert(doc! { "_id": 9, "name": "zed" }).await.unwrap();
    assert_eq!(outcome, WriteOutcome::Written);

    let outcome = writer.insert(doc! { "_id": 1, "name": "bob" }).await.unwrap();
    assert_eq!(outcome, WriteOutcome::Conflict(Bson::Int32(1)));
    assert_eq!(store.count("customers"), 4);
}

#[tokio::test]
async fn test_sink_invalid_path_is_destination_unavailable() {
    let store = MemoryStore::new();
    let err = store.collection("").await.err().unwrap();
    assert!(matches!(err, Error::DestinationUnavailable { .. }));
}
