// Replication tool - pedantic lints relaxed for CLI ergonomics
#![allow(clippy::pedantic)]

//! # docshift
//!
//! `docshift` copies named document collections from one store to another,
//! optionally reshaping each document on the way, and reports how many
//! documents were copied and which ones already existed at the destination.
//!
//! Each collection is streamed through `source -> transform -> sink` with
//! bounded read-ahead. Collections run one after another; the first fatal
//! error stops the run and the caller gets the partial report.
//!
//! ## Stores
//!
//! | Store | Source | Sink | Notes |
//! |-------|--------|------|-------|
//! | MongoDB | ✅ | ✅ | `find` cursors, duplicate keys detected via code 11000 |
//! | Memory | ✅ | ✅ | Tests, benchmarks and previews |
//!
//! ## Quick Start
//!
//! ```bash
//! docshift init --output replication.yaml
//! docshift run --config replication.yaml --dry-run
//! docshift run --config replication.yaml --ignore-duplicates
//! ```
//!
//! ## Library Example
//!
//! ```rust
//! use std::sync::Arc;
//! use docshift::{CollectionPlan, MemoryStore, ReplicationPlan, Replicator, RunOptions};
//! use mongodb::bson::doc;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let source = MemoryStore::new();
//! source.insert_many("products", [doc! { "_id": 1, "name": "apple" }]).unwrap();
//! let destination = MemoryStore::new();
//!
//! let plan = ReplicationPlan::new().collection("products", CollectionPlan::new());
//! let replicator = Replicator::new(
//!     Arc::new(source),
//!     Arc::new(destination.clone()),
//!     plan,
//!     RunOptions::default(),
//! );
//!
//! let report = replicator.run().await.unwrap();
//! assert_eq!(report.get("products").unwrap().copied, 1);
//! assert_eq!(destination.count("products"), 1);
//! # }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod connection;
pub mod document;
pub mod error;
pub mod job;
pub mod plan;
pub mod report;
pub mod run;
pub mod sink;
pub mod source;
pub mod store;
pub mod transform;

pub use config::ReplicationConfig;
pub use connection::ConnectionRef;
pub use document::{DocumentId, Filter};
pub use error::{Error, Result};
pub use job::{CollectionJob, JobState};
pub use plan::{CollectionPlan, ReplicationPlan, RunOptions};
pub use report::{CollectionReport, ReplicationReport};
pub use run::{Replicator, RunFailure};
pub use sink::{CollectionWriter, DocumentSink, SinkWriter, WriteOutcome};
pub use source::{DocumentSource, DocumentStream};
pub use store::{MemoryStore, MongoStore};
pub use transform::{transform_fn, FieldTransform, Transform, TransformError, TransformResult};
