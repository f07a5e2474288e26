//! MongoDB store.
//!
//! Reads with `find` cursors and writes with `insert_one`. A duplicate-key
//! error (server code 11000) on insert is reported as a conflict; every other
//! write error is fatal.

use async_trait::async_trait;
use futures::StreamExt;
use mongodb::bson::Document;
use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use mongodb::{Collection, Database};
use tracing::debug;

use crate::connection::ConnectionRef;
use crate::document::{document_id, validate_collection_path, Filter};
use crate::error::{Error, Result};
use crate::sink::{CollectionWriter, DocumentSink, WriteOutcome};
use crate::source::{DocumentSource, DocumentStream};

/// Server error code for a unique index violation.
pub const DUPLICATE_KEY_CODE: i32 = 11000;

/// Returns true if a driver error is a duplicate-key violation.
#[must_use]
pub fn is_duplicate_key(err: &MongoError) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_err)) => {
            write_err.code == DUPLICATE_KEY_CODE
        }
        ErrorKind::Command(cmd_err) => cmd_err.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}

/// Source and sink over one MongoDB database.
#[derive(Debug, Clone)]
pub struct MongoStore {
    database: Database,
}

impl MongoStore {
    /// Resolves a connection and wraps the resulting database.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the connection cannot be resolved.
    pub async fn connect(connection: ConnectionRef) -> Result<Self> {
        Ok(Self {
            database: connection.resolve().await?,
        })
    }

    /// Wraps an already open database.
    #[must_use]
    pub fn from_database(database: Database) -> Self {
        Self { database }
    }

    /// The underlying database handle.
    #[must_use]
    pub fn database(&self) -> &Database {
        &self.database
    }

    fn collection_handle(&self, name: &str) -> Collection<Document> {
        self.database.collection::<Document>(name)
    }
}

#[async_trait]
impl DocumentSource for MongoStore {
    fn source_type(&self) -> &'static str {
        "mongodb"
    }

    async fn open(&self, collection: &str, filter: &Filter) -> Result<DocumentStream> {
        validate_collection_path(collection).map_err(|reason| Error::SourceUnavailable {
            collection: collection.to_string(),
            reason,
        })?;

        let cursor = self
            .collection_handle(collection)
            .find(filter.clone())
            .await
            .map_err(|e| Error::SourceUnavailable {
                collection: collection.to_string(),
                reason: e.to_string(),
            })?;
        debug!(
            "mongodb: opened cursor on {}.{} with filter {}",
            self.database.name(),
            collection,
            filter
        );

        let name = collection.to_string();
        Ok(cursor
            .map(move |item| {
                item.map_err(|e| Error::SourceRead {
                    collection: name.clone(),
                    message: e.to_string(),
                })
            })
            .boxed())
    }
}

/// Writer for one MongoDB collection.
struct MongoWriter {
    collection: Collection<Document>,
}

#[async_trait]
impl CollectionWriter for MongoWriter {
    async fn insert(&self, doc: Document) -> Result<WriteOutcome> {
        match self.collection.insert_one(&doc).await {
            Ok(_) => Ok(WriteOutcome::Written),
            Err(e) if is_duplicate_key(&e) => Ok(WriteOutcome::Conflict(document_id(&doc))),
            Err(e) => Err(Error::FatalWrite {
                collection: self.collection.name().to_string(),
                message: e.to_string(),
            }),
        }
    }
}

#[async_trait]
impl DocumentSink for MongoStore {
    fn sink_type(&self) -> &'static str {
        "mongodb"
    }

    async fn collection(&self, name: &str) -> Result<Box<dyn CollectionWriter>> {
        validate_collection_path(name).map_err(|reason| Error::DestinationUnavailable {
            collection: name.to_string(),
            reason,
        })?;
        Ok(Box::new(MongoWriter {
            collection: self.collection_handle(name),
        }))
    }
}
