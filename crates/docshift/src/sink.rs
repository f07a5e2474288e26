//! Destination writers and outcome classification.

use async_trait::async_trait;
use mongodb::bson::Document;
use tracing::trace;

use crate::document::{document_id, DocumentId};
use crate::error::Result;

/// Outcome of a non-fatal insert.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
    /// The document was inserted (or would have been, in dry-run mode).
    Written,
    /// A document with this id already exists at the destination.
    Conflict(DocumentId),
}

/// Inserts documents into one resolved destination collection.
#[async_trait]
pub trait CollectionWriter: Send + Sync {
    /// Insert a single document.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FatalWrite`] for any failure other than a
    /// duplicate id, which is reported as [`WriteOutcome::Conflict`].
    async fn insert(&self, doc: Document) -> Result<WriteOutcome>;
}

/// Trait for stores that documents are replicated into.
#[async_trait]
pub trait DocumentSink: Send + Sync {
    /// Get the sink type name.
    fn sink_type(&self) -> &'static str;

    /// Resolve a destination collection.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::DestinationUnavailable`] if the collection path
    /// cannot be resolved.
    async fn collection(&self, name: &str) -> Result<Box<dyn CollectionWriter>>;
}

/// Per-job writer that applies dry-run mode in front of a [`CollectionWriter`].
pub struct SinkWriter {
    writer: Box<dyn CollectionWriter>,
    dry_run: bool,
}

impl SinkWriter {
    /// Creates a writer for one collection.
    #[must_use]
    pub fn new(writer: Box<dyn CollectionWriter>, dry_run: bool) -> Self {
        Self { writer, dry_run }
    }

    /// Returns true if writes are simulated.
    #[must_use]
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Write a document, or pretend to in dry-run mode.
    ///
    /// # Errors
    ///
    /// Propagates fatal errors from the underlying writer.
    pub async fn write(&self, doc: Document) -> Result<WriteOutcome> {
        if self.dry_run {
            trace!("dry run: skipping insert of {}", document_id(&doc));
            return Ok(WriteOutcome::Written);
        }
        self.writer.insert(doc).await
    }
}
