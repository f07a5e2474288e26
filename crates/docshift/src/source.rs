//! Document sources.
//!
//! A source turns a collection path and a filter into a lazy stream of
//! documents. Streams are pull-based: nothing is read until the job polls,
//! which is how the pipeline applies backpressure.

use async_trait::async_trait;
use futures::stream::BoxStream;
use mongodb::bson::Document;

use crate::document::Filter;
use crate::error::Result;

/// Lazy, ordered stream of documents read from one collection.
pub type DocumentStream = BoxStream<'static, Result<Document>>;

/// Trait for stores that documents are replicated from.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Get the source type name.
    fn source_type(&self) -> &'static str;

    /// Open a stream over the documents of `collection` matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::SourceUnavailable`] if the collection path
    /// cannot be resolved.
    async fn open(&self, collection: &str, filter: &Filter) -> Result<DocumentStream>;
}
