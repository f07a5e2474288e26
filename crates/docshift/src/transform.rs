//! Per-collection document transforms.
//!
//! A transform maps one source document to zero or one destination
//! documents. Returning `Ok(None)` drops the document; returning an error
//! aborts the collection's job.

use async_trait::async_trait;
use indexmap::IndexMap;
use mongodb::bson::{Bson, Document};
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

use crate::document::bson_eq;

/// Error raised by a transform.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransformError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TransformError {
    /// Creates an error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an error wrapping an underlying cause.
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Outcome of a single transform invocation.
pub type TransformResult = std::result::Result<Option<Document>, TransformError>;

/// Asynchronous document transform.
///
/// Implementations may suspend (I/O, lookups, timers). The job runs several
/// invocations concurrently but always writes their results in source order.
#[async_trait]
pub trait Transform: Send + Sync {
    /// Maps a document to its replacement, or `None` to drop it.
    async fn apply(&self, doc: Document) -> TransformResult;
}

/// [`Transform`] backed by an async closure. Built with [`transform_fn`].
pub struct FnTransform<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> Transform for FnTransform<F>
where
    F: Fn(Document) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = TransformResult> + Send + 'static,
{
    async fn apply(&self, doc: Document) -> TransformResult {
        (self.f)(doc).await
    }
}

/// Wraps an async closure into a shareable transform.
///
/// ```rust
/// use docshift::transform::{transform_fn, TransformResult};
/// use mongodb::bson::Bson;
///
/// let shout = transform_fn(|mut doc| async move {
///     if let Some(Bson::String(name)) = doc.get_mut("name") {
///         *name = name.to_uppercase();
///     }
///     TransformResult::Ok(Some(doc))
/// });
/// # let _ = shout;
/// ```
pub fn transform_fn<F, Fut>(f: F) -> Arc<dyn Transform>
where
    F: Fn(Document) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = TransformResult> + Send + 'static,
{
    Arc::new(FnTransform { f })
}

/// Declarative field-level transform, configurable from YAML.
///
/// Steps run in this order: `skip_when`, `rename`, `set`, `unset`, `append`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldTransform {
    /// Drop documents whose fields all equal these values.
    pub skip_when: IndexMap<String, Bson>,
    /// Field renames (`from` -> `to`).
    pub rename: IndexMap<String, String>,
    /// Fields to set or overwrite.
    pub set: IndexMap<String, Bson>,
    /// Fields to remove.
    pub unset: Vec<String>,
    /// String suffixes to append to existing string fields.
    pub append: IndexMap<String, String>,
}

impl FieldTransform {
    /// Returns true if the transform changes nothing.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.skip_when.is_empty()
            && self.rename.is_empty()
            && self.set.is_empty()
            && self.unset.is_empty()
            && self.append.is_empty()
    }

    fn should_skip(&self, doc: &Document) -> bool {
        !self.skip_when.is_empty()
            && self
                .skip_when
                .iter()
                .all(|(field, expected)| doc.get(field).is_some_and(|v| bson_eq(v, expected)))
    }

    /// Applies the transform synchronously.
    pub fn apply_to(&self, mut doc: Document) -> TransformResult {
        if self.should_skip(&doc) {
            return Ok(None);
        }

        for (from, to) in &self.rename {
            if let Some(value) = doc.remove(from) {
                doc.insert(to.clone(), value);
            }
        }

        for (field, value) in &self.set {
            doc.insert(field.clone(), value.clone());
        }

        for field in &self.unset {
            doc.remove(field);
        }

        for (field, suffix) in &self.append {
            match doc.get_mut(field) {
                Some(Bson::String(s)) => s.push_str(suffix),
                Some(other) => {
                    return Err(TransformError::new(format!(
                        "cannot append to field '{}' of type {:?}",
                        field,
                        other.element_type()
                    )))
                }
                None => {
                    return Err(TransformError::new(format!(
                        "cannot append to missing field '{}'",
                        field
                    )))
                }
            }
        }

        Ok(Some(doc))
    }
}

#[async_trait]
impl Transform for FieldTransform {
    async fn apply(&self, doc: Document) -> TransformResult {
        self.apply_to(doc)
    }
}
