//! Error types for docshift.
//!
//! Every pipeline failure is fatal for the collection it happens in. The only
//! recoverable condition, a duplicate-key conflict, is reported through
//! [`crate::sink::WriteOutcome::Conflict`] and only becomes an [`Error`] when
//! the run is not ignoring duplicates.

use mongodb::bson::Bson;
use thiserror::Error;

use crate::transform::TransformError;

/// Result type alias for docshift operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while replicating collections.
///
/// Error codes follow the pattern `DS-XXX`.
#[derive(Error, Debug)]
pub enum Error {
    /// The source collection path cannot be resolved (DS-001).
    #[error("[DS-001] Source collection '{collection}' unavailable: {reason}")]
    SourceUnavailable {
        /// Collection path as configured.
        collection: String,
        /// Why resolution failed.
        reason: String,
    },

    /// The destination collection path cannot be resolved (DS-002).
    #[error("[DS-002] Destination collection '{collection}' unavailable: {reason}")]
    DestinationUnavailable {
        /// Collection path as configured.
        collection: String,
        /// Why resolution failed.
        reason: String,
    },

    /// Reading from an open source stream failed (DS-003).
    #[error("[DS-003] Failed to read from source collection '{collection}': {message}")]
    SourceRead {
        /// Collection being read.
        collection: String,
        /// Driver or store message.
        message: String,
    },

    /// A transform rejected a document (DS-004).
    #[error("[DS-004] Transform failed for collection '{collection}': {source}")]
    TransformFailure {
        /// Collection being transformed.
        collection: String,
        /// Error returned by the transform.
        #[source]
        source: TransformError,
    },

    /// A document with the same id already exists at the destination (DS-005).
    #[error("[DS-005] Duplicate document {id} in destination collection '{collection}'")]
    Conflict {
        /// Destination collection.
        collection: String,
        /// Id of the conflicting document.
        id: Bson,
    },

    /// Any other destination write failure (DS-006).
    #[error("[DS-006] Write to destination collection '{collection}' failed: {message}")]
    FatalWrite {
        /// Destination collection.
        collection: String,
        /// Driver or store message.
        message: String,
    },

    /// A connection could not be established (DS-007).
    #[error("[DS-007] Connection error: {0}")]
    Connection(String),

    /// Invalid configuration (DS-008).
    #[error("[DS-008] Configuration error: {0}")]
    Config(String),

    /// IO error (DS-009).
    #[error("[DS-009] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error (DS-010).
    #[error("[DS-010] YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Returns the error code (e.g., "DS-005").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::SourceUnavailable { .. } => "DS-001",
            Self::DestinationUnavailable { .. } => "DS-002",
            Self::SourceRead { .. } => "DS-003",
            Self::TransformFailure { .. } => "DS-004",
            Self::Conflict { .. } => "DS-005",
            Self::FatalWrite { .. } => "DS-006",
            Self::Connection(_) => "DS-007",
            Self::Config(_) => "DS-008",
            Self::Io(_) => "DS-009",
            Self::Yaml(_) => "DS-010",
        }
    }

    /// Returns true for a duplicate-key conflict that was not ignored.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Returns the collection the error belongs to, if any.
    #[must_use]
    pub fn collection(&self) -> Option<&str> {
        match self {
            Self::SourceUnavailable { collection, .. }
            | Self::DestinationUnavailable { collection, .. }
            | Self::SourceRead { collection, .. }
            | Self::TransformFailure { collection, .. }
            | Self::Conflict { collection, .. }
            | Self::FatalWrite { collection, .. } => Some(collection),
            Self::Connection(_) | Self::Config(_) | Self::Io(_) | Self::Yaml(_) => None,
        }
    }
}
