//! Connection references for MongoDB endpoints.
//!
//! A run either reuses a database handle the caller already holds or opens
//! one from a connection string. Resolution happens once, before the
//! pipeline starts.

use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use std::fmt;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Application name reported to the server when none is set in the URI.
const APP_NAME: &str = "docshift";

/// Where a store gets its database handle from.
#[derive(Clone)]
pub enum ConnectionRef {
    /// A live handle owned by the caller.
    AlreadyOpen(Database),
    /// A connection string to open.
    NeedsOpen {
        /// MongoDB connection string.
        uri: String,
        /// Database name; `None` uses the URI's default database.
        database: Option<String>,
    },
}

impl ConnectionRef {
    /// Creates a reference that will be opened from `uri`.
    pub fn needs_open(uri: impl Into<String>, database: Option<String>) -> Self {
        Self::NeedsOpen {
            uri: uri.into(),
            database,
        }
    }

    /// Resolves the reference to a database handle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the URI cannot be parsed, the client
    /// cannot be built, or no database name is available.
    pub async fn resolve(self) -> Result<Database> {
        match self {
            Self::AlreadyOpen(db) => {
                debug!("Reusing open database handle '{}'", db.name());
                Ok(db)
            }
            Self::NeedsOpen { uri, database } => {
                let mut options = ClientOptions::parse(&uri)
                    .await
                    .map_err(|e| Error::Connection(format!("invalid connection string: {}", e)))?;
                if options.app_name.is_none() {
                    options.app_name = Some(APP_NAME.to_string());
                }

                let client = Client::with_options(options)
                    .map_err(|e| Error::Connection(format!("failed to create client: {}", e)))?;

                let db = match database {
                    Some(name) => client.database(&name),
                    None => client.default_database().ok_or_else(|| {
                        Error::Connection(
                            "no database given and the connection string has no default"
                                .to_string(),
                        )
                    })?,
                };
                info!("Connected to database '{}'", db.name());
                Ok(db)
            }
        }
    }
}

impl fmt::Debug for ConnectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyOpen(db) => f.debug_tuple("AlreadyOpen").field(&db.name()).finish(),
            Self::NeedsOpen { database, .. } => f
                .debug_struct("NeedsOpen")
                .field("uri", &"<redacted>")
                .field("database", database)
                .finish(),
        }
    }
}
