//! Domain errors.
//!
//! Handlers and `main` use `anyhow`; these are the typed errors that cross
//! the store and cache boundaries.

use mongodb::error::ErrorKind;
use thiserror::Error;

/// Failure to read or write a chat's prefix.
#[derive(Debug, Error)]
pub enum PrefixError {
    /// The database rejected or failed the operation.
    #[error("database error: {0}")]
    Database(#[source] mongodb::error::Error),

    /// The store could not be reached.
    #[error("prefix store unavailable: {0}")]
    Unavailable(String),
}

impl From<mongodb::error::Error> for PrefixError {
    fn from(err: mongodb::error::Error) -> Self {
        match err.kind.as_ref() {
            // No server to talk to, as opposed to a server that said no.
            ErrorKind::Io(_) | ErrorKind::ServerSelection { .. } => Self::Unavailable(err.to_string()),
            _ => Self::Database(err),
        }
    }
}
