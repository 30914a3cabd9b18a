//! Unified error types for offgrid.
//!
//! Display strings carry a stable code prefix so hosts can match on them.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for the offgrid engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request could not be sent or its response could not be received.
    #[error("NETWORK_FAILURE: {0}")]
    NetworkFailure(String),

    /// A lookup, write or delete on a bucket failed.
    #[error("STORE_FAILURE: {0}")]
    StoreFailure(String),

    /// Database operation failed.
    #[error("STORE_FAILURE: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("STORE_FAILURE: migration failed: {0}")]
    MigrationFailed(String),

    /// One or more precache resources could not be fetched or stored.
    #[error("POPULATE_FAILURE: {} of {total} resources failed: {}", .failed.len(), .failed.join(", "))]
    PopulateFailure { failed: Vec<String>, total: usize },

    /// Both the primary path and its fallback failed.
    #[error("UNAVAILABLE: {url}: {primary}; fallback: {fallback}")]
    Unavailable { url: String, primary: String, fallback: String },

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Invalid input parameters (e.g., an empty method).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// A lifecycle event arrived in a state that cannot accept it.
    #[error("INVALID_STATE: {0}")]
    InvalidState(String),
}

impl Error {
    /// True for failures that originate in the network transport.
    pub fn is_network(&self) -> bool {
        matches!(self, Error::NetworkFailure(_))
    }

    /// True for failures that originate in the persistent store.
    pub fn is_store(&self) -> bool {
        matches!(self, Error::StoreFailure(_) | Error::Database(_) | Error::MigrationFailed(_))
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::StoreFailure(format!("corrupt headers: {err}"))
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let code = match &err {
            Error::InvalidInput(_) => -32602,
            Error::NetworkFailure(_) => -32000,
            Error::Unavailable { .. } => -32001,
            Error::StoreFailure(_) | Error::Database(_) | Error::MigrationFailed(_) => -32002,
            Error::InvalidUrl(_) => -32003,
            Error::PopulateFailure { .. } => -32004,
            Error::InvalidState(_) => -32005,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}
