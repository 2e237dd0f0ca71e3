//! # Domain Errors
//!
//! Every error in this module is an infrastructure failure. Authorization
//! failures, missing assets and rejected uploads are ordinary procedure
//! outcomes (see `entities`), never errors.

use thiserror::Error;

/// Errors raised by a key-value backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KVStoreError {
    /// Underlying database I/O failed.
    #[error("I/O error: {message}")]
    IOError { message: String },

    /// A stored record could not be decoded.
    #[error("corrupted record under key {key}: {message}")]
    Corruption { key: String, message: String },
}

/// Errors surfaced by the asset store procedures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Key-value backend failure.
    #[error("storage backend error: {0}")]
    Backend(#[from] KVStoreError),

    /// Record could not be encoded for storage.
    #[error("record encoding error: {0}")]
    Encoding(String),

    /// Password hashing or hash parsing failed.
    #[error("credential hashing error: {0}")]
    Credentials(String),

    /// The store has been closed during shutdown.
    #[error("asset store is closed")]
    Closed,

    /// The blocking storage task panicked or was cancelled.
    #[error("storage task failed: {0}")]
    Task(String),

    /// Account management: login rejected by validation.
    #[error("invalid login: {0:?}")]
    InvalidLogin(String),

    /// Account management: no such account.
    #[error("unknown account: {0}")]
    UnknownAccount(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Encoding(e.to_string())
    }
}
