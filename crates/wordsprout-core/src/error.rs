//! # Errors
//!
//! Error taxonomy for the core.
//!
//! `CoreError` is what service callers see. `StoreError` is what a `Store`
//! implementation reports; it is wrapped into `CoreError::Store`.

use thiserror::Error;

/// Errors surfaced by the engine and the companion service.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed or out-of-range input (bad date, negative count, bad name).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Missing or invalid credentials or session.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The entity does not exist or is not visible to the caller.
    #[error("not found: {0}")]
    NotFound(String),

    /// A uniqueness constraint would be violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A password could not be hashed.
    #[error("credential error: {0}")]
    Credentials(String),

    /// The underlying store failed. Persisted state is unchanged.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl CoreError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub(crate) fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

/// Errors reported by store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// redb database could not be created or opened.
    #[error("database error: {0}")]
    Database(#[from] redb::DatabaseError),

    /// redb transaction could not be started.
    #[error("transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    /// redb table could not be opened.
    #[error("table error: {0}")]
    Table(#[from] redb::TableError),

    /// redb read or write failed.
    #[error("storage error: {0}")]
    Storage(#[from] redb::StorageError),

    /// redb commit failed.
    #[error("commit error: {0}")]
    Commit(#[from] redb::CommitError),

    /// A record could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] postcard::Error),

    /// A lock guarding in-memory state was poisoned by a panicking writer.
    #[error("lock poisoned: {0}")]
    Poisoned(&'static str),
}

/// Convenience alias for core results.
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
