use std::sync::PoisonError;
use thiserror::Error;

use crate::database::DatabaseError;

/// Error raised by a key-value storage backend
#[derive(Error, Debug)]
pub enum StorageError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLite error
    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// The backend refused the write (quota, read-only medium, injected failure)
    #[error("Write rejected: {0}")]
    WriteRejected(String),

    /// The backend could not be read
    #[error("Read failed: {0}")]
    ReadFailed(String),

    /// Lock error
    #[error("Lock error: {0}")]
    Lock(String),
}

impl<T> From<PoisonError<T>> for StorageError {
    fn from(error: PoisonError<T>) -> Self {
        StorageError::Lock(error.to_string())
    }
}

/// Error type for record store operations
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Underlying storage failed; the operation did not take effect
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Snapshot could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A persisted entry exists but cannot be decoded
    #[error("Persisted entry '{key}' is corrupt: {reason}")]
    Corrupt {
        /// Storage key of the entry
        key: String,
        /// Decoder message
        reason: String,
    },

    /// Lock error
    #[error("Lock error: {0}")]
    Lock(String),
}

impl<T> From<PoisonError<T>> for RepositoryError {
    fn from(error: PoisonError<T>) -> Self {
        RepositoryError::Lock(error.to_string())
    }
}
