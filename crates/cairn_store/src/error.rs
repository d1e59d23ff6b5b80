//! Error types for the store crate.

use cairn_model::ModelError;
use rusqlite::ErrorCode;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in record storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Model-level failure (kind mismatch, incomplete record, seal error).
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// A write was rejected by a uniqueness or key constraint.
    ///
    /// Surfaced to the caller as a rejected write, never silently dropped.
    #[error("constraint violation: {message}")]
    Constraint {
        /// Backend description of the violated constraint.
        message: String,
    },

    /// Backend or file-system fault below the mapping layer.
    ///
    /// Not retried here; retry policy belongs to the caller.
    #[error("storage I/O error: {message}")]
    StorageIo {
        /// Description of the fault.
        message: String,
    },

    /// A blob-backed column failed to deserialize.
    ///
    /// Aborts reconstruction of the owning record only; other rows in the
    /// same result set are unaffected.
    #[error("corrupt blob in column \"{column}\": {message}")]
    Codec {
        /// The column whose payload is corrupt.
        column: String,
        /// Description of the decode failure.
        message: String,
    },

    /// Database file backup failed.
    #[error("backup failed: {message}")]
    Backup {
        /// Description of the failure.
        message: String,
    },

    /// The record's schema has not been registered with this store.
    #[error("schema \"{name}\" is not registered with this store")]
    UnregisteredSchema {
        /// Name of the unregistered schema.
        name: String,
    },

    /// Commit or rollback was requested outside a transaction.
    #[error("no open transaction")]
    NoOpenTransaction,
}

impl StoreError {
    /// Creates a storage I/O error.
    pub fn storage_io(message: impl Into<String>) -> Self {
        Self::StorageIo {
            message: message.into(),
        }
    }

    /// Creates a backup error.
    pub fn backup(message: impl Into<String>) -> Self {
        Self::Backup {
            message: message.into(),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(failure, _)
                if failure.code == ErrorCode::ConstraintViolation =>
            {
                Self::Constraint {
                    message: err.to_string(),
                }
            }
            _ => Self::StorageIo {
                message: err.to_string(),
            },
        }
    }
}
