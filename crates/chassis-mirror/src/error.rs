//! Error types for mirror store operations.

use thiserror::Error;

/// Result type alias for mirror store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that a mirror store backend can report.
///
/// The in-memory backend never fails, but the trait contract allows durable
/// backends to surface unavailability and transaction conflicts. Absence of
/// a record is never an error; lookups return `Option` instead.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store cannot be reached.
    #[error("Mirror store unavailable: {message}")]
    Unavailable {
        /// Backend-specific detail.
        message: String,
    },

    /// A transaction could not be serialized against a concurrent writer.
    #[error("Mirror store transaction conflict on '{key}': {message}")]
    Conflict {
        /// The record key the conflict occurred on.
        key: String,
        /// Backend-specific detail.
        message: String,
    },
}

impl StoreError {
    /// Creates an unavailable-store error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates a transaction conflict error.
    pub fn conflict(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conflict {
            key: key.into(),
            message: message.into(),
        }
    }
}
