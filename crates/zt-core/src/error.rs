//! Error taxonomy shared by the timer, manual entry and reporting operations.

use thiserror::Error;

use crate::types::ValidationError;

/// Boxed error from the storage backend.
pub type StorageError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure of a time tracking operation.
///
/// Messages of the caller-facing variants are shown to users verbatim.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Missing or malformed input, detected before any mutation.
    #[error("{0}")]
    Validation(String),

    /// The owner already has a running timer.
    #[error("{0}")]
    Conflict(String),

    /// The entry does not exist or belongs to someone else.
    #[error("{0}")]
    NotFound(String),

    /// The store failed.
    #[error("storage failure: {0}")]
    Storage(#[source] StorageError),
}

impl TrackerError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Wraps a backend error.
    pub fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Storage(Box::new(err))
    }

    /// Returns true for errors caused by the caller rather than the system.
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::Storage(_))
    }
}

impl From<ValidationError> for TrackerError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Result alias for tracker operations.
pub type Result<T> = std::result::Result<T, TrackerError>;
