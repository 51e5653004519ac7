//! Error types for outbox-store
//!
//! Only [`StoreError`] reaches callers of the facade, and only from
//! `add_event` and `initialize`. [`CommitError`] describes why a single
//! document write did not happen; the facade resolves it by eviction or
//! recovery.

use thiserror::Error;

use outbox_core::BackendError;

/// Errors surfaced by the store facade
#[derive(Debug, Error)]
pub enum StoreError {
    /// Eviction could not free enough room for the event
    #[error("Unable to free up event space (dropped {dropped} before giving up)")]
    UnableToFreeSpace { dropped: usize },

    /// Configuration cannot be used
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A background task could not be started
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Backend failure
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Error during serialization
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Create a new InvalidConfig error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Why a document write did not happen
#[derive(Debug, Error)]
pub enum CommitError {
    /// Serialized document exceeds the size ceiling; nothing was written
    #[error("Document exceeds maximum size (size: {size}, max: {max})")]
    TooLarge { size: usize, max: usize },

    /// Backend rejected the write
    #[error("Backend write failed: {0}")]
    Backend(#[from] BackendError),

    /// Document could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for CommitError {
    fn from(err: serde_json::Error) -> Self {
        CommitError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unable_to_free_space_message() {
        let err = StoreError::UnableToFreeSpace { dropped: 0 };
        assert!(err.to_string().contains("Unable to free up event space"));
    }

    #[test]
    fn test_backend_conversion() {
        let err: StoreError = BackendError::QuotaExceeded.into();
        assert!(matches!(err, StoreError::Backend(BackendError::QuotaExceeded)));

        let err: CommitError = BackendError::io("disk").into();
        assert!(matches!(err, CommitError::Backend(_)));
    }

    #[test]
    fn test_too_large_message() {
        let err = CommitError::TooLarge { size: 120, max: 100 };
        assert_eq!(
            err.to_string(),
            "Document exceeds maximum size (size: 120, max: 100)"
        );
    }
}
