//! Error types for key-value backends

use thiserror::Error;

/// Errors a [`KeyValueBackend`](crate::KeyValueBackend) may report
///
/// The store never propagates these as structural faults: a failed read is
/// treated as "absent" and a failed write as "did not happen".
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// The backend refused the write because it is out of space
    #[error("Storage quota exceeded")]
    QuotaExceeded,

    /// The backend could not be reached or is not usable
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// I/O error while talking to the backend
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::Io(err.to_string())
    }
}

impl BackendError {
    /// Create a new Unavailable error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Create a new I/O error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io(message.into())
    }

    /// Whether this is the quota-exceeded failure mode
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, BackendError::QuotaExceeded)
    }
}
