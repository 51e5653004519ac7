//! Core traits for the outbox store
//!
//! - [`KeyValueBackend`]: The persistence primitive supplied by the host
//! - [`Clock`]: Time abstraction for testability

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use crate::error::BackendError;

/// Key-value persistence primitive
///
/// One value per string key, whole-value reads and writes. The store keeps a
/// single JSON document per namespace key, so implementations never need to
/// support partial updates.
#[async_trait]
pub trait KeyValueBackend: Send + Sync {
    /// Read the value stored under `key`, or `None` if nothing is stored
    async fn get(&self, key: &str) -> Result<Option<String>, BackendError>;

    /// Store `value` under `key`, replacing any previous value
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::QuotaExceeded`] when the backend is out of space.
    async fn set(&self, key: &str, value: String) -> Result<(), BackendError>;

    /// Remove the value stored under `key`; removing a missing key is not an error
    async fn remove(&self, key: &str) -> Result<(), BackendError>;
}

#[async_trait]
impl<T: KeyValueBackend + ?Sized> KeyValueBackend for Arc<T> {
    async fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<(), BackendError> {
        (**self).set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), BackendError> {
        (**self).remove(key).await
    }
}

/// Time abstraction for testability
///
/// Eviction boundaries are computed against this clock rather than the wall
/// clock so tests can pin "now" to an exact millisecond.
pub trait Clock: Send + Sync {
    /// Get the current UTC datetime
    fn now_utc(&self) -> DateTime<Utc>;

    /// Current time as Unix epoch milliseconds
    fn now_millis(&self) -> i64 {
        self.now_utc().timestamp_millis()
    }
}

/// Real clock implementation using system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock whose time only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    /// Create a clock frozen at the given epoch milliseconds
    pub fn new(millis: i64) -> Self {
        Self {
            millis: AtomicI64::new(millis),
        }
    }

    /// Jump to an absolute time
    pub fn set(&self, millis: i64) {
        self.millis.store(millis, Ordering::SeqCst);
    }

    /// Move forward by `delta` milliseconds
    pub fn advance(&self, delta: i64) {
        self.millis.fetch_add(delta, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.now_millis())
            .single()
            .unwrap_or_default()
    }

    fn now_millis(&self) -> i64 {
        self.millis.load(Ordering::SeqCst)
    }
}
