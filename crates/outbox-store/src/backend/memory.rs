//! In-memory key-value backend
//!
//! Suitable for testing and for hosts that only need the eviction logic
//! without durability. Optional byte quota and failure switches let tests
//! drive every backend failure mode.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::trace;

use outbox_core::{BackendError, KeyValueBackend};

/// In-memory implementation of [`KeyValueBackend`]
///
/// Uses `DashMap` for concurrent access to stored values.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    /// Stored values by key
    entries: DashMap<String, String>,
    /// Maximum total bytes (keys plus values) across all entries
    quota_bytes: Option<usize>,
    /// When set, every read fails
    fail_reads: AtomicBool,
    /// When set, every write and remove fails
    fail_writes: AtomicBool,
    /// Number of successful `set` calls
    writes: AtomicUsize,
}

impl MemoryBackend {
    /// Create an empty backend with no quota
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty backend that rejects writes beyond `bytes` in total
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            quota_bytes: Some(bytes),
            ..Self::default()
        }
    }

    /// Make subsequent reads fail (or succeed again)
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent writes and removes fail (or succeed again)
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Stored value for `key`, bypassing failure injection
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|v| v.value().clone())
    }

    /// Store a value directly, bypassing quota and failure injection
    pub fn insert_raw(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Number of successful writes so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is stored
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn used_bytes_excluding(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.key() != key)
            .map(|entry| entry.key().len() + entry.value().len())
            .sum()
    }
}

#[async_trait]
impl KeyValueBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(BackendError::unavailable("injected read failure"));
        }
        Ok(self.raw(key))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), BackendError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BackendError::unavailable("injected write failure"));
        }

        if let Some(quota) = self.quota_bytes {
            let needed = self.used_bytes_excluding(key) + key.len() + value.len();
            if needed > quota {
                trace!(key = %key, needed, quota, "Write rejected by quota");
                return Err(BackendError::QuotaExceeded);
            }
        }

        self.entries.insert(key.to_string(), value);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), BackendError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BackendError::unavailable("injected remove failure"));
        }
        self.entries.remove(key);
        Ok(())
    }
}
