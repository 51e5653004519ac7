//! Read-modify-write of namespace documents against a key-value backend
//!
//! The adapter owns no state besides its collaborators. Every facade
//! operation fetches a fresh copy, mutates it, and commits the whole document
//! back. Backend failures never escape as errors from reads: a failed read is
//! an absent document, an unparsable one is deleted.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use outbox_core::{Clock, KeyValueBackend};

use crate::document::Document;
use crate::error::CommitError;
use crate::event::Event;

/// Result of reading a namespace key
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// Nothing stored, or the backend read failed
    Missing,
    /// Stored bytes were unparsable; the key has been removed
    Corrupted,
    /// A parsed document
    Found(Document),
}

/// Persistent store adapter over a [`KeyValueBackend`]
#[derive(Clone)]
pub struct DocumentStore {
    backend: Arc<dyn KeyValueBackend>,
    clock: Arc<dyn Clock>,
}

impl DocumentStore {
    /// Create an adapter over the given backend and clock
    pub fn new(backend: Arc<dyn KeyValueBackend>, clock: Arc<dyn Clock>) -> Self {
        Self { backend, clock }
    }

    /// The underlying backend
    pub fn backend(&self) -> &Arc<dyn KeyValueBackend> {
        &self.backend
    }

    /// The clock used for access-time stamps
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Read and parse the document stored under `key`
    pub async fn load(&self, key: &str) -> LoadOutcome {
        let raw = match self.backend.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return LoadOutcome::Missing,
            Err(e) => {
                warn!(key = %key, error = %e, "Backend read failed, treating document as absent");
                return LoadOutcome::Missing;
            }
        };

        match Document::from_json(&raw) {
            Ok(Some(doc)) => {
                trace!(key = %key, events = doc.len(), "Loaded document");
                LoadOutcome::Found(doc)
            }
            Ok(None) => LoadOutcome::Missing,
            Err(e) => {
                warn!(key = %key, error = %e, "Stored document is corrupted, removing it");
                if let Err(e) = self.backend.remove(key).await {
                    warn!(key = %key, error = %e, "Failed to remove corrupted document");
                }
                LoadOutcome::Corrupted
            }
        }
    }

    /// Fetch the document under `key`
    ///
    /// With `create_default`, a missing or corrupted document yields a fresh
    /// empty one (not yet persisted); otherwise `None`.
    pub async fn fetch(&self, key: &str, create_default: bool) -> Option<Document> {
        match self.load(key).await {
            LoadOutcome::Found(doc) => Some(doc),
            _ if create_default => Some(Document::new()),
            _ => None,
        }
    }

    /// Write `doc` back under `key`
    ///
    /// Stamps `last_access_time` first when `update_access_time` is set. A
    /// document whose JSON form is longer than `max_size` bytes is rejected
    /// without touching the backend. A document with no events is removed
    /// from the backend instead of written.
    pub async fn commit(
        &self,
        doc: &mut Document,
        key: &str,
        max_size: usize,
        update_access_time: bool,
    ) -> Result<(), CommitError> {
        if update_access_time {
            doc.last_access_time = self.clock.now_millis();
        }

        if doc.is_empty() {
            self.backend.remove(key).await?;
            debug!(key = %key, "Removed empty document");
            return Ok(());
        }

        let json = doc.to_json()?;
        if json.len() > max_size {
            debug!(key = %key, size = json.len(), max = max_size, "Document over size ceiling, not written");
            return Err(CommitError::TooLarge {
                size: json.len(),
                max: max_size,
            });
        }

        let size = json.len();
        self.backend.set(key, json).await?;
        trace!(key = %key, size, events = doc.len(), "Committed document");
        Ok(())
    }

    /// Delete the whole namespace, returning whatever events it still held
    ///
    /// Last-resort recovery when a commit keeps failing for reasons other
    /// than size. A corrupted document yields no events.
    pub async fn purge(&self, key: &str) -> Vec<Event> {
        let mut doc = match self.load(key).await {
            LoadOutcome::Found(doc) => doc,
            LoadOutcome::Missing | LoadOutcome::Corrupted => return Vec::new(),
        };

        let events = doc.take_events();
        if let Err(e) = self.backend.remove(key).await {
            warn!(key = %key, error = %e, "Failed to remove document during purge");
        }
        warn!(key = %key, recovered = events.len(), "Purged namespace");
        events
    }
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore").finish_non_exhaustive()
    }
}
