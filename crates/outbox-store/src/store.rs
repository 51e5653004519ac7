//! The offline store facade
//!
//! [`OfflineStore`] is the only entry point a telemetry pipeline uses. It
//! never caches a document between calls: each operation fetches the
//! namespace document, mutates a private copy, and commits the whole thing
//! back before returning. Callers are expected to use one store per
//! namespace; concurrent operations on the same key race and the last
//! writer wins.
//!
//! Only [`OfflineStore::add_event`] can fail. Reads, removals, clears,
//! cleans and teardown degrade to empty results or `false`.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, trace, warn};

use outbox_core::{Clock, KeyValueBackend, SystemClock};

use crate::adapter::{DocumentStore, LoadOutcome};
use crate::config::{ConfigWarning, StoreConfig, StoreSettings};
use crate::document::Document;
use crate::error::{CommitError, StoreError};
use crate::event::Event;
use crate::event_id::EventId;
use crate::eviction::{evict_by_priority, evict_older_than};
use crate::namespace::{endpoint_domain, storage_key};
use crate::notify::{DropNotifier, DropReason};

/// Steps of the add-with-eviction protocol
///
/// `Fetch -> Commit -> (Done | Evict -> Commit ... | Failed)`. The loop ends
/// when a commit succeeds or an eviction pass frees nothing.
#[derive(Debug)]
enum AddStep {
    Fetch,
    Commit(Document),
    Evict(Document, CommitError),
    Done,
    Failed(CommitError),
}

struct StoreInner {
    documents: DocumentStore,
    storage_key: String,
    settings: RwLock<StoreSettings>,
    notifier: Option<Arc<dyn DropNotifier>>,
    config_watch: Mutex<Option<JoinHandle<()>>>,
}

impl StoreInner {
    fn apply_config(&self, config: &StoreConfig) {
        for warning in config.validate() {
            warn!(%warning, "Store configuration warning");
        }
        let settings = config.settings();
        *self.settings.write() = settings;
        debug!(?settings, "Applied store configuration");
    }

    fn notify(&self, count: usize, reason: DropReason) {
        if count == 0 {
            return;
        }
        info!(count, %reason, "Events dropped");
        if let Some(notifier) = &self.notifier {
            notifier.events_dropped(count, reason);
        }
    }
}

impl Drop for StoreInner {
    fn drop(&mut self) {
        if let Some(handle) = self.config_watch.get_mut().take() {
            handle.abort();
        }
    }
}

/// Builder for [`OfflineStore`]
pub struct OfflineStoreBuilder {
    backend: Arc<dyn KeyValueBackend>,
    clock: Arc<dyn Clock>,
    notifier: Option<Arc<dyn DropNotifier>>,
}

impl OfflineStoreBuilder {
    /// Create a builder over the given backend, using the system clock
    pub fn new(backend: Arc<dyn KeyValueBackend>) -> Self {
        Self {
            backend,
            clock: Arc::new(SystemClock),
            notifier: None,
        }
    }

    /// Use a specific clock for ids, access times and age eviction
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Report dropped events to `notifier`
    pub fn notifier(mut self, notifier: Arc<dyn DropNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Derive the namespace and load settings
    ///
    /// When `config.auto_clean` is set and a tokio runtime is available, an
    /// age-based clean is spawned without being awaited.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidConfig`] if the key prefix contains `_`.
    pub fn initialize(
        self,
        config: &StoreConfig,
        endpoint_url: &str,
    ) -> Result<OfflineStore, StoreError> {
        if config
            .validate()
            .contains(&ConfigWarning::PrefixContainsUnderscore)
        {
            return Err(StoreError::invalid_config(
                ConfigWarning::PrefixContainsUnderscore.to_string(),
            ));
        }

        let key = storage_key(&config.storage_key_prefix, endpoint_url);
        let inner = StoreInner {
            documents: DocumentStore::new(self.backend, self.clock),
            storage_key: key,
            settings: RwLock::new(StoreSettings::default()),
            notifier: self.notifier,
            config_watch: Mutex::new(None),
        };
        inner.apply_config(config);

        let store = OfflineStore {
            inner: Arc::new(inner),
        };
        info!(
            key = %store.storage_key(),
            domain = %endpoint_domain(endpoint_url),
            "Offline store initialized"
        );

        if config.auto_clean {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    let cleaner = store.clone();
                    handle.spawn(async move {
                        cleaner.clean().await;
                    });
                }
                Err(_) => warn!("auto_clean requested outside a tokio runtime, skipping"),
            }
        }

        Ok(store)
    }
}

/// Bounded persistent holding area for events awaiting delivery
#[derive(Clone)]
pub struct OfflineStore {
    inner: Arc<StoreInner>,
}

impl OfflineStore {
    /// Start building a store over `backend`
    pub fn builder(backend: Arc<dyn KeyValueBackend>) -> OfflineStoreBuilder {
        OfflineStoreBuilder::new(backend)
    }

    /// Namespace key of this store's document
    pub fn storage_key(&self) -> &str {
        &self.inner.storage_key
    }

    /// Settings currently in effect
    pub fn settings(&self) -> StoreSettings {
        *self.inner.settings.read()
    }

    /// Storage key, size ceiling and retention window, for diagnostics
    pub fn debug_targets(&self) -> (String, usize, Duration) {
        let settings = self.settings();
        (
            self.inner.storage_key.clone(),
            settings.max_size_bytes,
            settings.retention,
        )
    }

    /// All operations are asynchronous; there is no blocking variant
    pub fn supports_sync_requests(&self) -> bool {
        false
    }

    /// Check that the backend answers reads
    pub async fn probe(&self) -> Result<(), StoreError> {
        self.inner
            .documents
            .backend()
            .get(&self.inner.storage_key)
            .await?;
        Ok(())
    }

    /// Replace the settings whenever `updates` publishes a new configuration
    ///
    /// The namespace key is fixed at initialization; a changed prefix is
    /// ignored. The subscription lives until [`teardown`](Self::teardown)
    /// or until the sender is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Runtime`] when called outside a tokio runtime.
    pub fn watch_config(&self, mut updates: watch::Receiver<StoreConfig>) -> Result<(), StoreError> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| StoreError::Runtime(e.to_string()))?;

        let weak: Weak<StoreInner> = Arc::downgrade(&self.inner);
        let task = handle.spawn(async move {
            while updates.changed().await.is_ok() {
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let config = updates.borrow_and_update().clone();
                inner.apply_config(&config);
            }
        });

        if let Some(previous) = self.inner.config_watch.lock().replace(task) {
            previous.abort();
        }
        Ok(())
    }

    /// Persist an event, evicting low-tier events until it fits
    ///
    /// The id is `suggested_id`, else the event's own id, else a generated
    /// one. Binary payloads are stored (and returned) in encoded form.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnableToFreeSpace`] when an eviction pass frees
    /// nothing; the stored document is then unchanged.
    #[instrument(skip_all, fields(key = %self.inner.storage_key))]
    pub async fn add_event(
        &self,
        suggested_id: Option<EventId>,
        mut event: Event,
    ) -> Result<Event, StoreError> {
        let inner = &self.inner;
        let clock = inner.documents.clock().clone();
        let id = suggested_id
            .or_else(|| event.id.take())
            .unwrap_or_else(|| EventId::generate(clock.as_ref()));
        event.id = Some(id.clone());
        let event = event.encoded();

        let settings = self.settings();
        let mut dropped = 0usize;
        let mut step = AddStep::Fetch;

        loop {
            step = match step {
                AddStep::Fetch => {
                    let doc = inner
                        .documents
                        .fetch(&inner.storage_key, true)
                        .await
                        .unwrap_or_default();
                    AddStep::Commit(doc)
                }
                AddStep::Commit(mut doc) => {
                    doc.insert(event.clone());
                    match inner
                        .documents
                        .commit(&mut doc, &inner.storage_key, settings.max_size_bytes, true)
                        .await
                    {
                        Ok(()) => AddStep::Done,
                        Err(e) => AddStep::Evict(doc, e),
                    }
                }
                AddStep::Evict(mut doc, cause) => {
                    doc.remove(&id);
                    let freed =
                        evict_by_priority(settings.max_tier, &mut doc.events, settings.drop_batch);
                    trace!(freed, cause = %cause, "Eviction pass after failed commit");
                    if freed == 0 {
                        AddStep::Failed(cause)
                    } else {
                        dropped += freed;
                        AddStep::Commit(doc)
                    }
                }
                AddStep::Done => {
                    debug!(id = %id, dropped, "Event stored");
                    inner.notify(dropped, DropReason::CleanStorage);
                    return Ok(event);
                }
                AddStep::Failed(cause) => {
                    warn!(id = %id, dropped, error = %cause, "Unable to free space for event");
                    return Err(StoreError::UnableToFreeSpace { dropped });
                }
            };
        }
    }

    /// Up to `limit` stored events (all when `None`), binary payloads decoded
    pub async fn get_all_events(&self, limit: Option<usize>) -> Vec<Event> {
        self.get_events(limit, false).await
    }

    /// The single oldest stored event by id timestamp, for in-order delivery
    pub async fn get_next_batch(&self) -> Vec<Event> {
        self.get_events(Some(1), true).await
    }

    async fn get_events(&self, limit: Option<usize>, ordered: bool) -> Vec<Event> {
        let Some(doc) = self
            .inner
            .documents
            .fetch(&self.inner.storage_key, false)
            .await
        else {
            return Vec::new();
        };

        let mut events: Vec<Event> = doc.events.into_values().collect();
        if ordered {
            events.sort_by(|a, b| (a.timestamp(), &a.id).cmp(&(b.timestamp(), &b.id)));
        }
        if let Some(limit) = limit {
            events.truncate(limit);
        }
        events.into_iter().map(Event::decoded).collect()
    }

    /// Remove the given events from the store
    ///
    /// Returns the events that are no longer stored. If the document cannot
    /// be written back (or was corrupted), the whole namespace is purged so
    /// later writes are not blocked, and whatever it held is returned instead.
    #[instrument(skip_all, fields(key = %self.inner.storage_key, count = events.len()))]
    pub async fn remove_events(&self, events: &[Event]) -> Vec<Event> {
        let inner = &self.inner;
        let mut doc = match inner.documents.load(&inner.storage_key).await {
            LoadOutcome::Found(doc) => doc,
            LoadOutcome::Missing => return events.to_vec(),
            LoadOutcome::Corrupted => return self.purge().await,
        };

        for id in events.iter().filter_map(|e| e.id.as_ref()) {
            doc.remove(id);
        }

        let max_size = self.settings().max_size_bytes;
        match inner
            .documents
            .commit(&mut doc, &inner.storage_key, max_size, true)
            .await
        {
            Ok(()) => events.to_vec(),
            Err(e) => {
                warn!(error = %e, "Commit after removal failed, purging namespace");
                self.purge().await
            }
        }
    }

    async fn purge(&self) -> Vec<Event> {
        self.inner
            .documents
            .purge(&self.inner.storage_key)
            .await
            .into_iter()
            .map(Event::decoded)
            .collect()
    }

    /// Remove and return every stored event
    #[instrument(skip_all, fields(key = %self.inner.storage_key))]
    pub async fn clear(&self) -> Vec<Event> {
        let inner = &self.inner;
        let Some(mut doc) = inner.documents.fetch(&inner.storage_key, false).await else {
            return Vec::new();
        };

        let all = doc.take_events();
        let max_size = self.settings().max_size_bytes;
        if let Err(e) = inner
            .documents
            .commit(&mut doc, &inner.storage_key, max_size, true)
            .await
        {
            warn!(error = %e, "Failed to persist cleared document");
        }
        info!(cleared = all.len(), "Store cleared");
        all.into_iter().map(Event::decoded).collect()
    }

    /// Drop events older than the retention window
    ///
    /// Returns `true` when nothing needed dropping or the trimmed document
    /// was written, `false` when the write failed.
    #[instrument(skip_all, fields(key = %self.inner.storage_key))]
    pub async fn clean(&self) -> bool {
        let inner = &self.inner;
        let Some(mut doc) = inner.documents.fetch(&inner.storage_key, false).await else {
            return true;
        };

        let settings = self.settings();
        let now = inner.documents.clock().now_millis();
        let dropped = evict_older_than(settings.retention, &mut doc.events, settings.drop_batch, now);
        if dropped == 0 {
            return true;
        }

        match inner
            .documents
            .commit(&mut doc, &inner.storage_key, settings.max_size_bytes, true)
            .await
        {
            Ok(()) => {
                inner.notify(dropped, DropReason::MaxInStorageTimeExceeded);
                true
            }
            Err(e) => {
                warn!(error = %e, dropped, "Failed to persist cleaned document");
                false
            }
        }
    }

    /// Mark the document idle and release the configuration subscription
    ///
    /// The document is written back with `lastAccessTime` set to 0. A stored
    /// document without events is deleted instead, like any empty commit.
    #[instrument(skip_all, fields(key = %self.inner.storage_key))]
    pub async fn teardown(&self) {
        let inner = &self.inner;
        if let Some(mut doc) = inner.documents.fetch(&inner.storage_key, false).await {
            doc.last_access_time = 0;
            let max_size = self.settings().max_size_bytes;
            if let Err(e) = inner
                .documents
                .commit(&mut doc, &inner.storage_key, max_size, false)
                .await
            {
                warn!(error = %e, "Failed to reset access time on teardown");
            }
        }

        if let Some(task) = inner.config_watch.lock().take() {
            task.abort();
        }
        info!("Offline store torn down");
    }

    /// Current persisted document, if any
    pub async fn document(&self) -> Option<Document> {
        self.inner
            .documents
            .fetch(&self.inner.storage_key, false)
            .await
    }
}

impl std::fmt::Debug for OfflineStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfflineStore")
            .field("storage_key", &self.inner.storage_key)
            .field("settings", &self.settings())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::event::Payload;
    use outbox_core::ManualClock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const ENDPOINT: &str = "https://www.example.com/v2/track";
    const KEY: &str = "AIOffline_1_example.com";

    #[derive(Default)]
    struct Recorder {
        clean_storage: AtomicUsize,
        max_time: AtomicUsize,
    }

    impl DropNotifier for Recorder {
        fn events_dropped(&self, count: usize, reason: DropReason) {
            match reason {
                DropReason::CleanStorage => self.clean_storage.fetch_add(count, Ordering::SeqCst),
                DropReason::MaxInStorageTimeExceeded => {
                    self.max_time.fetch_add(count, Ordering::SeqCst)
                }
            };
        }
    }

    struct Harness {
        backend: Arc<MemoryBackend>,
        clock: Arc<ManualClock>,
        recorder: Arc<Recorder>,
        store: OfflineStore,
    }

    fn harness(config: StoreConfig) -> Harness {
        let backend = Arc::new(MemoryBackend::new());
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let recorder = Arc::new(Recorder::default());
        let store = OfflineStore::builder(backend.clone())
            .clock(clock.clone())
            .notifier(recorder.clone())
            .initialize(&config, ENDPOINT)
            .unwrap();
        Harness {
            backend,
            clock,
            recorder,
            store,
        }
    }

    #[tokio::test]
    async fn test_initialize_derives_key() {
        let h = harness(StoreConfig::default());
        assert_eq!(h.store.storage_key(), KEY);
        assert!(!h.store.supports_sync_requests());
        h.store.probe().await.unwrap();

        let (key, max, retention) = h.store.debug_targets();
        assert_eq!(key, KEY);
        assert_eq!(max, 5_000_000);
        assert_eq!(retention, Duration::from_millis(604_800_000));
    }

    #[tokio::test]
    async fn test_initialize_rejects_underscore_prefix() {
        let backend = Arc::new(MemoryBackend::new());
        let result = OfflineStore::builder(backend)
            .initialize(&StoreConfig::default().with_prefix("bad_prefix"), ENDPOINT);
        assert!(matches!(result, Err(StoreError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_probe_reports_backend_failure() {
        let h = harness(StoreConfig::default());
        h.backend.fail_reads(true);
        assert!(matches!(h.store.probe().await, Err(StoreError::Backend(_))));
    }

    #[tokio::test]
    async fn test_add_assigns_ids() {
        let h = harness(StoreConfig::default());

        let generated = h.store.add_event(None, Event::text("a")).await.unwrap();
        let id = generated.id.clone().unwrap();
        assert_eq!(id.timestamp(), 1_700_000_000_000);
        assert_eq!(generated.priority_tier, 0);

        let own = h
            .store
            .add_event(None, Event::text("b").with_id("own.1"))
            .await
            .unwrap();
        assert_eq!(own.id, Some(EventId::new("own.1")));

        let suggested = h
            .store
            .add_event(Some(EventId::new("sugg.1")), Event::text("c").with_id("own.2"))
            .await
            .unwrap();
        assert_eq!(suggested.id, Some(EventId::new("sugg.1")));

        let doc = h.store.document().await.unwrap();
        assert_eq!(doc.len(), 3);
        assert_eq!(doc.last_access_time, 1_700_000_000_000);
    }

    #[tokio::test]
    async fn test_binary_payload_round_trip() {
        let h = harness(StoreConfig::default());
        let stored = h
            .store
            .add_event(None, Event::binary(vec![0xde, 0xad, 0xbe, 0xef]))
            .await
            .unwrap();
        assert_eq!(stored.payload, Payload::Encoded("3q2+7w==".into()));

        let raw = h.backend.raw(KEY).unwrap();
        assert!(raw.contains(r#""data":"3q2+7w==""#));
        assert!(raw.contains(r#""isArr":true"#));

        let events = h.store.get_all_events(None).await;
        assert_eq!(events[0].payload, Payload::Raw(vec![0xde, 0xad, 0xbe, 0xef]));
    }

    #[tokio::test]
    async fn test_get_all_events_limit() {
        let h = harness(StoreConfig::default());
        assert!(h.store.get_all_events(None).await.is_empty());

        for i in 0..5 {
            h.store.add_event(None, Event::text(format!("{i}"))).await.unwrap();
        }
        assert_eq!(h.store.get_all_events(None).await.len(), 5);
        assert_eq!(h.store.get_all_events(Some(2)).await.len(), 2);
        assert!(h.store.get_all_events(Some(0)).await.is_empty());
    }

    #[tokio::test]
    async fn test_next_batch_is_oldest() {
        let h = harness(StoreConfig::default());
        // lexical id order differs from timestamp order
        h.store
            .add_event(Some(EventId::new("900.z")), Event::text("newer"))
            .await
            .unwrap();
        h.store
            .add_event(Some(EventId::new("1000.a")), Event::text("newest"))
            .await
            .unwrap();
        h.store
            .add_event(Some(EventId::new("80.m")), Event::text("oldest"))
            .await
            .unwrap();

        let batch = h.store.get_next_batch().await;
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].payload, Payload::Text("oldest".into()));

        h.store.remove_events(&batch).await;
        let batch = h.store.get_next_batch().await;
        assert_eq!(batch[0].payload, Payload::Text("newer".into()));
    }

    #[tokio::test]
    async fn test_remove_events() {
        let h = harness(StoreConfig::default());
        let a = h.store.add_event(None, Event::text("a")).await.unwrap();
        let b = h.store.add_event(None, Event::text("b")).await.unwrap();

        let removed = h.store.remove_events(&[a.clone()]).await;
        assert_eq!(removed, vec![a]);

        let left = h.store.get_all_events(None).await;
        assert_eq!(left, vec![b.clone()]);

        // removing the last event deletes the document
        h.store.remove_events(&[b]).await;
        assert!(h.backend.raw(KEY).is_none());
    }

    #[tokio::test]
    async fn test_remove_events_without_document() {
        let h = harness(StoreConfig::default());
        let ghost = Event::text("x").with_id("1.a");
        assert_eq!(h.store.remove_events(&[ghost.clone()]).await, vec![ghost]);
    }

    #[tokio::test]
    async fn test_clear() {
        let h = harness(StoreConfig::default());
        assert!(h.store.clear().await.is_empty());

        h.store.add_event(None, Event::text("a")).await.unwrap();
        h.store.add_event(None, Event::binary(vec![1u8, 2])).await.unwrap();

        let cleared = h.store.clear().await;
        assert_eq!(cleared.len(), 2);
        assert!(cleared.iter().any(|e| e.payload == Payload::Raw(vec![1, 2])));
        assert!(h.backend.raw(KEY).is_none());
        assert!(h.store.get_all_events(None).await.is_empty());
    }

    #[tokio::test]
    async fn test_clean_drops_expired_and_notifies() {
        let config = StoreConfig::default().with_retention(Duration::from_secs(60));
        let h = harness(config);

        h.store.add_event(None, Event::text("old")).await.unwrap();
        h.clock.advance(30_000);
        h.store.add_event(None, Event::text("young")).await.unwrap();

        // nothing is old enough yet
        assert!(h.store.clean().await);
        assert_eq!(h.store.get_all_events(None).await.len(), 2);

        h.clock.advance(31_000);
        assert!(h.store.clean().await);
        let left = h.store.get_all_events(None).await;
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].payload, Payload::Text("young".into()));
        assert_eq!(h.recorder.max_time.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_clean_without_document() {
        let h = harness(StoreConfig::default());
        assert!(h.store.clean().await);
    }

    #[tokio::test]
    async fn test_clean_reports_write_failure() {
        let h = harness(StoreConfig::default().with_retention(Duration::from_millis(10)));
        h.store.add_event(None, Event::text("a")).await.unwrap();
        h.store.add_event(None, Event::text("b")).await.unwrap();
        h.clock.advance(1_000);

        h.backend.fail_writes(true);
        assert!(!h.store.clean().await);
        assert_eq!(h.recorder.max_time.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_teardown_resets_access_time() {
        let h = harness(StoreConfig::default());
        h.store.add_event(None, Event::text("a")).await.unwrap();
        assert_ne!(h.store.document().await.unwrap().last_access_time, 0);

        h.store.teardown().await;
        let doc = h.store.document().await.unwrap();
        assert_eq!(doc.last_access_time, 0);
        assert_eq!(doc.len(), 1);
    }

    #[tokio::test]
    async fn test_teardown_deletes_document_without_events() {
        let h = harness(StoreConfig::default());
        h.backend
            .insert_raw(KEY, r#"{"lastAccessTime":1700000000000,"evts":{}}"#);

        h.store.teardown().await;
        assert!(h.backend.raw(KEY).is_none());
        assert!(h.store.document().await.is_none());
    }

    #[tokio::test]
    async fn test_teardown_swallows_failures() {
        let h = harness(StoreConfig::default());
        h.store.add_event(None, Event::text("a")).await.unwrap();
        h.backend.fail_writes(true);
        h.store.teardown().await;
    }

    #[tokio::test]
    async fn test_auto_clean_runs_on_initialize() {
        let backend = Arc::new(MemoryBackend::new());
        let clock = Arc::new(ManualClock::new(10_000_000));
        backend.insert_raw(
            KEY,
            r#"{"lastAccessTime":1,"evts":{"5.a":{"id":"5.a","criticalCnt":0,"isArr":false,"data":"stale"}}}"#,
        );

        let config = StoreConfig::default()
            .with_retention(Duration::from_secs(1))
            .with_auto_clean(true);
        let _store = OfflineStore::builder(backend.clone())
            .clock(clock)
            .initialize(&config, ENDPOINT)
            .unwrap();

        for _ in 0..100 {
            if backend.raw(KEY).is_none() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(backend.raw(KEY).is_none());
    }

    #[tokio::test]
    async fn test_watch_config_replaces_settings() {
        let h = harness(StoreConfig::default());
        let (tx, rx) = watch::channel(StoreConfig::default());
        h.store.watch_config(rx).unwrap();

        tx.send(StoreConfig::default().with_max_size(1234).with_drop_batch(3))
            .unwrap();
        for _ in 0..100 {
            if h.store.settings().max_size_bytes == 1234 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(h.store.settings().max_size_bytes, 1234);
        assert_eq!(h.store.settings().drop_batch, 3);
        assert_eq!(h.store.storage_key(), KEY);

        // after teardown further updates are ignored
        h.store.teardown().await;
        tx.send(StoreConfig::default().with_max_size(99)).ok();
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(h.store.settings().max_size_bytes, 1234);
    }
}
