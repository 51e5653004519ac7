//! # Outbox Store
//!
//! Bounded persistent holding area for telemetry events awaiting delivery.
//!
//! Events are kept in one JSON document per endpoint namespace. When an add
//! would push the document past its size ceiling, the lowest priority tier is
//! evicted batch by batch until the new event fits. A periodic clean drops
//! events that outlived the retention window.
//!
//! ## Features
//!
//! - **OfflineStore**: Facade for add, read, remove, clear, clean and teardown
//! - **DocumentStore**: Read-modify-write of namespace documents with corruption recovery
//! - **Eviction**: Priority-tier and age-based eviction over an event map
//! - **Codec**: Standard base64 with a lenient decoder
//! - **MemoryBackend / FileBackend**: Ready-made key-value backends
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use outbox_store::{Event, MemoryBackend, OfflineStore, StoreConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = OfflineStore::builder(Arc::new(MemoryBackend::new()))
//!         .initialize(&StoreConfig::default(), "https://dc.example.com/v2/track")
//!         .unwrap();
//!
//!     store.add_event(None, Event::text("{\"name\":\"pageView\"}")).await.unwrap();
//!
//!     let batch = store.get_next_batch().await;
//!     // ... deliver ...
//!     store.remove_events(&batch).await;
//! }
//! ```

pub mod adapter;
pub mod backend;
pub mod codec;
pub mod config;
pub mod document;
pub mod error;
pub mod event;
pub mod event_id;
pub mod eviction;
pub mod namespace;
pub mod notify;
pub mod store;

// Re-exports
pub use adapter::{DocumentStore, LoadOutcome};
pub use backend::{FileBackend, MemoryBackend};
pub use config::{ConfigWarning, StoreConfig, StoreSettings};
pub use document::Document;
pub use error::{CommitError, StoreError};
pub use event::{Event, Payload};
pub use event_id::EventId;
pub use eviction::EventMap;
pub use namespace::{endpoint_domain, storage_key};
pub use notify::{DropNotifier, DropReason};
pub use store::{OfflineStore, OfflineStoreBuilder};

// Re-export collaborator interfaces from outbox-core for convenience
pub use outbox_core::{BackendError, Clock, KeyValueBackend, ManualClock, SystemClock};
