//! The per-namespace persisted document
//!
//! Wire format:
//!
//! ```json
//! { "lastAccessTime": 1718000000123,
//!   "evts": { "<id>": { "id": "<id>", "criticalCnt": 0, "isArr": false, "data": "..." } } }
//! ```

use serde::{Deserialize, Serialize};

use crate::event::Event;
use crate::event_id::EventId;
use crate::eviction::EventMap;

/// All pending events of one namespace plus bookkeeping
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Epoch millis of the last successful write; reset to 0 on teardown
    #[serde(rename = "lastAccessTime", default)]
    pub last_access_time: i64,
    /// Pending events keyed by id
    #[serde(rename = "evts", default)]
    pub events: EventMap,
}

impl Document {
    /// Create an empty document that has never been written
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the document holds no events
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Insert an event under its id, replacing any event with the same id
    ///
    /// Events without an id are ignored; the facade always assigns one first.
    pub fn insert(&mut self, event: Event) {
        if let Some(id) = event.id.clone() {
            self.events.insert(id, event);
        }
    }

    /// Remove and return the event with the given id
    pub fn remove(&mut self, id: &EventId) -> Option<Event> {
        self.events.remove(id)
    }

    /// Remove and return every event
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events).into_values().collect()
    }

    /// Serialize to the persisted JSON form
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Length in bytes of the persisted JSON form
    pub fn serialized_len(&self) -> Result<usize, serde_json::Error> {
        self.to_json().map(|json| json.len())
    }

    /// Parse the persisted JSON form
    ///
    /// A literal `null` document parses to `None`. Events stored without an
    /// `id` field take the id of their map key.
    pub fn from_json(json: &str) -> Result<Option<Self>, serde_json::Error> {
        let parsed: Option<Self> = serde_json::from_str(json)?;
        Ok(parsed.map(|mut doc| {
            for (key, event) in doc.events.iter_mut() {
                if event.id.is_none() {
                    event.id = Some(key.clone());
                }
            }
            doc
        }))
    }
}
