//! Pending telemetry events and their persisted form
//!
//! On the wire an event is
//! `{"id": .., "criticalCnt": <int>, "isArr": <bool>, "data": <string|bytes>, ..}`.
//! In memory the `isArr` flag is folded into the [`Payload`] variant.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::codec;
use crate::event_id::EventId;

/// Event payload, tagged by representation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Plain string payload, stored as-is
    Text(String),
    /// Binary payload, ready for use
    Raw(Vec<u8>),
    /// Binary payload in its text-safe encoded form
    Encoded(String),
}

impl Payload {
    /// Whether the payload is binary (raw or encoded)
    pub fn is_binary(&self) -> bool {
        matches!(self, Payload::Raw(_) | Payload::Encoded(_))
    }

    /// Convert a raw binary payload to its encoded form
    ///
    /// Text and already-encoded payloads pass through untouched.
    pub fn into_encoded(self) -> Self {
        match self {
            Payload::Raw(bytes) => Payload::Encoded(codec::encode(&bytes)),
            other => other,
        }
    }

    /// Convert an encoded binary payload back to raw bytes
    ///
    /// Malformed encodings decode best-effort; this never fails.
    pub fn into_raw(self) -> Self {
        match self {
            Payload::Encoded(text) => Payload::Raw(codec::decode(&text)),
            other => other,
        }
    }
}

impl Default for Payload {
    fn default() -> Self {
        Payload::Text(String::new())
    }
}

/// One pending telemetry record
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(into = "StoredEvent", from = "StoredEvent")]
pub struct Event {
    /// Unique id within a document; assigned on insert when absent
    pub id: Option<EventId>,
    /// Lower tiers are evicted first under capacity pressure
    pub priority_tier: u32,
    /// Event body
    pub payload: Payload,
    /// Fields the store does not interpret, preserved round-trip
    pub extra: Map<String, Value>,
}

impl Event {
    /// Create an event with a string payload
    pub fn text(data: impl Into<String>) -> Self {
        Self {
            payload: Payload::Text(data.into()),
            ..Default::default()
        }
    }

    /// Create an event with a binary payload
    pub fn binary(data: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: Payload::Raw(data.into()),
            ..Default::default()
        }
    }

    /// Set the id
    pub fn with_id(mut self, id: impl Into<EventId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the priority tier
    pub fn with_priority_tier(mut self, tier: u32) -> Self {
        self.priority_tier = tier;
        self
    }

    /// Attach an uninterpreted field
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Whether the payload is binary
    pub fn is_binary(&self) -> bool {
        self.payload.is_binary()
    }

    /// Embedded id timestamp, 0 when unknown or unassigned
    pub fn timestamp(&self) -> u64 {
        self.id.as_ref().map(EventId::timestamp).unwrap_or(0)
    }

    /// Event with its binary payload in encoded form
    pub fn encoded(mut self) -> Self {
        self.payload = self.payload.into_encoded();
        self
    }

    /// Event with its binary payload decoded to raw bytes
    pub fn decoded(mut self) -> Self {
        self.payload = self.payload.into_raw();
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum StoredData {
    Text(String),
    Bytes(Vec<u8>),
}

impl Default for StoredData {
    fn default() -> Self {
        StoredData::Text(String::new())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(rename = "criticalCnt", default)]
    critical_cnt: Option<u32>,
    #[serde(rename = "isArr", default)]
    is_arr: Option<bool>,
    #[serde(default)]
    data: StoredData,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<Event> for StoredEvent {
    fn from(event: Event) -> Self {
        // raw bytes never reach the wire
        let (is_arr, data) = match event.payload {
            Payload::Text(text) => (false, text),
            Payload::Raw(bytes) => (true, codec::encode(&bytes)),
            Payload::Encoded(text) => (true, text),
        };
        Self {
            id: event.id.map(EventId::into_string),
            critical_cnt: Some(event.priority_tier),
            is_arr: Some(is_arr),
            data: StoredData::Text(data),
            extra: event.extra,
        }
    }
}

impl From<StoredEvent> for Event {
    fn from(stored: StoredEvent) -> Self {
        let payload = match (stored.is_arr.unwrap_or(false), stored.data) {
            (true, StoredData::Text(text)) => Payload::Encoded(text),
            (false, StoredData::Text(text)) => Payload::Text(text),
            (_, StoredData::Bytes(bytes)) => Payload::Raw(bytes),
        };
        Self {
            id: stored.id.map(EventId::from),
            priority_tier: stored.critical_cnt.unwrap_or(0),
            payload,
            extra: stored.extra,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_format() {
        let event = Event::text("hello").with_id("100.abcdefgh").with_priority_tier(1);
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({"id": "100.abcdefgh", "criticalCnt": 1, "isArr": false, "data": "hello"})
        );
    }

    #[test]
    fn test_raw_payload_is_encoded_on_the_wire() {
        let event = Event::binary(vec![1u8, 2, 3]).with_id("1.a");
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["isArr"], json!(true));
        assert_eq!(value["data"], json!("AQID"));

        let back: Event = serde_json::from_value(value).unwrap();
        assert_eq!(back.payload, Payload::Encoded("AQID".into()));
        assert_eq!(back.decoded().payload, Payload::Raw(vec![1, 2, 3]));
    }

    #[test]
    fn test_legacy_byte_array_data() {
        let back: Event =
            serde_json::from_value(json!({"id": "1.a", "isArr": true, "data": [7, 8]})).unwrap();
        assert_eq!(back.payload, Payload::Raw(vec![7, 8]));
        assert_eq!(back.priority_tier, 0);
    }

    #[test]
    fn test_missing_and_null_fields_default() {
        let back: Event = serde_json::from_value(json!({"criticalCnt": null})).unwrap();
        assert_eq!(back.id, None);
        assert_eq!(back.priority_tier, 0);
        assert_eq!(back.payload, Payload::Text(String::new()));
    }

    #[test]
    fn test_extra_fields_preserved() {
        let raw = json!({"id": "1.a", "criticalCnt": 0, "isArr": false, "data": "x", "iKey": "k", "cnt": 3});
        let event: Event = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(event.extra.get("iKey"), Some(&json!("k")));
        assert_eq!(serde_json::to_value(&event).unwrap(), raw);
    }

    #[test]
    fn test_encoded_passes_text_through() {
        let event = Event::text("plain").encoded();
        assert_eq!(event.payload, Payload::Text("plain".into()));
        assert!(!event.is_binary());

        let already = Payload::Encoded("QQ==".into());
        assert_eq!(already.clone().into_encoded(), already);
    }
}
