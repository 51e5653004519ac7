//! Sortable event identifiers
//!
//! A generated id is `<epoch-millis>.<8 random alphanumerics>`, for example
//! `1718000000123.x7Qp2LzA`. The leading timestamp doubles as the event's
//! insertion time for ordering and age-based eviction, so no separate field
//! is stored.

use std::borrow::Borrow;
use std::fmt;

use rand::Rng;
use rand::distr::Alphanumeric;
use serde::{Deserialize, Serialize};

use outbox_core::Clock;

/// Length of the random suffix that disambiguates same-millisecond ids
pub const SUFFIX_LEN: usize = 8;

/// Identifier of a stored event, unique within one document
///
/// Caller-supplied ids are accepted verbatim; they simply report a
/// timestamp of 0 if they do not follow the generated shape.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Wrap an existing identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh identifier stamped with the clock's current time
    pub fn generate(clock: &dyn Clock) -> Self {
        let suffix: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(SUFFIX_LEN)
            .map(char::from)
            .collect();
        Self(format!("{}.{}", clock.now_millis(), suffix))
    }

    /// Epoch milliseconds embedded in the id
    ///
    /// Returns 0 when the id is not `digits.rest` or the digits overflow.
    /// Callers treat 0 as "unknown, assume ancient", never as a real time.
    pub fn timestamp(&self) -> u64 {
        parse_timestamp(&self.0)
    }

    /// Borrow the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the id, returning the underlying string
    pub fn into_string(self) -> String {
        self.0
    }
}

/// Parse the leading timestamp of an id produced by [`EventId::generate`]
pub fn parse_timestamp(id: &str) -> u64 {
    let Some((digits, _)) = id.split_once('.') else {
        return 0;
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return 0;
    }
    digits.parse().unwrap_or(0)
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for EventId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<String> for EventId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for EventId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}
