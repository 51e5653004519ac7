//! Store configuration
//!
//! [`StoreConfig`] is what the host supplies (and may change at runtime);
//! [`StoreSettings`] is the resolved form the facade reads on every call.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Default namespace key prefix
pub const DEFAULT_STORAGE_KEY_PREFIX: &str = "AIOffline";
/// Default size ceiling of a serialized document (5 MB)
pub const DEFAULT_MAX_STORAGE_SIZE_IN_BYTES: usize = 5_000_000;
/// Default retention window (7 days)
pub const DEFAULT_IN_STORAGE_MAX_TIME_MS: u64 = 7 * 24 * 60 * 60 * 1000;
/// Default maximum events removed per eviction pass
pub const DEFAULT_EVENTS_TO_DROP_PER_TIME: usize = 10;
/// Default highest priority tier eligible for add-time eviction
pub const DEFAULT_MAX_CRITICAL_EVTS_DROP_CNT: u32 = 2;

/// Host-supplied configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreConfig {
    /// Namespace key prefix; must not contain `_`
    pub storage_key_prefix: String,
    /// Size ceiling of the serialized document; 0 means default
    pub max_storage_size_in_bytes: usize,
    /// Retention window in milliseconds; 0 means default
    #[serde(rename = "inStorageMaxTime")]
    pub in_storage_max_time_ms: u64,
    /// Events removed per eviction pass; 0 is honoured
    #[serde(alias = "EventsToDropPerTime")]
    pub events_to_drop_per_time: usize,
    /// Highest tier add-time eviction may touch; 0 means default
    pub max_critical_evts_drop_cnt: u32,
    /// Run an age-based clean right after initialization
    pub auto_clean: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_key_prefix: DEFAULT_STORAGE_KEY_PREFIX.to_string(),
            max_storage_size_in_bytes: DEFAULT_MAX_STORAGE_SIZE_IN_BYTES,
            in_storage_max_time_ms: DEFAULT_IN_STORAGE_MAX_TIME_MS,
            events_to_drop_per_time: DEFAULT_EVENTS_TO_DROP_PER_TIME,
            max_critical_evts_drop_cnt: DEFAULT_MAX_CRITICAL_EVTS_DROP_CNT,
            auto_clean: false,
        }
    }
}

impl StoreConfig {
    /// Load a configuration from a JSON file; missing fields take defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            StoreError::invalid_config(format!("{}: {}", path.as_ref().display(), e))
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Set the namespace key prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.storage_key_prefix = prefix.into();
        self
    }

    /// Set the document size ceiling
    pub fn with_max_size(mut self, bytes: usize) -> Self {
        self.max_storage_size_in_bytes = bytes;
        self
    }

    /// Set the retention window
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.in_storage_max_time_ms = u64::try_from(retention.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the per-pass eviction batch size
    pub fn with_drop_batch(mut self, events: usize) -> Self {
        self.events_to_drop_per_time = events;
        self
    }

    /// Set the highest tier add-time eviction may touch
    pub fn with_max_tier(mut self, tier: u32) -> Self {
        self.max_critical_evts_drop_cnt = tier;
        self
    }

    /// Enable or disable the initial clean
    pub fn with_auto_clean(mut self, enabled: bool) -> Self {
        self.auto_clean = enabled;
        self
    }

    /// Validate configuration invariants
    ///
    /// Returns a list of warnings; an empty list means the configuration is
    /// used exactly as given.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.storage_key_prefix.contains('_') {
            warnings.push(ConfigWarning::PrefixContainsUnderscore);
        }

        if self.events_to_drop_per_time == 0 {
            warnings.push(ConfigWarning::ZeroDropBatch);
        }

        if self.max_storage_size_in_bytes == 0
            || self.in_storage_max_time_ms == 0
            || self.max_critical_evts_drop_cnt == 0
        {
            warnings.push(ConfigWarning::ZeroValuesDefaulted);
        }

        warnings
    }

    /// Resolve into the settings the store actually uses
    pub fn settings(&self) -> StoreSettings {
        StoreSettings {
            max_size_bytes: nonzero_or(
                self.max_storage_size_in_bytes,
                DEFAULT_MAX_STORAGE_SIZE_IN_BYTES,
            ),
            retention: Duration::from_millis(nonzero_or(
                self.in_storage_max_time_ms,
                DEFAULT_IN_STORAGE_MAX_TIME_MS,
            )),
            drop_batch: self.events_to_drop_per_time,
            max_tier: nonzero_or(
                self.max_critical_evts_drop_cnt,
                DEFAULT_MAX_CRITICAL_EVTS_DROP_CNT,
            ),
        }
    }
}

fn nonzero_or<T: PartialEq + Default>(value: T, default: T) -> T {
    if value == T::default() { default } else { value }
}

/// Resolved scalars read during an operation
///
/// Replaced wholesale when the configuration changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreSettings {
    /// Size ceiling of the serialized document in bytes
    pub max_size_bytes: usize,
    /// Events older than this are dropped by `clean`
    pub retention: Duration,
    /// Maximum events removed per eviction pass
    pub drop_batch: usize,
    /// Highest tier add-time eviction may touch
    pub max_tier: u32,
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreConfig::default().settings()
    }
}

/// Configuration warnings and errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigWarning {
    /// Prefix contains `_`, which would make namespace keys ambiguous
    PrefixContainsUnderscore,
    /// Add-time eviction can never free space
    ZeroDropBatch,
    /// A zero size, retention, or tier value was replaced by its default
    ZeroValuesDefaulted,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::PrefixContainsUnderscore => {
                write!(f, "storage_key_prefix must not contain '_'")
            }
            ConfigWarning::ZeroDropBatch => {
                write!(f, "events_to_drop_per_time is 0, add-time eviction is disabled")
            }
            ConfigWarning::ZeroValuesDefaulted => {
                write!(f, "zero size, retention or tier values fall back to defaults")
            }
        }
    }
}
