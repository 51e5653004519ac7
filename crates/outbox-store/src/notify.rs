//! Drop notifications
//!
//! The store reports every eviction to a host-provided sink so the pipeline
//! can account for discarded telemetry.

use std::fmt;

/// Why events were discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropReason {
    /// Dropped by add-time eviction to make room for a new event
    CleanStorage,
    /// Dropped by a periodic clean because they outlived the retention window
    MaxInStorageTimeExceeded,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::CleanStorage => write!(f, "clean_storage"),
            DropReason::MaxInStorageTimeExceeded => write!(f, "max_in_storage_time_exceeded"),
        }
    }
}

/// Sink for drop notifications
///
/// Called only with `count > 0`. Implementations must not block; the store
/// calls this inline at the end of an operation.
pub trait DropNotifier: Send + Sync {
    /// `count` events were discarded for `reason`
    fn events_dropped(&self, count: usize, reason: DropReason);
}

impl<F> DropNotifier for F
where
    F: Fn(usize, DropReason) + Send + Sync,
{
    fn events_dropped(&self, count: usize, reason: DropReason) {
        self(count, reason)
    }
}
