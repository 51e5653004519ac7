//! Eviction policies for the in-memory event map
//!
//! Both policies mutate the map in place, remove whole events only, and cap
//! the number of removals per pass at `limit`.
//!
//! - [`evict_by_priority`]: capacity pressure, lowest tier first
//! - [`evict_older_than`]: retention window, by id timestamp

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::debug;

use crate::event::Event;
use crate::event_id::EventId;

/// Events of one document keyed by id
pub type EventMap = BTreeMap<EventId, Event>;

/// Drop up to `limit` events from the lowest tier that has any
///
/// Tiers `0..=max_tier` are scanned in ascending order. The first tier with
/// at least one event is the only tier touched in this pass, even if it holds
/// fewer than `limit` events; the add-time retry loop calls again for more.
/// Events above `max_tier` are never evicted.
///
/// Returns the number of events removed.
pub fn evict_by_priority(max_tier: u32, events: &mut EventMap, limit: usize) -> usize {
    if limit == 0 {
        return 0;
    }

    for tier in 0..=max_tier {
        let doomed: Vec<EventId> = events
            .iter()
            .filter(|(_, event)| event.priority_tier == tier)
            .map(|(id, _)| id.clone())
            .take(limit)
            .collect();

        if !doomed.is_empty() {
            for id in &doomed {
                events.remove(id);
            }
            debug!(tier, dropped = doomed.len(), "Evicted events by priority tier");
            return doomed.len();
        }
    }

    0
}

/// Drop up to `limit` events whose id timestamp is outside the retention window
///
/// The cutoff is `now + 1 - retention`; an event is evicted when its id
/// timestamp is at or before the cutoff. Ids without a parseable timestamp
/// report 0 and are therefore always eligible.
///
/// Returns the number of events removed; any removal means the document
/// needs to be committed.
pub fn evict_older_than(
    retention: Duration,
    events: &mut EventMap,
    limit: usize,
    now_millis: i64,
) -> usize {
    let retention_ms = i128::try_from(retention.as_millis()).unwrap_or(i128::MAX);
    let cutoff = i128::from(now_millis) + 1 - retention_ms;

    let doomed: Vec<EventId> = events
        .keys()
        .filter(|id| i128::from(id.timestamp()) <= cutoff)
        .take(limit)
        .cloned()
        .collect();

    for id in &doomed {
        events.remove(id);
    }
    if !doomed.is_empty() {
        debug!(dropped = doomed.len(), cutoff = %cutoff, "Evicted events past retention");
    }
    doomed.len()
}
