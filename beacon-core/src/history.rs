//! Bounded Event History Log
//!
//! ## Overview
//!
//! The beacon keeps a short, insertion-ordered history of what happened on the
//! device and periodically pushes it to a dashboard topic. The log is bounded:
//! once it holds `capacity` events, each new insertion evicts the oldest.
//!
//! ## Design Rationale
//!
//! ### Typed Records, Serialized on Export
//!
//! Events are stored as typed [`Event`] values in a `VecDeque` and only turned
//! into JSON when a snapshot is exported. Appending is O(1) and never touches
//! the serializer, and the exported content and ordering are exactly the
//! insertion sequence.
//!
//! ### Counter Independent of Size
//!
//! `total_events` counts every insertion ever made, including the ones that
//! were later evicted. It drives the flush trigger and is reported to the
//! dashboard as `history_count`:
//!
//! ```text
//! capacity = 3, flush_every = 10
//!
//! append A  → [A]        total 1
//! append B  → [A, B]     total 2
//! append C  → [A, B, C]  total 3
//! append D  → [B, C, D]  total 4   (A evicted)
//! ...
//! append #10              total 10  → flush_due
//! ```
//!
//! ### Export Is Read-Only
//!
//! [`HistoryLog::snapshot`] borrows the log. Exporting never changes its
//! length or order, so a `get_history` request between two flushes is
//! harmless.
//!
//! ## Usage Example
//!
//! ```rust
//! use core::num::{NonZeroU32, NonZeroUsize};
//! use beacon_core::events::{Event, EventKind, Snapshot};
//! use beacon_core::history::HistoryLog;
//!
//! let mut log = HistoryLog::new(NonZeroUsize::new(3).unwrap(), NonZeroU32::new(10).unwrap());
//!
//! for ts in 0..4 {
//!     let snapshot = Snapshot { timestamp: ts, ..Snapshot::default() };
//!     log.append(Event::new(EventKind::StatusUpdate, "tick", snapshot));
//! }
//!
//! assert_eq!(log.len(), 3);
//! assert_eq!(log.total_events(), 4);
//! assert_eq!(log.iter().next().map(|e| e.timestamp), Some(1));
//! ```

use alloc::collections::VecDeque;
use core::num::{NonZeroU32, NonZeroUsize};
use serde::Serialize;

use crate::constants::{DEFAULT_HISTORY_CAPACITY, DEFAULT_HISTORY_FLUSH_EVERY, HISTORY_UPDATE_TAG};
use crate::events::Event;
use crate::time::Timestamp;

/// Outcome of a single append
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Appended {
    /// Cumulative insertion count after this append
    pub total: u32,
    /// Number of oldest entries evicted by this append
    pub evicted: usize,
    /// True when this append completes a flush interval
    pub flush_due: bool,
}

/// Bounded, insertion-ordered event log
///
/// ## Internal Invariants
///
/// - `entries.len() <= capacity` after every public operation
/// - `entries` is oldest-first
/// - `total_events` only grows (saturating at `u32::MAX`)
#[derive(Debug, Clone)]
pub struct HistoryLog {
    entries: VecDeque<Event>,
    capacity: NonZeroUsize,
    flush_every: NonZeroU32,
    total_events: u32,
}

impl HistoryLog {
    /// Create an empty log
    pub fn new(capacity: NonZeroUsize, flush_every: NonZeroU32) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.get()),
            capacity,
            flush_every,
            total_events: 0,
        }
    }

    /// Append an event at the back, evicting from the front if over capacity
    ///
    /// Never fails. The caller exports the log when `flush_due` is set.
    pub fn append(&mut self, event: Event) -> Appended {
        self.entries.push_back(event);
        self.total_events = self.total_events.saturating_add(1);

        let evicted = self.trim_to_capacity();

        Appended {
            total: self.total_events,
            evicted,
            flush_due: self.total_events % self.flush_every.get() == 0,
        }
    }

    /// Drop the oldest `len - capacity` entries
    ///
    /// Returns how many entries were removed. Remaining entries are untouched.
    pub fn trim_to_capacity(&mut self) -> usize {
        let excess = self.entries.len().saturating_sub(self.capacity.get());
        if excess > 0 {
            self.entries.drain(..excess);
        }
        excess
    }

    /// Borrow a serializable export of the current contents
    pub fn snapshot<'a>(&'a self, beacon_id: &'a str, now: Timestamp) -> HistorySnapshot<'a> {
        HistorySnapshot {
            beacon_id,
            command: HISTORY_UPDATE_TAG,
            history_count: self.total_events,
            history: &self.entries,
            timestamp: now,
        }
    }

    /// Number of events held
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no events are held
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of events held
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Insertions between exports
    pub fn flush_every(&self) -> u32 {
        self.flush_every.get()
    }

    /// All-time number of insertions
    pub fn total_events(&self) -> u32 {
        self.total_events
    }

    /// Most recent event
    pub fn latest(&self) -> Option<&Event> {
        self.entries.back()
    }

    /// Iterate from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &Event> + '_ {
        self.entries.iter()
    }
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::new(
            NonZeroUsize::new(DEFAULT_HISTORY_CAPACITY).unwrap_or(NonZeroUsize::MIN),
            NonZeroU32::new(DEFAULT_HISTORY_FLUSH_EVERY).unwrap_or(NonZeroU32::MIN),
        )
    }
}

/// Exported view of the history, as published to the dashboard
///
/// ```text
/// {"beacon_id":"BEACON_001","command":"history_update","history_count":42,
///  "history":[...],"timestamp":123456}
/// ```
#[derive(Debug, Serialize)]
pub struct HistorySnapshot<'a> {
    /// Exporting beacon
    pub beacon_id: &'a str,
    /// Always `history_update`
    pub command: &'static str,
    /// All-time insertions
    pub history_count: u32,
    /// Held events, oldest first
    pub history: &'a VecDeque<Event>,
    /// Export time, ms since boot
    pub timestamp: Timestamp,
}
