//! Property tests for the bounded history log
//!
//! Checks the log invariants over arbitrary append sequences:
//! - Length is min(N, capacity) and survivors are the newest, in order
//! - The cumulative counter ignores eviction
//! - Flushes fall exactly on multiples of the flush interval
//! - Export and trimming never reorder or drop from the back

use core::num::{NonZeroU32, NonZeroUsize};

use beacon_core::events::{Event, EventKind, Snapshot};
use beacon_core::history::HistoryLog;
use proptest::prelude::*;

fn log(capacity: usize, flush_every: u32) -> HistoryLog {
    HistoryLog::new(
        NonZeroUsize::new(capacity).unwrap(),
        NonZeroU32::new(flush_every).unwrap(),
    )
}

fn event(seq: u64) -> Event {
    let snapshot = Snapshot {
        timestamp: seq,
        ..Snapshot::default()
    };
    Event::new(EventKind::StatusUpdate, format!("event {}", seq), snapshot)
}

fn timestamps(log: &HistoryLog) -> Vec<u64> {
    log.iter().map(|e| e.timestamp).collect()
}

proptest! {
    #[test]
    fn keeps_newest_in_order(capacity in 1usize..32, appends in 0u64..128) {
        let mut log = log(capacity, 10);
        for seq in 0..appends {
            log.append(event(seq));
        }

        let expected_len = (appends as usize).min(capacity);
        prop_assert_eq!(log.len(), expected_len);

        let first = appends - expected_len as u64;
        let expected: Vec<u64> = (first..appends).collect();
        prop_assert_eq!(timestamps(&log), expected);
    }

    #[test]
    fn counter_counts_every_append(capacity in 1usize..16, appends in 0u32..200) {
        let mut log = log(capacity, 10);
        for seq in 0..appends {
            log.append(event(seq as u64));
        }
        prop_assert_eq!(log.total_events(), appends);
    }

    #[test]
    fn flush_due_on_multiples(flush_every in 1u32..20, appends in 1u32..200) {
        let mut log = log(8, flush_every);
        let mut flushes = 0;
        for seq in 1..=appends {
            let appended = log.append(event(seq as u64));
            prop_assert_eq!(appended.flush_due, seq % flush_every == 0);
            if appended.flush_due {
                flushes += 1;
            }
        }
        prop_assert_eq!(flushes, appends / flush_every);
    }

    #[test]
    fn snapshot_is_read_only(capacity in 1usize..16, appends in 0u64..64) {
        let mut log = log(capacity, 10);
        for seq in 0..appends {
            log.append(event(seq));
        }

        let before = timestamps(&log);
        let json = serde_json::to_value(log.snapshot("BEACON_001", 0)).unwrap();
        prop_assert_eq!(json["history"].as_array().unwrap().len(), before.len());
        prop_assert_eq!(timestamps(&log), before);
    }

    #[test]
    fn eviction_only_from_front(capacity in 1usize..16, appends in 0u64..64) {
        let mut log = log(capacity, 10);
        let mut evicted_total = 0usize;
        for seq in 0..appends {
            let appended = log.append(event(seq));
            prop_assert!(appended.evicted <= 1);
            evicted_total += appended.evicted;
            // Newest entry is always the one just appended
            prop_assert_eq!(log.latest().map(|e| e.timestamp), Some(seq));
        }
        prop_assert_eq!(evicted_total + log.len(), appends as usize);
    }
}

#[test]
fn capacity_three_example() {
    let mut log = log(3, 10);
    for (seq, name) in ["A", "B", "C", "D"].iter().enumerate() {
        let snapshot = Snapshot {
            timestamp: seq as u64,
            ..Snapshot::default()
        };
        log.append(Event::new(EventKind::StatusUpdate, *name, snapshot));
    }

    let names: Vec<&str> = log.iter().map(|e| e.details.as_str()).collect();
    assert_eq!(names, ["B", "C", "D"]);
    assert_eq!(log.total_events(), 4);
}

#[test]
fn ten_appends_one_flush() {
    let mut log = log(100, 10);
    let flushes: Vec<u32> = (0..10)
        .map(|seq| log.append(event(seq)))
        .filter(|a| a.flush_due)
        .map(|a| a.total)
        .collect();

    assert_eq!(flushes, [10]);
}
