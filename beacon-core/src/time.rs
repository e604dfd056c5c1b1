//! Time management for beacon devices
//!
//! Everything in the firmware runs off a monotonic millisecond counter that
//! starts at zero on boot. Periodic work compares elapsed time against an
//! interval instead of sleeping, so the loop keeps servicing the transport.

#[cfg(target_has_atomic = "64")]
use alloc::sync::Arc;
#[cfg(target_has_atomic = "64")]
use core::sync::atomic::{AtomicU64, Ordering};

/// Timestamp in milliseconds since device boot
pub type Timestamp = u64;

/// Source of monotonic time for the system
pub trait TimeSource {
    /// Get current timestamp in milliseconds
    fn now(&self) -> Timestamp;
}

/// Monotonic time source backed by the host clock (requires std)
///
/// Reports milliseconds elapsed since the value was created, which stands in
/// for "since boot" when the firmware runs on a host.
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct MonotonicTime {
    started: std::time::Instant,
}

#[cfg(feature = "std")]
impl MonotonicTime {
    /// Start counting from now
    pub fn new() -> Self {
        Self { started: std::time::Instant::now() }
    }
}

#[cfg(feature = "std")]
impl Default for MonotonicTime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl TimeSource for MonotonicTime {
    fn now(&self) -> Timestamp {
        self.started.elapsed().as_millis() as Timestamp
    }
}

/// Manually driven clock for simulation and testing
///
/// Clones share the same counter, so a test can keep one handle while the
/// beacon owns another.
#[cfg(target_has_atomic = "64")]
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    millis: Arc<AtomicU64>,
}

#[cfg(target_has_atomic = "64")]
impl ManualClock {
    /// Clock reading `start`
    pub fn new(start: Timestamp) -> Self {
        Self { millis: Arc::new(AtomicU64::new(start)) }
    }

    /// Jump to `timestamp`
    pub fn set(&self, timestamp: Timestamp) {
        self.millis.store(timestamp, Ordering::Relaxed);
    }

    /// Move forward by `ms`
    pub fn advance(&self, ms: u64) {
        self.millis.fetch_add(ms, Ordering::Relaxed);
    }
}

#[cfg(target_has_atomic = "64")]
impl TimeSource for ManualClock {
    fn now(&self) -> Timestamp {
        self.millis.load(Ordering::Relaxed)
    }
}

/// Periodic deadline checked from a polling loop
///
/// Uses wrapping subtraction so a counter rollover does not stall the timer.
#[derive(Debug, Clone, Copy)]
pub struct Interval {
    period_ms: u64,
    last: Timestamp,
}

impl Interval {
    /// Create an interval whose first period starts at `now`
    pub const fn new(period_ms: u32, now: Timestamp) -> Self {
        Self { period_ms: period_ms as u64, last: now }
    }

    /// Returns true once per elapsed period and re-arms from `now`
    pub fn due(&mut self, now: Timestamp) -> bool {
        if now.wrapping_sub(self.last) >= self.period_ms {
            self.last = now;
            true
        } else {
            false
        }
    }

    /// Restart the current period at `now`
    pub fn reset(&mut self, now: Timestamp) {
        self.last = now;
    }

    /// Period length
    pub const fn period_ms(&self) -> u64 {
        self.period_ms
    }
}
