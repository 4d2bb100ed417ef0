//! Clock abstraction for latency measurement and periodic checks
//!
//! The governor reads time in two places: around every wrapped call (to feed
//! the latency window) and inside the adaptive controller (to rate-limit its
//! periodic checks). Both go through the [`TimeSource`] trait so the whole
//! control loop can be driven deterministically in tests:
//!
//! - [`MonotonicClock`]: production clock anchored to `std::time::Instant`,
//!   immune to wall-clock adjustments
//! - [`FixedClock`]: manually advanced clock for tests; clones share the
//!   same underlying counter so a test can advance time from inside a
//!   processing closure while the governor holds its own handle

use core::sync::atomic::{AtomicU64, Ordering};

#[cfg(not(feature = "std"))]
use alloc::sync::Arc;
#[cfg(feature = "std")]
use std::sync::Arc;

/// Timestamp in milliseconds since an arbitrary epoch (clock construction
/// for monotonic sources)
pub type Timestamp = u64;

/// Source of time for the governor
///
/// Implementations must be monotonic: `now()` never decreases between calls.
/// Precision of one millisecond is sufficient; the latency budgets this crate
/// manages are tens of milliseconds.
pub trait TimeSource {
    /// Get current timestamp in milliseconds
    fn now(&self) -> Timestamp;

    /// Get precision in milliseconds
    fn precision_ms(&self) -> u32 {
        1
    }
}

/// Monotonic clock anchored at construction time (requires std)
///
/// Backed by `std::time::Instant`, so it keeps counting through wall-clock
/// adjustments and suspends.
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    start: std::time::Instant,
}

#[cfg(feature = "std")]
impl MonotonicClock {
    /// Create a clock starting at timestamp 0
    pub fn new() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl TimeSource for MonotonicClock {
    fn now(&self) -> Timestamp {
        self.start.elapsed().as_millis() as Timestamp
    }
}

/// Manually advanced clock for tests
///
/// Clones share the same counter, so a copy handed to the governor and a copy
/// kept by the test observe the same time:
///
/// ```rust
/// use paceguard_core::time::{FixedClock, TimeSource};
///
/// let clock = FixedClock::new(1_000);
/// let handle = clock.clone();
///
/// handle.advance(250);
/// assert_eq!(clock.now(), 1_250);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FixedClock {
    now_ms: Arc<AtomicU64>,
}

impl FixedClock {
    /// Create a clock at the given timestamp
    pub fn new(timestamp: Timestamp) -> Self {
        Self {
            now_ms: Arc::new(AtomicU64::new(timestamp)),
        }
    }

    /// Set the absolute timestamp
    pub fn set(&self, timestamp: Timestamp) {
        self.now_ms.store(timestamp, Ordering::Release);
    }

    /// Advance the clock by `ms` milliseconds
    pub fn advance(&self, ms: u64) {
        self.now_ms.fetch_add(ms, Ordering::AcqRel);
    }
}

impl TimeSource for FixedClock {
    fn now(&self) -> Timestamp {
        self.now_ms.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_advances() {
        let clock = FixedClock::new(1000);
        assert_eq!(clock.now(), 1000);

        clock.advance(500);
        assert_eq!(clock.now(), 1500);
    }

    #[test]
    fn fixed_clock_clones_share_time() {
        let clock = FixedClock::new(0);
        let handle = clock.clone();

        handle.advance(80);
        assert_eq!(clock.now(), 80);

        clock.set(5000);
        assert_eq!(handle.now(), 5000);
    }

    #[cfg(feature = "std")]
    #[test]
    fn monotonic_clock_does_not_go_backwards() {
        let clock = MonotonicClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
