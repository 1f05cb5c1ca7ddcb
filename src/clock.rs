//! Timebase abstraction for step scheduling.
//!
//! The motion profile never blocks; it decides whether a step is due by
//! comparing against a monotonic clock supplied by the platform.

use core::time::Duration;

/// Something which records the elapsed real time.
///
/// Shared references only, because the same clock instance drives every
/// axis within a scheduling tick.
pub trait SystemClock {
    /// The amount of time that has passed since a clock-specific reference
    /// point (e.g. device startup).
    fn elapsed(&self) -> Duration;
}

impl<F> SystemClock for F
where
    F: Fn() -> Duration,
{
    fn elapsed(&self) -> Duration {
        self()
    }
}

/// A monotonically non-decreasing clock backed by the operating system.
#[cfg(feature = "std")]
#[derive(Debug, Clone, PartialEq)]
pub struct StdClock {
    created_at: std::time::Instant,
}

#[cfg(feature = "std")]
impl StdClock {
    /// Create a clock anchored at the current instant.
    pub fn new() -> StdClock {
        StdClock::default()
    }
}

#[cfg(feature = "std")]
impl Default for StdClock {
    fn default() -> StdClock {
        StdClock {
            created_at: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl SystemClock for StdClock {
    fn elapsed(&self) -> Duration {
        self.created_at.elapsed()
    }
}
