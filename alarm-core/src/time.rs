//! Wrapping millisecond timestamps.
//!
//! The board clock is a free-running 32-bit millisecond counter that wraps
//! roughly every 49.7 days. Every timing decision in the controller is an
//! elapsed-time comparison built on wrapping subtraction, so a wrap between two
//! samples is harmless as long as the real gap stays below the counter period.

use core::time::Duration;

/// Millisecond timestamp read from the monotonic board clock.
///
/// Intentionally not `Ord`: after a wrap a later timestamp may compare smaller.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Millis(u32);

impl Millis {
    pub const ZERO: Self = Self(0);

    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Advances the timestamp, wrapping at the counter width.
    #[must_use]
    pub fn wrapping_add(self, delta: Duration) -> Self {
        // Truncation mirrors the hardware counter.
        #[allow(clippy::cast_possible_truncation)]
        let millis = delta.as_millis() as u32;
        Self(self.0.wrapping_add(millis))
    }

    /// Time elapsed from `earlier` to `self`.
    #[must_use]
    pub fn duration_since(self, earlier: Millis) -> Duration {
        Duration::from_millis(u64::from(self.0.wrapping_sub(earlier.0)))
    }

    /// Returns `true` once at least `period` has passed since `since`.
    #[must_use]
    pub fn has_elapsed(self, since: Millis, period: Duration) -> bool {
        self.duration_since(since) >= period
    }
}

impl From<u32> for Millis {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// Fixed-period schedule for work that should not run every poll cycle.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Interval {
    period: Duration,
    last: Option<Millis>,
}

impl Interval {
    pub const fn new(period: Duration) -> Self {
        Self { period, last: None }
    }

    pub const fn period(&self) -> Duration {
        self.period
    }

    /// Returns `true` when the interval is due and records `now` as the last run.
    ///
    /// The first poll is always due.
    pub fn poll(&mut self, now: Millis) -> bool {
        let due = match self.last {
            Some(last) => now.has_elapsed(last, self.period),
            None => true,
        };
        if due {
            self.last = Some(now);
        }
        due
    }
}
