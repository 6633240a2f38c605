//! Timestamp - Monotonic microsecond clock shared by all packets
//!
//! A process-wide generator hands out strictly increasing values so that two
//! packets created back-to-back can never carry the same timestamp, even when
//! the underlying clock has not advanced between the two readings.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::OnceLock;
use std::time::Instant;

/// Microseconds since the process-local monotonic epoch.
///
/// The zero value is reserved as the *invalid* sentinel; the generator never
/// issues it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Sentinel carried by the invalid packet.
    pub const INVALID: Timestamp = Timestamp(0);

    /// Build a timestamp from a raw microsecond count.
    ///
    /// Intended for tests and diagnostics; packets normally obtain their
    /// timestamp from [`next_timestamp`].
    #[inline]
    pub const fn from_micros(micros: i64) -> Self {
        Self(micros)
    }

    /// Raw microsecond count.
    #[inline]
    pub const fn micros(self) -> i64 {
        self.0
    }

    /// True unless this is the reserved sentinel.
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != Self::INVALID.0
    }

    /// Difference `self - earlier` in seconds.
    #[inline]
    pub fn seconds_since(self, earlier: Timestamp) -> f64 {
        (self.0 - earlier.0) as f64 / 1_000_000.0
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}us", self.0)
    }
}

/// Last issued value. Zero (the sentinel) means nothing issued yet.
static LAST_ISSUED: AtomicI64 = AtomicI64::new(0);

/// Anchor for the monotonic clock, fixed on first use.
static EPOCH: OnceLock<Instant> = OnceLock::new();

fn now_micros() -> i64 {
    let epoch = EPOCH.get_or_init(Instant::now);
    epoch.elapsed().as_micros() as i64
}

/// Allocate the next process-wide timestamp.
///
/// Reads the monotonic clock and returns `max(now, last_issued + 1)`, so the
/// sequence of returned values is strictly increasing within the process.
/// The compare-and-swap loop keeps the guarantee under concurrent callers;
/// the single-threaded scheduler never contends on it.
pub fn next_timestamp() -> Timestamp {
    let now = now_micros();
    let mut last = LAST_ISSUED.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_ISSUED.compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return Timestamp(next),
            Err(observed) => last = observed,
        }
    }
}
