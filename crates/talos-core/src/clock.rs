//! Injectable wall-clock and monotonic-clock access.
//!
//! Per the specification's design notes, the `CapabilityManager` and
//! `SessionManager` accept an injectable clock at construction so that
//! expiry and skew boundaries are deterministically testable. Defaults use
//! the system clock.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// A source of wall-clock (UTC) and monotonic time.
///
/// All duration measurements (latency, rate-limit refill) use the
/// monotonic side; all expiry/skew comparisons use the UTC side.
pub trait Clock: Send + Sync {
    /// Seconds since the Unix epoch, UTC.
    fn now_unix(&self) -> i64;

    /// An opaque monotonic instant, immune to wall-clock adjustment.
    fn now_monotonic(&self) -> Instant;
}

/// The default `Clock`, backed by `SystemTime`/`Instant`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_secs() as i64
    }

    fn now_monotonic(&self) -> Instant {
        Instant::now()
    }
}
