//! Protocol-fixed constants from the wire specification.
//!
//! These are not deployment-tunable — changing them changes the wire
//! format or the cryptographic shape of the protocol. Deployment-tunable
//! values (cache sizes, rate limits, skew windows a tenant might override)
//! live in [`crate::config`] instead.

/// Wire protocol version carried in every frame.
pub const PROTOCOL_VERSION: u32 = 1;

/// Maximum length of a delegation chain (number of ancestors a leaf
/// capability may have).
pub const MAX_DELEGATION_DEPTH: usize = 3;

/// Maximum number of skipped-message keys a receiving ratchet chain may
/// accumulate before `TooManySkipped` is raised.
pub const MAX_SKIP: u32 = 1000;

/// Default maximum number of entries in the session authorization cache.
pub const SESSION_CACHE_MAX: usize = 10_000;

/// Number of entries evicted from the session cache in one eviction pass
/// when capacity is exceeded.
pub const SESSION_CACHE_EVICT_BATCH: usize = 100;

/// Clock skew tolerated on `issued_at <= now` checks, in seconds.
pub const CLOCK_SKEW_SECONDS: i64 = 60;

/// Width of the replay-defense sliding window, in seconds.
pub const REPLAY_WINDOW_SECONDS: i64 = 300;

/// Maximum sessions tracked by a single rate limiter instance before the
/// oldest 10% are evicted.
pub const RATE_LIMITER_MAX_SESSIONS: usize = 10_000;
