//! Deployment-tunable configuration shared by multiple crates.
//!
//! Protocol-fixed values stay as `pub const`s in [`crate::constants`];
//! values a deployment might reasonably override (cache sizing, skew
//! windows) live here as `Default`-implementing structs, matching the
//! teacher's `AmpRuntimeConfig` pattern.

use crate::constants::{
    CLOCK_SKEW_SECONDS, MAX_DELEGATION_DEPTH, REPLAY_WINDOW_SECONDS, SESSION_CACHE_EVICT_BATCH,
    SESSION_CACHE_MAX,
};

/// Tunables for the capability lifecycle and session cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Maximum delegation chain length.
    pub max_delegation_depth: usize,
    /// Maximum session cache entries before eviction.
    pub session_cache_max: usize,
    /// Number of entries evicted per eviction pass.
    pub session_cache_evict_batch: usize,
    /// Clock skew tolerated on `issued_at` checks, in seconds.
    pub clock_skew_seconds: i64,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            max_delegation_depth: MAX_DELEGATION_DEPTH,
            session_cache_max: SESSION_CACHE_MAX,
            session_cache_evict_batch: SESSION_CACHE_EVICT_BATCH,
            clock_skew_seconds: CLOCK_SKEW_SECONDS,
        }
    }
}

/// Tunables for frame verification's replay defense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayConfig {
    /// Width of the sliding replay window, in seconds.
    pub window_seconds: i64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            window_seconds: REPLAY_WINDOW_SECONDS,
        }
    }
}
