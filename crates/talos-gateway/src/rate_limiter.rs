//! Per-session sliding-window token bucket, monotonic-clock based so it
//! is immune to wall-clock adjustments.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use talos_core::Clock;

use crate::config::RateLimitConfig;

/// One session's token bucket.
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(config: &RateLimitConfig, now: Instant) -> Self {
        Self {
            tokens: config.burst_size as f64,
            last_update: now,
        }
    }

    /// Refill by elapsed time, then consume one token if available.
    fn allow(&mut self, config: &RateLimitConfig, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.last_update).as_secs_f64();
        self.last_update = now;
        self.tokens = (self.tokens + elapsed * config.requests_per_second).min(config.burst_size as f64);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Per-session rate limiting for one tenant.
///
/// Each session gets its own token bucket, guarded independently so
/// concurrent requests on different sessions never contend on one lock:
/// the outer map is guarded for lookup/insert, each bucket is then locked
/// exclusively for its own `allow` call.
pub struct RateLimiter {
    config: RateLimitConfig,
    clock: Arc<dyn Clock>,
    max_sessions: usize,
    buckets: parking_lot::RwLock<HashMap<[u8; 16], parking_lot::Mutex<TokenBucket>>>,
}

impl RateLimiter {
    /// Build a rate limiter with the given config and session cap.
    pub fn new(config: RateLimitConfig, clock: Arc<dyn Clock>, max_sessions: usize) -> Self {
        Self {
            config,
            clock,
            max_sessions,
            buckets: parking_lot::RwLock::new(HashMap::new()),
        }
    }

    /// Check and consume one token for `session_id`, creating its bucket
    /// on first use.
    pub fn allow(&self, session_id: [u8; 16]) -> bool {
        let now = self.clock.now_monotonic();
        {
            let buckets = self.buckets.read();
            if let Some(bucket) = buckets.get(&session_id) {
                return bucket.lock().allow(&self.config, now);
            }
        }

        let mut buckets = self.buckets.write();
        if !buckets.contains_key(&session_id) {
            if buckets.len() >= self.max_sessions {
                self.evict_locked(&mut buckets);
            }
            buckets.insert(session_id, parking_lot::Mutex::new(TokenBucket::new(&self.config, now)));
        }
        buckets
            .get(&session_id)
            .expect("just inserted")
            .lock()
            .allow(&self.config, now)
    }

    /// Drop a session's bucket, e.g. on session teardown.
    pub fn remove_session(&self, session_id: &[u8; 16]) -> bool {
        self.buckets.write().remove(session_id).is_some()
    }

    /// Number of sessions currently tracked.
    pub fn active_sessions(&self) -> usize {
        self.buckets.read().len()
    }

    /// Drop the `max(1, len / 10)` least-recently-used sessions, ranked by
    /// each bucket's `last_update`.
    fn evict_locked(&self, buckets: &mut HashMap<[u8; 16], parking_lot::Mutex<TokenBucket>>) {
        let to_remove = (buckets.len() / 10).max(1);
        let mut by_age: Vec<([u8; 16], Instant)> = buckets
            .iter()
            .map(|(id, bucket)| (*id, bucket.lock().last_update))
            .collect();
        by_age.sort_by_key(|(_, last_update)| *last_update);
        for (victim, _) in by_age.into_iter().take(to_remove) {
            buckets.remove(&victim);
        }
    }
}
