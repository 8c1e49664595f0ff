//! Deployment-tunable gateway configuration, matching the teacher's
//! `AmpRuntimeConfig` pattern: values a deployment might reasonably
//! override live here as `Default`-implementing structs.

use talos_core::RATE_LIMITER_MAX_SESSIONS;

/// Token-bucket rate-limit parameters for one tenant's sessions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitConfig {
    /// Tokens replenished per second (the bucket's refill rate).
    pub requests_per_second: f64,
    /// Bucket capacity; also the number of tokens a freshly created
    /// session counter starts with.
    pub burst_size: u32,
    /// Carried over from the original sliding-window config surface for
    /// parity; the continuous-refill formula below does not consume it.
    pub window_seconds: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 100.0,
            burst_size: 10,
            window_seconds: 1.0,
        }
    }
}

/// Tunables for the gateway and its per-tenant rate limiters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GatewayConfig {
    /// Default rate-limit config for tenants that don't override it.
    pub default_rate_limit: RateLimitConfig,
    /// Per-tenant default for `max_concurrent_sessions` when a
    /// [`crate::tenant::TenantConfig`] doesn't set one.
    pub default_max_concurrent_sessions: usize,
    /// Sessions tracked by one tenant's rate limiter before the oldest
    /// 10% are evicted.
    pub rate_limiter_max_sessions: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            default_rate_limit: RateLimitConfig::default(),
            default_max_concurrent_sessions: 1000,
            rate_limiter_max_sessions: RATE_LIMITER_MAX_SESSIONS,
        }
    }
}
