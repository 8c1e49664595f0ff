//! Multi-tenant enforcement proxy: tenant routing, per-session rate
//! limiting, and audit recording layered over `talos-capability`'s
//! authorization fast path. Optional — the protocol is fully usable by
//! two peers exchanging frames directly.

mod audit;
mod config;
mod error;
mod gateway;
mod rate_limiter;
mod tenant;

pub use audit::{fresh_event_id, AuditEvent, AuditEventType, AuditSink, InMemoryAuditSink};
pub use config::{GatewayConfig, RateLimitConfig};
pub use error::GatewayError;
pub use gateway::{Gateway, GatewayHealth, GatewayStatus, TenantStats};
pub use rate_limiter::RateLimiter;
pub use tenant::{GatewayRequest, GatewayResponse, TenantConfig};

/// Standard result type for fallible gateway administration operations.
pub type Result<T> = std::result::Result<T, GatewayError>;
