//! The closed authorization outcome type every verification and policy
//! check in the workspace collapses to.

use serde::{Deserialize, Serialize};

/// The reason an authorization attempt was denied.
///
/// This is the single closed enumeration referenced throughout the
/// specification: every verification error (`talos-capability`,
/// `talos-frame`) and policy error (`talos-gateway`) is surfaced as one of
/// these variants, never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DenialReason {
    /// No capability was presented and none was cached for the session.
    NoCapability,
    /// The capability's `expires_at` is in the past.
    Expired,
    /// The capability's id (or an ancestor's id) is in the revocation table.
    Revoked,
    /// The capability's scope does not cover the requested scope, or a
    /// constraint check failed.
    ScopeMismatch,
    /// A delegation violated a structural invariant (depth, scope
    /// widening, expiry widening, non-delegatable parent).
    DelegationInvalid,
    /// The requested tool is not recognized by the gateway.
    UnknownTool,
    /// The frame's `(session_id, correlation_id)` was already seen within
    /// the replay window.
    Replay,
    /// An Ed25519 signature failed to verify.
    SignatureInvalid,
    /// The session exhausted its rate-limit token bucket.
    RateLimited,
    /// The tool is not on the tenant's allowlist.
    ToolNotAllowed,
    /// The frame was missing required fields or carried unknown ones.
    InvalidFrame,
}

impl DenialReason {
    /// Whether this denial is security-relevant enough to log at `warn!`
    /// rather than `debug!`.
    pub fn is_security_relevant(self) -> bool {
        matches!(self, DenialReason::Revoked | DenialReason::SignatureInvalid)
    }
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// The outcome of a single authorization attempt, either full
/// (`authorize`) or cached (`authorize_fast`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationResult {
    /// Whether the call is allowed.
    pub allowed: bool,
    /// Set when `allowed` is false.
    pub reason: Option<DenialReason>,
    /// The capability that authorized the call, when allowed.
    pub capability_id: Option<String>,
    /// A human-readable detail message, primarily for audit logs.
    pub message: Option<String>,
    /// Wall-clock latency of the authorization check, in microseconds.
    pub latency_us: u64,
    /// Whether this result came from the session cache (fast path) rather
    /// than a full signature verification (slow path).
    pub cached: bool,
}

impl AuthorizationResult {
    /// Build an `Allowed` result.
    pub fn allowed(capability_id: impl Into<String>, latency_us: u64, cached: bool) -> Self {
        Self {
            allowed: true,
            reason: None,
            capability_id: Some(capability_id.into()),
            message: None,
            latency_us,
            cached,
        }
    }

    /// Build a `Denied` result.
    pub fn denied(reason: DenialReason, latency_us: u64) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
            capability_id: None,
            message: None,
            latency_us,
            cached: false,
        }
    }

    /// Attach a capability id to a denied result (e.g. a capability that
    /// verified but was out of scope), for audit purposes.
    pub fn with_capability_id(mut self, capability_id: impl Into<String>) -> Self {
        self.capability_id = Some(capability_id.into());
        self
    }

    /// Attach a human-readable message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}
