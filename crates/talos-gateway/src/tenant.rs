//! Tenant registration and the request/response shapes passing through
//! the gateway.

use talos_capability::CapabilityManager;

use crate::config::RateLimitConfig;

/// One tenant's configuration: its own capability manager, an optional
/// rate-limit override, a concurrency cap, and an optional tool
/// allowlist.
pub struct TenantConfig {
    /// Unique tenant identifier.
    pub tenant_id: String,
    /// The capability manager authorizing this tenant's requests.
    pub capability_manager: CapabilityManager,
    /// Overrides the gateway's default rate-limit config when set.
    pub rate_limit_config: Option<RateLimitConfig>,
    /// Maximum concurrent sessions this tenant may hold.
    pub max_concurrent_sessions: usize,
    /// When set, only these tool names may be called; `None` allows all
    /// tools.
    pub allowed_tools: Option<Vec<String>>,
}

/// One request passing through the gateway.
pub struct GatewayRequest {
    /// Caller-supplied id this response correlates back to.
    pub request_id: String,
    /// Which tenant this request belongs to.
    pub tenant_id: String,
    /// The ratchet session this request travels over.
    pub session_id: [u8; 16],
    /// The target tool name.
    pub tool: String,
    /// The target method name.
    pub method: String,
    /// Constraint-relevant parameters extracted from the MCP call.
    pub params: Option<talos_capability::AuthParams>,
    /// A capability presented on the slow path (cache miss). `None` means
    /// only the session cache is consulted.
    pub capability: Option<talos_capability::Capability>,
}

/// The gateway's response to a [`GatewayRequest`].
#[derive(Debug, Clone)]
pub struct GatewayResponse {
    /// Echoes `GatewayRequest::request_id`.
    pub request_id: String,
    /// Whether the call was allowed.
    pub allowed: bool,
    /// The full authorization result, present whenever authorization was
    /// actually attempted (i.e. the gateway didn't short-circuit on
    /// status/tenant/tool checks before reaching it).
    pub result: Option<talos_core::AuthorizationResult>,
    /// A human-readable error, set when the gateway short-circuited
    /// before authorization (not running, unknown tenant, rate limited,
    /// tool not allowed).
    pub error: Option<String>,
    /// End-to-end latency measured from request receipt, in
    /// microseconds.
    pub latency_us: u64,
}
