//! `Gateway`: the multi-tenant enforcement proxy tying tenant routing,
//! rate limiting, and audit recording into one `authorize` call.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use talos_core::{Clock, DenialReason, SecureRng, SystemClock};
use time::OffsetDateTime;

use crate::audit::{fresh_event_id, AuditEvent, AuditEventType, AuditSink, InMemoryAuditSink};
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::rate_limiter::RateLimiter;
use crate::tenant::{GatewayRequest, GatewayResponse, TenantConfig};

/// The gateway's operational status. Operations other than construction
/// and `start`/`stop` require `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayStatus {
    /// Constructed but not yet started.
    Starting,
    /// Accepting `authorize` calls.
    Running,
    /// Draining; no new calls should be admitted (not enforced here —
    /// the caller stops submitting work).
    Stopping,
    /// Fully stopped.
    Stopped,
}

/// Central enforcement proxy for multi-tenant capability routing.
/// Optional: the protocol is fully usable by two peers exchanging frames
/// directly, without a `Gateway` in between.
pub struct Gateway {
    tenants: parking_lot::RwLock<HashMap<String, TenantConfig>>,
    rate_limiters: parking_lot::RwLock<HashMap<String, RateLimiter>>,
    audit: Arc<dyn AuditSink>,
    config: GatewayConfig,
    clock: Arc<dyn Clock>,
    rng: Arc<dyn SecureRng>,
    status: parking_lot::RwLock<GatewayStatus>,
    requests_processed: AtomicU64,
    started_at: parking_lot::RwLock<Option<OffsetDateTime>>,
}

impl Gateway {
    /// Build a gateway with an in-memory audit sink and the system
    /// clock/RNG.
    pub fn new(config: GatewayConfig) -> Self {
        Self::with_collaborators(config, Arc::new(InMemoryAuditSink::default()), Arc::new(SystemClock), Arc::new(talos_core::CsRng))
    }

    /// Build a gateway with explicit collaborators, for tests or a
    /// deployment wiring in a persistent audit sink.
    pub fn with_collaborators(
        config: GatewayConfig,
        audit: Arc<dyn AuditSink>,
        clock: Arc<dyn Clock>,
        rng: Arc<dyn SecureRng>,
    ) -> Self {
        Self {
            tenants: parking_lot::RwLock::new(HashMap::new()),
            rate_limiters: parking_lot::RwLock::new(HashMap::new()),
            audit,
            config,
            clock,
            rng,
            status: parking_lot::RwLock::new(GatewayStatus::Starting),
            requests_processed: AtomicU64::new(0),
            started_at: parking_lot::RwLock::new(None),
        }
    }

    /// Register a tenant. Fails if `tenant_id` is already registered.
    pub fn register_tenant(&self, config: TenantConfig) -> Result<(), GatewayError> {
        let mut tenants = self.tenants.write();
        if tenants.contains_key(&config.tenant_id) {
            return Err(GatewayError::DuplicateTenant(config.tenant_id));
        }

        let rate_config = config.rate_limit_config.unwrap_or(self.config.default_rate_limit);
        let limiter = RateLimiter::new(rate_config, self.clock.clone(), self.config.rate_limiter_max_sessions);
        self.rate_limiters.write().insert(config.tenant_id.clone(), limiter);

        tracing::info!(tenant_id = %config.tenant_id, "registered tenant");
        tenants.insert(config.tenant_id.clone(), config);
        Ok(())
    }

    /// Unregister a tenant, dropping its rate limiter. Returns whether a
    /// tenant was actually removed.
    pub fn unregister_tenant(&self, tenant_id: &str) -> bool {
        let removed = self.tenants.write().remove(tenant_id).is_some();
        if removed {
            self.rate_limiters.write().remove(tenant_id);
            tracing::info!(tenant_id, "unregistered tenant");
        }
        removed
    }

    /// Transition to `Running`, recording the start time.
    pub fn start(&self) {
        *self.status.write() = GatewayStatus::Running;
        *self.started_at.write() = Some(OffsetDateTime::now_utc());
        tracing::info!("gateway started");
    }

    /// Transition to `Stopping`.
    pub fn stop_draining(&self) {
        *self.status.write() = GatewayStatus::Stopping;
    }

    /// Transition to `Stopped`.
    pub fn stop(&self) {
        *self.status.write() = GatewayStatus::Stopped;
        tracing::info!("gateway stopped");
    }

    /// The gateway's current status.
    pub fn status(&self) -> GatewayStatus {
        *self.status.read()
    }

    /// Number of registered tenants.
    pub fn tenant_count(&self) -> usize {
        self.tenants.read().len()
    }

    /// Authorize one request: check the gateway is running, resolve the
    /// tenant, enforce its rate limit and tool allowlist, delegate to its
    /// capability manager's fast path, and record an audit event for the
    /// outcome either way.
    pub fn authorize(&self, request: GatewayRequest) -> GatewayResponse {
        let start = self.clock.now_monotonic();

        if self.status() != GatewayStatus::Running {
            return GatewayResponse {
                request_id: request.request_id,
                allowed: false,
                result: None,
                error: Some(format!("gateway not running: {:?}", self.status())),
                latency_us: elapsed_us(self.clock.as_ref(), start),
            };
        }

        let tenants = self.tenants.read();
        let Some(tenant) = tenants.get(&request.tenant_id) else {
            return GatewayResponse {
                request_id: request.request_id.clone(),
                allowed: false,
                result: None,
                error: Some(format!("unknown tenant: {}", request.tenant_id)),
                latency_us: elapsed_us(self.clock.as_ref(), start),
            };
        };

        let rate_limiters = self.rate_limiters.read();
        if let Some(limiter) = rate_limiters.get(&request.tenant_id) {
            if !limiter.allow(request.session_id) {
                let latency_us = elapsed_us(self.clock.as_ref(), start);
                self.record(&request, None, false, Some(DenialReason::RateLimited), latency_us);
                return GatewayResponse {
                    request_id: request.request_id,
                    allowed: false,
                    result: None,
                    error: Some("rate limit exceeded".to_string()),
                    latency_us,
                };
            }
        }
        drop(rate_limiters);

        if let Some(allowed_tools) = &tenant.allowed_tools {
            if !allowed_tools.iter().any(|t| t == &request.tool) {
                let latency_us = elapsed_us(self.clock.as_ref(), start);
                self.record(&request, None, false, Some(DenialReason::ToolNotAllowed), latency_us);
                return GatewayResponse {
                    request_id: request.request_id.clone(),
                    allowed: false,
                    result: None,
                    error: Some(format!("tool not allowed: {}", request.tool)),
                    latency_us,
                };
            }
        }

        let result = tenant.capability_manager.authorize_fast(
            request.session_id,
            &request.tool,
            &request.method,
            request.params.as_ref(),
        );
        drop(tenants);

        self.requests_processed.fetch_add(1, Ordering::Relaxed);
        let latency_us = elapsed_us(self.clock.as_ref(), start);
        self.record(&request, result.capability_id.clone(), result.allowed, result.reason, latency_us);

        GatewayResponse {
            request_id: request.request_id,
            allowed: result.allowed,
            result: Some(result),
            error: None,
            latency_us,
        }
    }

    fn record(
        &self,
        request: &GatewayRequest,
        capability_id: Option<String>,
        allowed: bool,
        denial_reason: Option<DenialReason>,
        latency_us: u64,
    ) {
        if let Some(reason) = denial_reason {
            if reason.is_security_relevant() {
                tracing::warn!(tenant_id = %request.tenant_id, ?reason, "denied (security-relevant)");
            } else {
                tracing::debug!(tenant_id = %request.tenant_id, ?reason, "denied");
            }
        }

        let event = AuditEvent {
            event_id: fresh_event_id(self.rng.session_id()),
            event_type: if allowed { AuditEventType::Authorization } else { AuditEventType::Denial },
            timestamp: OffsetDateTime::now_utc(),
            agent_id: request.tenant_id.clone(),
            tool: request.tool.clone(),
            method: request.method.clone(),
            capability_id,
            allowed,
            denial_reason,
            latency_us,
            session_id: Some(hex::encode(request.session_id)),
        };
        self.audit.append(event);
    }

    /// A snapshot of gateway health.
    pub fn health(&self) -> GatewayHealth {
        let status = self.status();
        let started_at = *self.started_at.read();
        let uptime_seconds = match (started_at, status) {
            (Some(started_at), GatewayStatus::Running) => {
                (OffsetDateTime::now_utc() - started_at).whole_seconds().max(0) as u64
            }
            _ => 0,
        };
        GatewayHealth {
            status,
            tenants: self.tenant_count(),
            requests_processed: self.requests_processed.load(Ordering::Relaxed),
            uptime_seconds,
        }
    }

    /// Per-tenant statistics, or `None` if `tenant_id` is not registered.
    pub fn tenant_stats(&self, tenant_id: &str) -> Option<TenantStats> {
        let tenants = self.tenants.read();
        let tenant = tenants.get(tenant_id)?;
        let active_sessions = self
            .rate_limiters
            .read()
            .get(tenant_id)
            .map(|limiter| limiter.active_sessions())
            .unwrap_or(0);
        Some(TenantStats {
            tenant_id: tenant_id.to_string(),
            allowed_tools: tenant.allowed_tools.clone(),
            max_concurrent_sessions: tenant.max_concurrent_sessions,
            active_sessions,
        })
    }
}

/// A point-in-time health summary.
#[derive(Debug, Clone)]
pub struct GatewayHealth {
    /// Current status.
    pub status: GatewayStatus,
    /// Registered tenant count.
    pub tenants: usize,
    /// Total requests authorized since construction.
    pub requests_processed: u64,
    /// Seconds since `start()`, zero unless `Running`.
    pub uptime_seconds: u64,
}

/// Per-tenant statistics returned by [`Gateway::tenant_stats`].
#[derive(Debug, Clone)]
pub struct TenantStats {
    /// The tenant this snapshot describes.
    pub tenant_id: String,
    /// The tenant's tool allowlist, if any.
    pub allowed_tools: Option<Vec<String>>,
    /// The tenant's configured concurrency cap.
    pub max_concurrent_sessions: usize,
    /// Sessions currently tracked by the tenant's rate limiter.
    pub active_sessions: usize,
}

fn elapsed_us(clock: &dyn Clock, start: std::time::Instant) -> u64 {
    clock.now_monotonic().saturating_duration_since(start).as_micros() as u64
}
