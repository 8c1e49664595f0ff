use std::sync::Arc;

use talos_capability::{CapabilityManager, InMemoryKeyResolver};
use talos_core::config::ManagerConfig;
use talos_core::testkit::{FixedClock, SeededRng};
use talos_core::Clock;
use talos_crypto::generate_ed25519_signing_key;
use talos_gateway::{Gateway, GatewayConfig, GatewayRequest, GatewayStatus, InMemoryAuditSink, TenantConfig};

fn build_manager(clock: Arc<dyn Clock>, seed: u64) -> CapabilityManager {
    let resolver = Arc::new(InMemoryKeyResolver::new());
    let signing_key = generate_ed25519_signing_key();
    CapabilityManager::new(signing_key, resolver, clock, Arc::new(SeededRng::new(seed)), ManagerConfig::default())
}

#[test]
fn full_multi_tenant_flow_isolates_tenants_and_tools() {
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(1_700_000_000));
    let audit = Arc::new(InMemoryAuditSink::default());
    let gateway = Gateway::with_collaborators(GatewayConfig::default(), audit.clone(), clock.clone(), Arc::new(talos_core::CsRng));
    gateway.start();
    assert_eq!(gateway.status(), GatewayStatus::Running);

    let weather_session = [1u8; 16];
    let weather_manager = build_manager(clock.clone(), 1);
    let weather_subject = weather_manager.identity().clone();
    let weather_cap = weather_manager.grant(
        weather_subject,
        "tool:weather/method:get".to_string(),
        Default::default(),
        3600,
        false,
    );
    weather_manager.cache_session(weather_session, &weather_cap);

    let calendar_session = [2u8; 16];
    let calendar_manager = build_manager(clock.clone(), 2);
    let calendar_subject = calendar_manager.identity().clone();
    let calendar_cap = calendar_manager.grant(
        calendar_subject,
        "tool:calendar/method:list".to_string(),
        Default::default(),
        3600,
        false,
    );
    calendar_manager.cache_session(calendar_session, &calendar_cap);

    gateway
        .register_tenant(TenantConfig {
            tenant_id: "weather-co".to_string(),
            capability_manager: weather_manager,
            rate_limit_config: None,
            max_concurrent_sessions: 10,
            allowed_tools: Some(vec!["weather".to_string()]),
        })
        .unwrap();
    gateway
        .register_tenant(TenantConfig {
            tenant_id: "calendar-co".to_string(),
            capability_manager: calendar_manager,
            rate_limit_config: None,
            max_concurrent_sessions: 10,
            allowed_tools: None,
        })
        .unwrap();

    let allowed = gateway.authorize(GatewayRequest {
        request_id: "r1".to_string(),
        tenant_id: "weather-co".to_string(),
        session_id: weather_session,
        tool: "weather".to_string(),
        method: "get".to_string(),
        params: None,
        capability: None,
    });
    assert!(allowed.allowed);

    // weather-co's allowlist excludes calendar, even though the capability
    // manager would otherwise have no opinion on it.
    let tool_denied = gateway.authorize(GatewayRequest {
        request_id: "r2".to_string(),
        tenant_id: "weather-co".to_string(),
        session_id: weather_session,
        tool: "calendar".to_string(),
        method: "list".to_string(),
        params: None,
        capability: None,
    });
    assert!(!tool_denied.allowed);

    // calendar-co has no allowlist and its own cached session, independent
    // of weather-co's rate limiter and capability manager.
    let other_tenant = gateway.authorize(GatewayRequest {
        request_id: "r3".to_string(),
        tenant_id: "calendar-co".to_string(),
        session_id: calendar_session,
        tool: "calendar".to_string(),
        method: "list".to_string(),
        params: None,
        capability: None,
    });
    assert!(other_tenant.allowed);

    // weather-co's session id is meaningless to calendar-co's capability
    // manager: no cached entry there, so it is denied.
    let cross_tenant_session = gateway.authorize(GatewayRequest {
        request_id: "r4".to_string(),
        tenant_id: "calendar-co".to_string(),
        session_id: weather_session,
        tool: "calendar".to_string(),
        method: "list".to_string(),
        params: None,
        capability: None,
    });
    assert!(!cross_tenant_session.allowed);

    assert_eq!(audit.len(), 4);
    let health = gateway.health();
    assert_eq!(health.tenants, 2);
    assert_eq!(health.requests_processed, 2);

    let stats = gateway.tenant_stats("weather-co").unwrap();
    assert_eq!(stats.allowed_tools, Some(vec!["weather".to_string()]));
    assert_eq!(stats.active_sessions, 1);

    assert!(gateway.tenant_stats("no-such-tenant").is_none());
}

#[test]
fn stopping_the_gateway_stops_admitting_requests() {
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(1_700_000_000));
    let gateway = Gateway::with_collaborators(
        GatewayConfig::default(),
        Arc::new(InMemoryAuditSink::default()),
        clock.clone(),
        Arc::new(talos_core::CsRng),
    );
    gateway.start();

    let session_id = [7u8; 16];
    let manager = build_manager(clock, 3);
    let subject = manager.identity().clone();
    let cap = manager.grant(subject, "tool:weather/method:get".to_string(), Default::default(), 3600, false);
    manager.cache_session(session_id, &cap);
    gateway
        .register_tenant(TenantConfig {
            tenant_id: "tenant-a".to_string(),
            capability_manager: manager,
            rate_limit_config: None,
            max_concurrent_sessions: 10,
            allowed_tools: None,
        })
        .unwrap();

    assert!(gateway
        .authorize(GatewayRequest {
            request_id: "r1".to_string(),
            tenant_id: "tenant-a".to_string(),
            session_id,
            tool: "weather".to_string(),
            method: "get".to_string(),
            params: None,
            capability: None,
        })
        .allowed);

    gateway.stop();
    let response = gateway.authorize(GatewayRequest {
        request_id: "r2".to_string(),
        tenant_id: "tenant-a".to_string(),
        session_id,
        tool: "weather".to_string(),
        method: "get".to_string(),
        params: None,
        capability: None,
    });
    assert!(!response.allowed);
    assert!(response.error.unwrap().contains("not running"));
}
