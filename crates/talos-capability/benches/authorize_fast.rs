//! Benchmarks the session-cached fast path against the sub-millisecond
//! latency target a gateway under load depends on.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use talos_capability::{CapabilityManager, Constraints, InMemoryKeyResolver, KeyResolver};
use talos_core::config::ManagerConfig;
use talos_core::testkit::FixedClock;
use talos_core::{Clock, Did};
use talos_crypto::generate_ed25519_signing_key;

fn build_manager_with_cached_session() -> (CapabilityManager, [u8; 16]) {
    let key = generate_ed25519_signing_key();
    let resolver = Arc::new(InMemoryKeyResolver::new());
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(1_700_000_000));
    let rng = Arc::new(talos_core::rng::CsRng);
    let manager = CapabilityManager::new(
        key.clone(),
        resolver.clone() as Arc<dyn KeyResolver>,
        clock,
        rng,
        ManagerConfig::default(),
    );
    resolver.register(manager.identity().clone(), key.verifying_key());

    let subject = Did::from_public_key(&[5u8; 32]);
    let session_id = [7u8; 16];
    let cap = manager.grant(
        subject,
        "tool:weather/method:get".to_string(),
        Constraints::new(),
        3600,
        false,
    );
    manager.cache_session(session_id, &cap);
    (manager, session_id)
}

fn authorize_fast_benchmark(c: &mut Criterion) {
    let (manager, session_id) = build_manager_with_cached_session();
    c.bench_function("authorize_fast cached hit", |b| {
        b.iter(|| manager.authorize_fast(black_box(session_id), black_box("weather"), black_box("get"), None))
    });
}

criterion_group!(benches, authorize_fast_benchmark);
criterion_main!(benches);
