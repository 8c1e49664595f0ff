//! `CapabilityManager`: grant, verify, delegate, revoke, and the
//! fast/slow authorization paths, tying together every other module in
//! this crate.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use talos_core::clock::Clock;
use talos_core::config::ManagerConfig;
use talos_core::rng::SecureRng;
use talos_core::{AuthorizationResult, DenialReason, Did};
use talos_crypto::Ed25519SigningKey;

use crate::cache::{SessionCache, SessionCacheEntry};
use crate::capability::{Capability, CapabilityBuilder};
use crate::constraints::{narrow, AuthParams, Constraints};
use crate::errors::CapabilityError;
use crate::key_resolver::KeyResolver;
use crate::revocation::{RevocationEntry, RevocationTable};
use crate::scope::{scope_covers, scope_covers_wildcard, tool_method_scope};

/// Grants, verifies, delegates, and revokes capabilities; owns the
/// session cache and revocation index.
pub struct CapabilityManager {
    identity: Did,
    signing_key: Ed25519SigningKey,
    key_resolver: Arc<dyn KeyResolver>,
    clock: Arc<dyn Clock>,
    rng: Arc<dyn SecureRng>,
    config: ManagerConfig,
    issued: parking_lot::RwLock<HashMap<String, Capability>>,
    revocations: parking_lot::RwLock<RevocationTable>,
    revoked_hashes: parking_lot::RwLock<HashSet<[u8; 32]>>,
    cache: parking_lot::RwLock<SessionCache>,
}

impl CapabilityManager {
    /// Build a manager whose identity is derived from `signing_key`, with
    /// the given key resolver, clock, rng, and config.
    pub fn new(
        signing_key: Ed25519SigningKey,
        key_resolver: Arc<dyn KeyResolver>,
        clock: Arc<dyn Clock>,
        rng: Arc<dyn SecureRng>,
        config: ManagerConfig,
    ) -> Self {
        let identity = Did::from_public_key(signing_key.verifying_key().as_bytes());
        Self {
            identity,
            signing_key,
            key_resolver,
            clock,
            rng,
            config,
            issued: parking_lot::RwLock::new(HashMap::new()),
            revocations: parking_lot::RwLock::new(RevocationTable::new()),
            revoked_hashes: parking_lot::RwLock::new(HashSet::new()),
            cache: parking_lot::RwLock::new(SessionCache::new(config.session_cache_max)),
        }
    }

    /// This manager's own DID (the `issuer` of capabilities it grants).
    pub fn identity(&self) -> &Did {
        &self.identity
    }

    fn fresh_capability_id(&self) -> String {
        let mut bytes = [0u8; 16];
        self.rng.fill_bytes(&mut bytes);
        let uuid = uuid::Builder::from_random_bytes(bytes).into_uuid();
        format!("cap_{uuid}")
    }

    /// Issue a fresh capability from this manager's identity to `subject`.
    pub fn grant(
        &self,
        subject: Did,
        scope: String,
        constraints: Constraints,
        expires_in: i64,
        delegatable: bool,
    ) -> Capability {
        let now = self.clock.now_unix();
        let mut cap = CapabilityBuilder::new(
            self.fresh_capability_id(),
            self.identity.clone(),
            subject,
            scope,
            now,
            now + expires_in,
        )
        .constraints(constraints)
        .delegatable(delegatable)
        .build();
        cap.sign(&self.signing_key);
        self.issued.write().insert(cap.id.clone(), cap.clone());
        cap
    }

    /// Verify a capability's freshness, revocation status, signature,
    /// requested scope, and (if given) call parameters against its
    /// constraints — the slow path, used once per session before its
    /// result is cached for [`Self::authorize_fast`].
    pub fn verify(
        &self,
        capability: &Capability,
        requested_scope: Option<&str>,
        params: Option<&AuthParams>,
    ) -> Result<(), CapabilityError> {
        let now = self.clock.now_unix();

        if capability.issued_at > now + self.config.clock_skew_seconds {
            return Err(CapabilityError::FutureDated(
                "issued_at is beyond the tolerated clock skew".to_string(),
            ));
        }
        if now > capability.expires_at {
            return Err(CapabilityError::Expired);
        }
        if let Some(id) = self.revocations.read().any_revoked(
            &capability.id,
            capability.delegation_chain.iter().map(String::as_str),
        ) {
            return Err(CapabilityError::Revoked(id));
        }
        let issuer_key = self
            .key_resolver
            .resolve(&capability.issuer)
            .ok_or_else(|| CapabilityError::SignatureInvalid("unknown issuer".to_string()))?;
        capability.verify_signature(&issuer_key)?;

        if let Some(requested_scope) = requested_scope {
            if !scope_covers(&capability.scope, requested_scope) {
                return Err(CapabilityError::ScopeViolation);
            }
        }
        if let Some(params) = params {
            if !crate::constraints::check_constraints(&capability.constraints, params) {
                return Err(CapabilityError::ScopeViolation);
            }
        }
        Ok(())
    }

    /// Delegate `parent` to `new_subject`, optionally narrowing its scope,
    /// constraints, and expiry. Signed by this manager's identity, which
    /// becomes the delegated capability's `issuer`.
    pub fn delegate(
        &self,
        parent: &Capability,
        new_subject: Did,
        narrowed_scope: Option<String>,
        narrowed_constraints: Option<Constraints>,
        expires_in: Option<i64>,
    ) -> Result<Capability, CapabilityError> {
        self.verify(parent, None, None)?;
        if !parent.delegatable {
            return Err(CapabilityError::DelegationInvalid(
                "parent capability is not delegatable".to_string(),
            ));
        }
        if parent.delegation_chain.len() >= self.config.max_delegation_depth {
            return Err(CapabilityError::DelegationInvalid(
                "maximum delegation depth exceeded".to_string(),
            ));
        }

        let scope = match narrowed_scope {
            Some(scope) => {
                if !scope_covers(&parent.scope, &scope) {
                    return Err(CapabilityError::DelegationInvalid(
                        "narrowed scope is not covered by the parent's scope".to_string(),
                    ));
                }
                scope
            }
            None => parent.scope.clone(),
        };

        let constraints = match narrowed_constraints {
            Some(narrowed) => narrow(&parent.constraints, &narrowed)?,
            None => parent.constraints.clone(),
        };

        let now = self.clock.now_unix();
        let requested_expiry = expires_in.map(|secs| now + secs).unwrap_or(parent.expires_at);
        let expires_at = requested_expiry.min(parent.expires_at);

        let mut chain = parent.delegation_chain.clone();
        chain.push(parent.id.clone());

        let mut child = CapabilityBuilder::new(
            self.fresh_capability_id(),
            self.identity.clone(),
            new_subject,
            scope,
            now,
            expires_at,
        )
        .constraints(constraints)
        .delegatable(false)
        .delegation_chain(chain)
        .build();
        child.sign(&self.signing_key);
        self.issued.write().insert(child.id.clone(), child.clone());
        Ok(child)
    }

    /// Record a revocation. Idempotent.
    pub fn revoke(&self, capability: &Capability, reason: impl Into<String>) {
        self.revocations.write().revoke(RevocationEntry {
            capability_id: capability.id.clone(),
            revoked_at: self.clock.now_unix(),
            reason: reason.into(),
            revoked_by: self.identity.clone(),
        });
        self.revoked_hashes.write().insert(capability.canonical_hash());
    }

    /// Revoke by id alone (e.g. when the capability object itself is not
    /// at hand, only its id and hash).
    pub fn revoke_by_id(&self, capability_id: impl Into<String>, capability_hash: [u8; 32], reason: impl Into<String>) {
        self.revocations.write().revoke(RevocationEntry {
            capability_id: capability_id.into(),
            revoked_at: self.clock.now_unix(),
            reason: reason.into(),
            revoked_by: self.identity.clone(),
        });
        self.revoked_hashes.write().insert(capability_hash);
    }

    /// The canonical slow path: verify a capability against a `(tool,
    /// method)` call and return the outcome, along with how long
    /// verification took.
    pub fn authorize(
        &self,
        capability: Option<&Capability>,
        tool: &str,
        method: &str,
    ) -> AuthorizationResult {
        let start = self.clock.now_monotonic();
        let Some(capability) = capability else {
            return self.denied(DenialReason::NoCapability, start);
        };
        if tool.is_empty() || method.is_empty() {
            return self.denied(DenialReason::ScopeMismatch, start);
        }
        let scope = tool_method_scope(tool, method);
        match self.verify(capability, Some(&scope), None) {
            Ok(()) => self.allowed(&capability.id, start, false),
            Err(err) => self
                .denied(err.to_denial_reason(), start)
                .with_capability_id(capability.id.clone()),
        }
    }

    /// The hot path: check a cached, already-verified session entry
    /// against a `(tool, method)` call without touching a signature.
    #[tracing::instrument(skip(self, params))]
    pub fn authorize_fast(
        &self,
        session_id: [u8; 16],
        tool: &str,
        method: &str,
        params: Option<&AuthParams>,
    ) -> AuthorizationResult {
        let start = self.clock.now_monotonic();
        let now = self.clock.now_unix();

        let mut cache = self.cache.write();
        let Some(entry) = cache.get_mut(&session_id) else {
            drop(cache);
            return self.denied(DenialReason::NoCapability, start);
        };
        entry.last_used = now;

        if now > entry.expires_at {
            let capability_id = entry.capability_id.clone();
            cache.remove(&session_id);
            drop(cache);
            tracing::warn!(capability_id = %capability_id, "session cache entry expired");
            return self.denied(DenialReason::Expired, start);
        }
        if self.revoked_hashes.read().contains(&entry.capability_hash) {
            let capability_id = entry.capability_id.clone();
            drop(cache);
            tracing::warn!(capability_id = %capability_id, "cached capability was revoked");
            return self.denied(DenialReason::Revoked, start);
        }

        let requested_scope = tool_method_scope(tool, method);
        if !scope_covers_wildcard(&entry.scope, &requested_scope) {
            let capability_id = entry.capability_id.clone();
            drop(cache);
            return self
                .denied(DenialReason::ScopeMismatch, start)
                .with_capability_id(capability_id);
        }
        if let Some(params) = params {
            if !crate::constraints::check_constraints(&entry.constraints, params) {
                let capability_id = entry.capability_id.clone();
                drop(cache);
                return self
                    .denied(DenialReason::ScopeMismatch, start)
                    .with_capability_id(capability_id);
            }
        }

        let capability_id = entry.capability_id.clone();
        drop(cache);
        self.allowed(&capability_id, start, true)
    }

    /// Populate the session cache after a successful slow-path verify.
    pub fn cache_session(&self, session_id: [u8; 16], capability: &Capability) {
        let now = self.clock.now_unix();
        let entry = SessionCacheEntry {
            session_id,
            capability_id: capability.id.clone(),
            capability_hash: capability.canonical_hash(),
            subject: capability.subject.clone(),
            scope: capability.scope.clone(),
            issuer: capability.issuer.clone(),
            verified_at: now,
            expires_at: capability.expires_at,
            last_used: now,
            constraints: capability.constraints.clone(),
        };
        self.cache.write().insert(entry);
    }

    /// Remove a session's cache entry, if present.
    pub fn invalidate_session(&self, session_id: [u8; 16]) -> bool {
        self.cache.write().remove(&session_id)
    }

    fn allowed(&self, capability_id: &str, start: std::time::Instant, cached: bool) -> AuthorizationResult {
        let latency_us = self.clock.now_monotonic().duration_since(start).as_micros() as u64;
        AuthorizationResult::allowed(capability_id, latency_us, cached)
    }

    fn denied(&self, reason: DenialReason, start: std::time::Instant) -> AuthorizationResult {
        let latency_us = self.clock.now_monotonic().duration_since(start).as_micros() as u64;
        AuthorizationResult::denied(reason, latency_us)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use talos_core::testkit::FixedClock;
    use talos_crypto::generate_ed25519_signing_key;

    fn manager() -> (CapabilityManager, Arc<crate::key_resolver::InMemoryKeyResolver>) {
        let key = generate_ed25519_signing_key();
        let resolver = Arc::new(crate::key_resolver::InMemoryKeyResolver::new());
        let clock = Arc::new(FixedClock::new(1_700_000_000));
        let rng = Arc::new(talos_core::rng::CsRng);
        let manager = CapabilityManager::new(
            key.clone(),
            resolver.clone() as Arc<dyn KeyResolver>,
            clock,
            rng,
            ManagerConfig::default(),
        );
        resolver.register(manager.identity().clone(), key.verifying_key());
        (manager, resolver)
    }

    #[test]
    fn grant_then_authorize_is_allowed() {
        let (manager, _resolver) = manager();
        let subject = Did::from_public_key(&[5u8; 32]);
        let cap = manager.grant(
            subject,
            "tool:weather/method:get".to_string(),
            Constraints::new(),
            3600,
            false,
        );
        let result = manager.authorize(Some(&cap), "weather", "get");
        assert!(result.allowed);
    }

    #[test]
    fn revoked_capability_is_denied() {
        let (manager, _resolver) = manager();
        let subject = Did::from_public_key(&[5u8; 32]);
        let cap = manager.grant(
            subject,
            "tool:weather/method:get".to_string(),
            Constraints::new(),
            3600,
            false,
        );
        manager.revoke(&cap, "compromised key");
        let result = manager.authorize(Some(&cap), "weather", "get");
        assert!(!result.allowed);
        assert_eq!(result.reason, Some(DenialReason::Revoked));
    }

    #[test]
    fn delegation_cannot_widen_scope() {
        let (manager, _resolver) = manager();
        let subject = Did::from_public_key(&[5u8; 32]);
        let parent = manager.grant(
            subject,
            "tool:weather/method:get".to_string(),
            Constraints::new(),
            3600,
            true,
        );
        let grandchild = Did::from_public_key(&[6u8; 32]);
        let result = manager.delegate(&parent, grandchild, Some("tool:ocean/method:get".to_string()), None, None);
        assert!(result.is_err());
    }

    #[test]
    fn fast_path_denies_uncached_session() {
        let (manager, _resolver) = manager();
        let result = manager.authorize_fast([1u8; 16], "weather", "get", None);
        assert!(!result.allowed);
        assert_eq!(result.reason, Some(DenialReason::NoCapability));
    }

    #[test]
    fn fast_path_allows_after_cache_session() {
        let (manager, _resolver) = manager();
        let subject = Did::from_public_key(&[5u8; 32]);
        let cap = manager.grant(
            subject,
            "tool:weather/method:get".to_string(),
            Constraints::new(),
            3600,
            false,
        );
        manager.cache_session([1u8; 16], &cap);
        let result = manager.authorize_fast([1u8; 16], "weather", "get", None);
        assert!(result.allowed);
        assert!(result.cached);
    }

    #[test]
    fn fast_path_sees_revocation() {
        let (manager, _resolver) = manager();
        let subject = Did::from_public_key(&[5u8; 32]);
        let cap = manager.grant(
            subject,
            "tool:weather/method:get".to_string(),
            Constraints::new(),
            3600,
            false,
        );
        manager.cache_session([1u8; 16], &cap);
        manager.revoke(&cap, "compromised");
        let result = manager.authorize_fast([1u8; 16], "weather", "get", None);
        assert!(!result.allowed);
        assert_eq!(result.reason, Some(DenialReason::Revoked));
    }
}
