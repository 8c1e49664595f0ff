//! Resolving a DID to the Ed25519 key that speaks for it.
//!
//! This crate has no network or storage dependency of its own; resolution
//! here is a pluggable trait with an in-memory reference implementation, the
//! same way the audit store is kept abstract behind a trait rather than
//! wired to a concrete backend.

use std::collections::HashMap;

use parking_lot::RwLock;
use talos_core::Did;
use talos_crypto::Ed25519VerifyingKey;

/// Resolves a [`Did`] to the verifying key that speaks for it.
pub trait KeyResolver: Send + Sync {
    /// Look up the verifying key for `did`, if known.
    fn resolve(&self, did: &Did) -> Option<Ed25519VerifyingKey>;
}

/// An in-memory `did -> verifying key` registry.
#[derive(Default)]
pub struct InMemoryKeyResolver {
    keys: RwLock<HashMap<Did, Ed25519VerifyingKey>>,
}

impl InMemoryKeyResolver {
    /// Create an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the verifying key for `did`.
    pub fn register(&self, did: Did, key: Ed25519VerifyingKey) {
        self.keys.write().insert(did, key);
    }
}

impl KeyResolver for InMemoryKeyResolver {
    fn resolve(&self, did: &Did) -> Option<Ed25519VerifyingKey> {
        self.keys.read().get(did).copied()
    }
}
