//! The session cache: a bounded map from `session_id` to the verified
//! capability facts `authorize_fast` needs, so the hot path never touches
//! a signature.

use std::collections::HashMap;

use talos_core::Did;

use crate::constraints::Constraints;

/// How many of the oldest-by-`last_used` entries to evict at once when the
/// cache is at capacity.
pub const EVICT_BATCH: usize = 100;

/// A cached, already-verified capability fact, keyed by session id.
#[derive(Debug, Clone)]
pub struct SessionCacheEntry {
    /// The session this entry belongs to (16 bytes, from the frame layer).
    pub session_id: [u8; 16],
    /// The capability this entry was populated from.
    pub capability_id: String,
    /// `sha256(canonical(capability))`, cross-referenced against the
    /// revocation-hash set on every fast-path lookup.
    pub capability_hash: [u8; 32],
    /// The capability's subject.
    pub subject: Did,
    /// The capability's scope.
    pub scope: String,
    /// The capability's issuer.
    pub issuer: Did,
    /// When this entry was populated by a full verify.
    pub verified_at: i64,
    /// The capability's expiry; the fast path evicts on expiry rather than
    /// consulting the capability's own fields again.
    pub expires_at: i64,
    /// Updated on every fast-path lookup; the eviction policy's recency
    /// signal.
    pub last_used: i64,
    /// The capability's constraints, for fast-path constraint checks.
    pub constraints: Constraints,
}

/// A bounded `session_id -> SessionCacheEntry` map with batch LRU eviction.
///
/// Not internally synchronized; `CapabilityManager` guards access with its
/// own `parking_lot::RwLock`.
#[derive(Debug, Default)]
pub struct SessionCache {
    entries: HashMap<[u8; 16], SessionCacheEntry>,
    max_entries: usize,
}

impl SessionCache {
    /// An empty cache bounded at `max_entries`.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            max_entries,
        }
    }

    /// Fetch the entry for `session_id`, if cached.
    pub fn get(&self, session_id: &[u8; 16]) -> Option<&SessionCacheEntry> {
        self.entries.get(session_id)
    }

    /// Fetch the entry for `session_id` mutably, if cached.
    pub fn get_mut(&mut self, session_id: &[u8; 16]) -> Option<&mut SessionCacheEntry> {
        self.entries.get_mut(session_id)
    }

    /// Insert or replace the entry for `session_id`, evicting the oldest
    /// [`EVICT_BATCH`] entries first if the cache is already at capacity.
    pub fn insert(&mut self, entry: SessionCacheEntry) {
        if self.entries.len() >= self.max_entries && !self.entries.contains_key(&entry.session_id) {
            self.evict_oldest(EVICT_BATCH);
        }
        self.entries.insert(entry.session_id, entry);
    }

    /// Remove the entry for `session_id`, returning whether one was
    /// present.
    pub fn remove(&mut self, session_id: &[u8; 16]) -> bool {
        self.entries.remove(session_id).is_some()
    }

    /// Number of entries currently cached.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_oldest(&mut self, count: usize) {
        let mut by_age: Vec<([u8; 16], i64)> = self
            .entries
            .iter()
            .map(|(id, entry)| (*id, entry.last_used))
            .collect();
        by_age.sort_by_key(|(_, last_used)| *last_used);
        for (id, _) in by_age.into_iter().take(count) {
            self.entries.remove(&id);
        }
    }
}
