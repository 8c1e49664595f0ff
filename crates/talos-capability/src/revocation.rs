//! The revocation table: a durable record that a capability id (and
//! anything delegated from it) must no longer be honored.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use talos_core::Did;

/// A single revocation record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevocationEntry {
    /// The revoked capability's id.
    pub capability_id: String,
    /// When the revocation was recorded, Unix seconds UTC.
    pub revoked_at: i64,
    /// A human-readable reason, for audit trails.
    pub reason: String,
    /// The DID that requested the revocation.
    pub revoked_by: Did,
}

/// An append-only table of revoked capability ids.
///
/// Callers hold this behind a lock (`CapabilityManager` uses
/// `parking_lot::RwLock`); the table itself does no locking.
#[derive(Debug, Default)]
pub struct RevocationTable {
    entries: HashMap<String, RevocationEntry>,
}

impl RevocationTable {
    /// An empty revocation table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a revocation. Idempotent: revoking an already-revoked id
    /// overwrites the entry with the new reason/timestamp.
    pub fn revoke(&mut self, entry: RevocationEntry) {
        self.entries.insert(entry.capability_id.clone(), entry);
    }

    /// Is `capability_id` revoked?
    pub fn is_revoked(&self, capability_id: &str) -> bool {
        self.entries.contains_key(capability_id)
    }

    /// Is `capability_id` itself, or any id in `delegation_chain`, revoked?
    ///
    /// Per-link revocation: a capability delegated from a since-revoked
    /// ancestor is denied even though only the leaf's own signature is
    /// cryptographically verified.
    pub fn any_revoked<'a>(
        &self,
        capability_id: &str,
        delegation_chain: impl IntoIterator<Item = &'a str>,
    ) -> Option<String> {
        if self.is_revoked(capability_id) {
            return Some(capability_id.to_string());
        }
        delegation_chain
            .into_iter()
            .find(|id| self.is_revoked(id))
            .map(|id| id.to_string())
    }

    /// Look up the revocation entry for `capability_id`, if any.
    pub fn get(&self, capability_id: &str) -> Option<&RevocationEntry> {
        self.entries.get(capability_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn did() -> Did {
        Did::from_public_key(&[9u8; 32])
    }

    #[test]
    fn revoked_id_is_reported() {
        let mut table = RevocationTable::new();
        table.revoke(RevocationEntry {
            capability_id: "cap_1".to_string(),
            revoked_at: 100,
            reason: "compromised".to_string(),
            revoked_by: did(),
        });
        assert!(table.is_revoked("cap_1"));
        assert!(!table.is_revoked("cap_2"));
    }

    #[test]
    fn any_revoked_checks_delegation_chain() {
        let mut table = RevocationTable::new();
        table.revoke(RevocationEntry {
            capability_id: "cap_root".to_string(),
            revoked_at: 100,
            reason: "compromised".to_string(),
            revoked_by: did(),
        });
        let chain = vec!["cap_root", "cap_mid"];
        assert_eq!(
            table.any_revoked("cap_leaf", chain),
            Some("cap_root".to_string())
        );
        assert_eq!(table.any_revoked("cap_leaf", vec!["cap_mid"]), None);
    }
}
