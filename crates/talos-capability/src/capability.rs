//! The `Capability` token itself: a signed assertion that a subject may
//! invoke operations within a scope, optionally constrained and
//! delegatable.

use serde::{Deserialize, Serialize};
use talos_canon::CanonicalValue;
use talos_core::Did;
use talos_crypto::{Ed25519Signature, Ed25519SigningKey, Ed25519VerifyingKey};

use crate::constraints::Constraints;
use crate::errors::CapabilityError;

/// Capability format version. Currently always 1.
pub const CAPABILITY_VERSION: u32 = 1;

/// A signed, bounded, optionally delegatable permission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capability {
    /// Unique, opaque, collision-resistant identifier.
    pub id: String,
    /// Capability format version (currently 1).
    pub version: u32,
    /// The DID of the granting identity.
    pub issuer: Did,
    /// The DID of the recipient.
    pub subject: Did,
    /// Hierarchical scope, e.g. `tool:weather/method:get`.
    pub scope: String,
    /// Recognized constraint keys plus opaque forward-compatible ones.
    pub constraints: Constraints,
    /// When the capability was issued, Unix seconds UTC.
    pub issued_at: i64,
    /// When the capability expires, Unix seconds UTC.
    pub expires_at: i64,
    /// Whether the subject may delegate this capability onward.
    pub delegatable: bool,
    /// Ancestor capability ids, root-first; empty for direct grants.
    pub delegation_chain: Vec<String>,
    /// Detached Ed25519 signature over the canonical bytes of every other
    /// field, `None` until [`Capability::sign`] is called.
    pub signature: Option<Ed25519Signature>,
}

impl Capability {
    /// The canonical bytes this capability is signed over: every field
    /// except `signature`.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut fields = std::collections::BTreeMap::new();
        fields.insert("id".to_string(), CanonicalValue::String(self.id.clone()));
        fields.insert(
            "version".to_string(),
            CanonicalValue::Integer(self.version as i64),
        );
        fields.insert(
            "issuer".to_string(),
            CanonicalValue::String(self.issuer.as_str().to_string()),
        );
        fields.insert(
            "subject".to_string(),
            CanonicalValue::String(self.subject.as_str().to_string()),
        );
        fields.insert(
            "scope".to_string(),
            CanonicalValue::String(self.scope.clone()),
        );
        fields.insert(
            "constraints".to_string(),
            constraints_to_canonical(&self.constraints),
        );
        fields.insert(
            "issued_at".to_string(),
            CanonicalValue::Integer(self.issued_at),
        );
        fields.insert(
            "expires_at".to_string(),
            CanonicalValue::Integer(self.expires_at),
        );
        fields.insert(
            "delegatable".to_string(),
            CanonicalValue::Bool(self.delegatable),
        );
        fields.insert(
            "delegation_chain".to_string(),
            CanonicalValue::array(
                self.delegation_chain
                    .iter()
                    .map(|id| CanonicalValue::String(id.clone())),
            ),
        );
        CanonicalValue::Object(fields).encode()
    }

    /// The sha256 hash of [`Capability::canonical_bytes`], used to
    /// reference this capability by hash in the session cache and the
    /// revocation-hash set.
    pub fn canonical_hash(&self) -> [u8; 32] {
        talos_crypto::sha256(&self.canonical_bytes())
    }

    /// Sign the capability with the issuer's signing key, attaching the
    /// resulting signature.
    pub fn sign(&mut self, signing_key: &Ed25519SigningKey) {
        let bytes = self.canonical_bytes();
        self.signature = Some(signing_key.sign(&bytes));
    }

    /// Verify the attached signature under `issuer_key`.
    pub fn verify_signature(&self, issuer_key: &Ed25519VerifyingKey) -> Result<(), CapabilityError> {
        let Some(signature) = &self.signature else {
            return Err(CapabilityError::SignatureInvalid("no signature attached".to_string()));
        };
        let bytes = self.canonical_bytes();
        issuer_key
            .verify(&bytes, signature)
            .map_err(|_| CapabilityError::SignatureInvalid("verification failed".to_string()))
    }
}

fn constraints_to_canonical(constraints: &Constraints) -> CanonicalValue {
    let mut fields = std::collections::BTreeMap::new();
    for (key, value) in constraints {
        let json = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
        if let Ok(canon) = CanonicalValue::from_json(&json) {
            fields.insert(key.clone(), canon);
        }
    }
    CanonicalValue::Object(fields)
}

/// Builds a [`Capability`] with `grant`-style defaults, used by
/// `CapabilityManager::grant` and `CapabilityManager::delegate`.
pub struct CapabilityBuilder {
    id: String,
    issuer: Did,
    subject: Did,
    scope: String,
    constraints: Constraints,
    issued_at: i64,
    expires_at: i64,
    delegatable: bool,
    delegation_chain: Vec<String>,
}

impl CapabilityBuilder {
    /// Start building a capability with the given identity/scope/timing.
    pub fn new(
        id: String,
        issuer: Did,
        subject: Did,
        scope: String,
        issued_at: i64,
        expires_at: i64,
    ) -> Self {
        Self {
            id,
            issuer,
            subject,
            scope,
            constraints: Constraints::new(),
            issued_at,
            expires_at,
            delegatable: false,
            delegation_chain: Vec::new(),
        }
    }

    /// Attach constraints.
    pub fn constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// Mark the capability delegatable.
    pub fn delegatable(mut self, delegatable: bool) -> Self {
        self.delegatable = delegatable;
        self
    }

    /// Set the delegation chain (ancestor ids, root-first).
    pub fn delegation_chain(mut self, chain: Vec<String>) -> Self {
        self.delegation_chain = chain;
        self
    }

    /// Finish building an unsigned capability.
    pub fn build(self) -> Capability {
        Capability {
            id: self.id,
            version: CAPABILITY_VERSION,
            issuer: self.issuer,
            subject: self.subject,
            scope: self.scope,
            constraints: self.constraints,
            issued_at: self.issued_at,
            expires_at: self.expires_at,
            delegatable: self.delegatable,
            delegation_chain: self.delegation_chain,
            signature: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn did(seed: u8) -> Did {
        Did::from_public_key(&[seed; 32])
    }

    #[test]
    fn canonical_bytes_exclude_signature() {
        let mut cap = CapabilityBuilder::new(
            "cap_1".to_string(),
            did(1),
            did(2),
            "tool:weather/method:get".to_string(),
            1_700_000_000,
            1_700_003_600,
        )
        .build();
        let before = cap.canonical_bytes();
        let key = talos_crypto::generate_ed25519_signing_key();
        cap.sign(&key);
        let after = cap.canonical_bytes();
        assert_eq!(before, after);
    }

    #[test]
    fn tampered_signature_fails_verification() {
        let key = talos_crypto::generate_ed25519_signing_key();
        let verifying = key.verifying_key();
        let mut cap = CapabilityBuilder::new(
            "cap_1".to_string(),
            did(1),
            did(2),
            "tool:weather/method:get".to_string(),
            1_700_000_000,
            1_700_003_600,
        )
        .build();
        cap.sign(&key);
        let mut tampered_bytes = cap.signature.unwrap().to_bytes();
        tampered_bytes[63] ^= 0xFF;
        cap.signature = Some(Ed25519Signature::from_bytes(tampered_bytes));
        assert!(cap.verify_signature(&verifying).is_err());
    }

    #[test]
    fn valid_signature_verifies() {
        let key = talos_crypto::generate_ed25519_signing_key();
        let verifying = key.verifying_key();
        let mut cap = CapabilityBuilder::new(
            "cap_1".to_string(),
            did(1),
            did(2),
            "tool:weather/method:get".to_string(),
            1_700_000_000,
            1_700_003_600,
        )
        .build();
        cap.sign(&key);
        assert!(cap.verify_signature(&verifying).is_ok());
    }
}
