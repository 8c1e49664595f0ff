//! `did:talos:<hex32>` identities.
//!
//! Resolves the ambiguity noted in the specification's open questions: the
//! hex suffix is the lowercase-hex encoding of the first 16 bytes of
//! `sha256(identity_public_key_bytes)` — 32 hex characters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::CoreError;

const PREFIX: &str = "did:talos:";
const HEX_LEN: usize = 32;

/// A stable, DID-shaped identity for an issuer, subject, or peer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Did(String);

impl Did {
    /// Derive a DID from an identity's public key bytes.
    pub fn from_public_key(public_key: &[u8]) -> Self {
        let digest = Sha256::digest(public_key);
        let hex32 = hex::encode(&digest[..16]);
        Did(format!("{PREFIX}{hex32}"))
    }

    /// Parse a DID string, rejecting anything that does not match
    /// `did:talos:<32 lowercase hex chars>`.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let Some(suffix) = s.strip_prefix(PREFIX) else {
            return Err(CoreError::InvalidDid(s.to_string()));
        };
        if suffix.len() != HEX_LEN || !suffix.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(CoreError::InvalidDid(s.to_string()));
        }
        Ok(Did(s.to_string()))
    }

    /// The full DID string, e.g. `did:talos:0123...`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Did {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Did::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_public_key() {
        let did = Did::from_public_key(&[7u8; 32]);
        assert!(did.as_str().starts_with(PREFIX));
        let parsed = Did::parse(did.as_str()).unwrap();
        assert_eq!(did, parsed);
    }

    #[test]
    fn rejects_wrong_prefix() {
        assert!(Did::parse("did:example:abc").is_err());
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(Did::parse("did:talos:deadbeef").is_err());
    }

    #[test]
    fn rejects_non_hex() {
        let bad = format!("did:talos:{}", "z".repeat(HEX_LEN));
        assert!(Did::parse(&bad).is_err());
    }
}
