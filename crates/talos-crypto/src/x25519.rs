//! X25519 Diffie-Hellman key agreement, used by the ratchet's handshake
//! and DH ratchet steps.

use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use x25519_dalek::{PublicKey, StaticSecret};

use crate::CryptoError;

/// An X25519 private (secret) key.
#[derive(Clone)]
pub struct X25519PrivateKey(StaticSecret);

impl X25519PrivateKey {
    /// Generate a fresh private key from the OS CSPRNG.
    pub fn generate() -> Self {
        Self(StaticSecret::random_from_rng(OsRng))
    }

    /// Wrap raw scalar bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(StaticSecret::from(bytes))
    }

    /// Derive the corresponding public key.
    pub fn public_key(&self) -> X25519PublicKey {
        X25519PublicKey((&self.0).into())
    }

    /// Copy out the raw scalar bytes.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }
}

/// An X25519 public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct X25519PublicKey(#[serde(with = "public_key_bytes")] PublicKey);

mod public_key_bytes {
    use serde::{Deserialize, Deserializer, Serializer};
    use x25519_dalek::PublicKey;

    pub fn serialize<S: Serializer>(key: &PublicKey, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_bytes(key.as_bytes())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<PublicKey, D::Error> {
        let bytes: Vec<u8> = serde::de::Deserialize::deserialize(d)?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("X25519 public key must be 32 bytes"))?;
        Ok(PublicKey::from(arr))
    }
}

impl X25519PublicKey {
    /// Wrap raw key bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(PublicKey::from(bytes))
    }

    /// Parse from an arbitrary-length slice.
    pub fn try_from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| CryptoError::InvalidLength {
            what: "X25519 public key",
            expected: 32,
            got: bytes.len(),
        })?;
        Ok(Self::from_bytes(arr))
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }
}

/// Generate a fresh X25519 keypair.
pub fn generate_x25519_keypair() -> (X25519PrivateKey, X25519PublicKey) {
    let private = X25519PrivateKey::generate();
    let public = private.public_key();
    (private, public)
}

/// Perform an X25519 Diffie-Hellman exchange, returning the 32-byte shared
/// secret.
pub fn x25519_dh(private: &X25519PrivateKey, public: &X25519PublicKey) -> [u8; 32] {
    *private.0.diffie_hellman(&public.0).as_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dh_agrees_both_directions() {
        let (a_priv, a_pub) = generate_x25519_keypair();
        let (b_priv, b_pub) = generate_x25519_keypair();
        let shared_a = x25519_dh(&a_priv, &b_pub);
        let shared_b = x25519_dh(&b_priv, &a_pub);
        assert_eq!(shared_a, shared_b);
    }
}
