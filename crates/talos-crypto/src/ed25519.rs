//! Ed25519 signature types and operations.

use ed25519_dalek::Signer;
use rand_core::OsRng;
use serde::{Deserialize, Serialize};

use crate::CryptoError;

/// A detached Ed25519 signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ed25519Signature(pub [u8; 64]);

impl Ed25519Signature {
    /// Wrap a raw 64-byte signature.
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Copy out the raw bytes.
    pub fn to_bytes(&self) -> [u8; 64] {
        self.0
    }

    /// Parse a signature from an arbitrary-length slice.
    pub fn try_from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; 64] = bytes.try_into().map_err(|_| CryptoError::InvalidLength {
            what: "Ed25519 signature",
            expected: 64,
            got: bytes.len(),
        })?;
        Ok(Self(arr))
    }
}

impl TryFrom<&[u8]> for Ed25519Signature {
    type Error = CryptoError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        Self::try_from_slice(value)
    }
}

/// An Ed25519 signing (private) key.
#[derive(Clone)]
pub struct Ed25519SigningKey(ed25519_dalek::SigningKey);

impl Ed25519SigningKey {
    /// Wrap raw key bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(ed25519_dalek::SigningKey::from_bytes(&bytes))
    }

    /// Generate a fresh signing key from the OS CSPRNG.
    pub fn generate() -> Self {
        Self(ed25519_dalek::SigningKey::generate(&mut OsRng))
    }

    /// Derive the corresponding verifying key.
    pub fn verifying_key(&self) -> Ed25519VerifyingKey {
        Ed25519VerifyingKey(self.0.verifying_key().to_bytes())
    }

    /// Sign a message, producing a detached signature.
    pub fn sign(&self, message: &[u8]) -> Ed25519Signature {
        Ed25519Signature(self.0.sign(message).to_bytes())
    }

    /// Copy out the raw 32-byte secret scalar seed.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }
}

/// An Ed25519 verifying (public) key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ed25519VerifyingKey(pub [u8; 32]);

impl Ed25519VerifyingKey {
    /// Wrap raw key bytes, validating the point is on-curve.
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, CryptoError> {
        ed25519_dalek::VerifyingKey::from_bytes(&bytes)
            .map(|_| Ed25519VerifyingKey(bytes))
            .map_err(|e| CryptoError::MalformedKey(e.to_string()))
    }

    /// Parse from an arbitrary-length slice.
    pub fn try_from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| CryptoError::InvalidLength {
            what: "Ed25519 verifying key",
            expected: 32,
            got: bytes.len(),
        })?;
        Self::from_bytes(arr)
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Verify a signature over `message`.
    pub fn verify(&self, message: &[u8], signature: &Ed25519Signature) -> Result<(), CryptoError> {
        if ed25519_verify(message, signature, self)? {
            Ok(())
        } else {
            Err(CryptoError::SignatureInvalid)
        }
    }
}

/// Verify an Ed25519 signature, returning `false` rather than erroring on
/// an invalid signature (errors are reserved for malformed keys).
pub fn ed25519_verify(
    message: &[u8],
    signature: &Ed25519Signature,
    public_key: &Ed25519VerifyingKey,
) -> Result<bool, CryptoError> {
    let pk = ed25519_dalek::VerifyingKey::from_bytes(&public_key.0)
        .map_err(|e| CryptoError::MalformedKey(e.to_string()))?;
    let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
    Ok(pk.verify_strict(message, &sig).is_ok())
}

/// Generate a fresh Ed25519 signing key.
pub fn generate_ed25519_signing_key() -> Ed25519SigningKey {
    Ed25519SigningKey::generate()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify_round_trips() {
        let key = Ed25519SigningKey::generate();
        let verifying = key.verifying_key();
        let sig = key.sign(b"hello");
        assert!(verifying.verify(b"hello", &sig).is_ok());
    }

    #[test]
    fn tampered_signature_fails() {
        let key = Ed25519SigningKey::generate();
        let verifying = key.verifying_key();
        let mut sig = key.sign(b"hello").to_bytes();
        sig[63] ^= 0xFF;
        let tampered = Ed25519Signature::from_bytes(sig);
        assert!(verifying.verify(b"hello", &tampered).is_err());
    }

    #[test]
    fn rejects_short_signature() {
        assert!(Ed25519Signature::try_from_slice(&[0u8; 10]).is_err());
    }
}
