//! Prekey bundles: what a peer publishes so others can open a session
//! with them via X3DH.

use talos_crypto::{ed25519_verify, Ed25519Signature, Ed25519VerifyingKey, X25519PublicKey};

/// A published prekey bundle, verified before use in a handshake.
#[derive(Debug, Clone, Copy)]
pub struct PrekeyBundle {
    /// The peer's long-term Ed25519 identity key.
    pub identity_key: Ed25519VerifyingKey,
    /// An X25519 public key, signed by `identity_key`.
    pub signed_prekey: X25519PublicKey,
    /// The signature over `signed_prekey`'s raw bytes.
    pub prekey_signature: Ed25519Signature,
}

impl PrekeyBundle {
    /// Verify `prekey_signature` over `signed_prekey` under `identity_key`.
    pub fn verify(&self) -> bool {
        ed25519_verify(
            self.signed_prekey.as_bytes(),
            &self.prekey_signature,
            &self.identity_key,
        )
        .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use talos_crypto::{generate_ed25519_signing_key, generate_x25519_keypair};

    #[test]
    fn valid_bundle_verifies() {
        let identity = generate_ed25519_signing_key();
        let (_priv, signed_prekey) = generate_x25519_keypair();
        let prekey_signature = identity.sign(signed_prekey.as_bytes());
        let bundle = PrekeyBundle {
            identity_key: identity.verifying_key(),
            signed_prekey,
            prekey_signature,
        };
        assert!(bundle.verify());
    }

    #[test]
    fn tampered_bundle_fails() {
        let identity = generate_ed25519_signing_key();
        let (_priv, signed_prekey) = generate_x25519_keypair();
        let (_other_priv, other_prekey) = generate_x25519_keypair();
        let prekey_signature = identity.sign(signed_prekey.as_bytes());
        let bundle = PrekeyBundle {
            identity_key: identity.verifying_key(),
            signed_prekey: other_prekey,
            prekey_signature,
        };
        assert!(!bundle.verify());
    }
}
