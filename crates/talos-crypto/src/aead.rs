//! ChaCha20-Poly1305 AEAD, used to encrypt ratchet messages with the
//! message header as associated data.

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand_core::{OsRng, RngCore};

use crate::CryptoError;

/// Nonce length in bytes.
pub const NONCE_LEN: usize = 12;
/// Poly1305 tag length in bytes.
pub const TAG_LEN: usize = 16;

/// A 32-byte ChaCha20-Poly1305 key (typically a ratchet message key).
pub struct AeadKey([u8; 32]);

impl AeadKey {
    /// Wrap raw key bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// Encrypt `plaintext` under `key`, with `associated_data` bound into the
/// authentication tag. Returns `nonce || ciphertext || tag`.
pub fn chacha20poly1305_encrypt(
    key: &AeadKey,
    plaintext: &[u8],
    associated_data: &[u8],
) -> Vec<u8> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(&key.0));
    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);
    // `ChaCha20Poly1305::encrypt` cannot fail for well-formed keys/nonces.
    let ciphertext = cipher
        .encrypt(
            nonce,
            chacha20poly1305::aead::Payload {
                msg: plaintext,
                aad: associated_data,
            },
        )
        .expect("chacha20poly1305 encryption with a valid key cannot fail");
    let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    out
}

/// Decrypt `wire` (as produced by [`chacha20poly1305_encrypt`]) under
/// `key`, verifying `associated_data` against the authentication tag.
pub fn chacha20poly1305_decrypt(
    key: &AeadKey,
    wire: &[u8],
    associated_data: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    if wire.len() < NONCE_LEN + TAG_LEN {
        return Err(CryptoError::DecryptFailed);
    }
    let (nonce_bytes, rest) = wire.split_at(NONCE_LEN);
    let cipher = ChaCha20Poly1305::new(Key::from_slice(&key.0));
    let nonce = Nonce::from_slice(nonce_bytes);
    cipher
        .decrypt(
            nonce,
            chacha20poly1305::aead::Payload {
                msg: rest,
                aad: associated_data,
            },
        )
        .map_err(|_| CryptoError::DecryptFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_then_decrypt_round_trips() {
        let key = AeadKey::from_bytes([3u8; 32]);
        let wire = chacha20poly1305_encrypt(&key, b"hello world", b"header");
        let plaintext = chacha20poly1305_decrypt(&key, &wire, b"header").unwrap();
        assert_eq!(plaintext, b"hello world");
    }

    #[test]
    fn wrong_associated_data_fails() {
        let key = AeadKey::from_bytes([3u8; 32]);
        let wire = chacha20poly1305_encrypt(&key, b"hello world", b"header");
        assert!(chacha20poly1305_decrypt(&key, &wire, b"wrong").is_err());
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let key = AeadKey::from_bytes([3u8; 32]);
        let mut wire = chacha20poly1305_encrypt(&key, b"hello world", b"header");
        let last = wire.len() - 1;
        wire[last] ^= 0xFF;
        assert!(chacha20poly1305_decrypt(&key, &wire, b"header").is_err());
    }
}
