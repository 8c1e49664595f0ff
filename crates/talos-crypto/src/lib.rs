//! Ed25519 signatures, X25519 Diffie-Hellman, HKDF-SHA256 key derivation,
//! ChaCha20-Poly1305 AEAD, and sha256 hashing — the thin cryptographic
//! primitives the rest of the workspace is built on.
//!
//! Nothing here knows about capabilities, frames, or ratchet state; it is
//! the `aura-crypto` equivalent of this workspace.

mod aead;
mod ed25519;
mod error;
mod hash;
mod hkdf;
mod x25519;

pub use aead::{chacha20poly1305_decrypt, chacha20poly1305_encrypt, AeadKey, NONCE_LEN, TAG_LEN};
pub use ed25519::{
    ed25519_verify, generate_ed25519_signing_key, Ed25519Signature, Ed25519SigningKey,
    Ed25519VerifyingKey,
};
pub use error::CryptoError;
pub use hash::sha256;
pub use hkdf::{hkdf_sha256, kdf_ck, kdf_rk, INFO_CHAIN, INFO_MESSAGE, INFO_ROOT};
pub use x25519::{generate_x25519_keypair, x25519_dh, X25519PrivateKey, X25519PublicKey};

/// Standard result type for fallible crypto operations.
pub type Result<T> = std::result::Result<T, CryptoError>;
