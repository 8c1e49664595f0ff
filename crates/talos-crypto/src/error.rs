//! Crypto operation errors.

/// Errors raised by the cryptographic primitives in this crate.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// A key or signature byte string was the wrong length.
    #[error("invalid length for {what}: expected {expected}, got {got}")]
    InvalidLength {
        /// What was being decoded.
        what: &'static str,
        /// Expected byte length.
        expected: usize,
        /// Actual byte length.
        got: usize,
    },

    /// Ed25519 signature verification failed.
    #[error("Ed25519 signature verification failed")]
    SignatureInvalid,

    /// An Ed25519 key was malformed.
    #[error("malformed Ed25519 key: {0}")]
    MalformedKey(String),

    /// AEAD decryption failed (tag mismatch or malformed ciphertext).
    #[error("AEAD decryption failed")]
    DecryptFailed,

    /// The HKDF expansion length was invalid for the underlying hash.
    #[error("invalid HKDF output length: {0}")]
    InvalidHkdfLength(String),
}
