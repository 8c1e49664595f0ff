//! Ratchet failure modes.

/// Errors raised by handshake, encryption, and decryption.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RatchetError {
    /// A peer's prekey bundle signature did not verify.
    #[error("invalid prekey signature")]
    InvalidPrekeySignature,

    /// An operation needed a sending or receiving chain key that has not
    /// been established yet.
    #[error("ratchet not initialized: {0}")]
    NotInitialized(&'static str),

    /// Skipping forward to reach the requested message would exceed
    /// `MAX_SKIP`. Fatal: the session must be re-established.
    #[error("too many skipped messages")]
    TooManySkipped,

    /// AEAD tag verification failed. Non-fatal when the key came from the
    /// skipped-key store (replay or corruption of a single message);
    /// fatal otherwise, since it implies ratchet state corruption.
    #[error("decryption failed")]
    DecryptFailed,

    /// The wire message's header could not be parsed.
    #[error("malformed message header: {0}")]
    MalformedHeader(String),

    /// An HKDF expansion failed (only possible for a pathological output
    /// length, never for the fixed lengths this crate requests).
    #[error("key derivation failed: {0}")]
    KeyDerivationFailed(String),
}

impl From<talos_crypto::CryptoError> for RatchetError {
    fn from(err: talos_crypto::CryptoError) -> Self {
        RatchetError::KeyDerivationFailed(err.to_string())
    }
}
