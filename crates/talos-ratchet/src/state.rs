//! The mutable state backing a single ratchet [`crate::Session`].

use std::collections::HashMap;

use talos_crypto::{X25519PrivateKey, X25519PublicKey};

/// Key into the skipped-message-key store: `(dh_public bytes, message_number)`.
pub type SkippedKeyId = ([u8; 32], u64);

/// All key material and counters needed to encrypt and decrypt messages
/// with forward secrecy and break-in recovery.
pub struct RatchetState {
    /// Our current DH ratchet keypair.
    pub dh_keypair: X25519PrivateKey,
    /// The cached public half of `dh_keypair`.
    pub dh_public: X25519PublicKey,
    /// The remote's current DH ratchet public key, once known.
    pub dh_remote: Option<X25519PublicKey>,

    /// The current root key, updated on every DH ratchet step.
    pub root_key: [u8; 32],

    /// The sending chain key, `None` until a sending chain exists.
    pub chain_key_send: Option<[u8; 32]>,
    /// The receiving chain key, `None` until a receiving chain exists.
    pub chain_key_recv: Option<[u8; 32]>,

    /// Messages sent in the current sending chain.
    pub send_count: u64,
    /// Messages received in the current receiving chain.
    pub recv_count: u64,
    /// Messages sent in the *previous* sending chain, carried in headers
    /// so the peer knows how far to skip on a DH ratchet.
    pub prev_send_count: u64,

    /// Message keys skipped over during out-of-order delivery or a DH
    /// ratchet, pending use by a late-arriving message.
    pub skipped_keys: HashMap<SkippedKeyId, [u8; 32]>,
}

impl RatchetState {
    /// Construct state from a freshly generated DH keypair and an initial
    /// root key, with neither sending nor receiving chain yet derived.
    pub fn new(dh_keypair: X25519PrivateKey, root_key: [u8; 32]) -> Self {
        let dh_public = dh_keypair.public_key();
        Self {
            dh_keypair,
            dh_public,
            dh_remote: None,
            root_key,
            chain_key_send: None,
            chain_key_recv: None,
            send_count: 0,
            recv_count: 0,
            prev_send_count: 0,
            skipped_keys: HashMap::new(),
        }
    }
}
