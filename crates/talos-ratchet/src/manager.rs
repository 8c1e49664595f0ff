//! `SessionManager`: owns this identity's prekey and every ratchet
//! session currently open with a peer.
//!
//! The manager's `peer_id -> session` map is guarded by a lock only for
//! lookup/insert; each session itself is then borrowed exclusively by
//! whoever holds its `Arc<Mutex<Session>>`, so two peers' sessions never
//! contend on one lock.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use talos_core::Did;
use talos_crypto::{
    generate_x25519_keypair, hkdf_sha256, kdf_rk, x25519_dh, Ed25519Signature, Ed25519SigningKey,
    X25519PrivateKey, X25519PublicKey,
};

use crate::error::RatchetError;
use crate::prekey::PrekeyBundle;
use crate::session::Session;
use crate::state::RatchetState;
use crate::Result;

/// HKDF info label for the X3DH root-key derivation, distinct from the
/// ratchet's own `KDF_RK`/`KDF_CK` labels.
const X3DH_INFO: &[u8] = b"x3dh-init";

/// A session shared between its owning task and the manager's registry.
pub type SharedSession = Arc<Mutex<Session>>;

/// Manages Double Ratchet sessions with multiple peers under one
/// long-term identity.
pub struct SessionManager {
    identity_key: Ed25519SigningKey,
    signed_prekey: X25519PrivateKey,
    signed_prekey_public: X25519PublicKey,
    prekey_signature: Ed25519Signature,
    sessions: parking_lot::RwLock<HashMap<Did, SharedSession>>,
}

impl SessionManager {
    /// Build a manager for `identity_key`, generating a fresh signed
    /// prekey to publish.
    pub fn new(identity_key: Ed25519SigningKey) -> Self {
        let (signed_prekey, signed_prekey_public) = generate_x25519_keypair();
        let prekey_signature = identity_key.sign(signed_prekey_public.as_bytes());
        Self {
            identity_key,
            signed_prekey,
            signed_prekey_public,
            prekey_signature,
            sessions: parking_lot::RwLock::new(HashMap::new()),
        }
    }

    /// This manager's own DID.
    pub fn identity(&self) -> Did {
        Did::from_public_key(self.identity_key.verifying_key().as_bytes())
    }

    /// The prekey bundle this identity publishes for others to contact it.
    pub fn get_prekey_bundle(&self) -> PrekeyBundle {
        PrekeyBundle {
            identity_key: self.identity_key.verifying_key(),
            signed_prekey: self.signed_prekey_public,
            prekey_signature: self.prekey_signature,
        }
    }

    /// Open a session as the initiator (Alice), performing X3DH against
    /// `peer_bundle`. The ephemeral keypair generated here is reused as
    /// the first DH ratchet keypair.
    pub fn create_session_as_initiator(
        &self,
        peer_id: Did,
        peer_bundle: &PrekeyBundle,
    ) -> Result<SharedSession> {
        if !peer_bundle.verify() {
            return Err(RatchetError::InvalidPrekeySignature);
        }

        let (ephemeral_priv, _ephemeral_pub) = generate_x25519_keypair();
        let dh_x3dh = x25519_dh(&ephemeral_priv, &peer_bundle.signed_prekey);
        let root_key_bytes = hkdf_sha256(&dh_x3dh, X3DH_INFO, 32)?;
        let mut root_key = [0u8; 32];
        root_key.copy_from_slice(&root_key_bytes);

        // Same DH output since the ephemeral key doubles as the first
        // ratchet keypair.
        let dh_out = x25519_dh(&ephemeral_priv, &peer_bundle.signed_prekey);
        let (root_key, chain_key_send) = kdf_rk(&root_key, &dh_out)?;

        let mut state = RatchetState::new(ephemeral_priv, root_key);
        state.dh_remote = Some(peer_bundle.signed_prekey);
        state.chain_key_send = Some(chain_key_send);

        let session = Arc::new(Mutex::new(Session::new(peer_id.clone(), state)));
        self.sessions.write().insert(peer_id, session.clone());
        tracing::info!(peer = %session.lock().peer_id, "created session as initiator");
        Ok(session)
    }

    /// Open a session as the responder (Bob), from the DH public key
    /// carried in a peer's first message header. The derivation mirrors
    /// the initiator's so both sides land on the same root and chain key.
    pub fn create_session_as_responder(&self, peer_id: Did, peer_dh_public: X25519PublicKey) -> SharedSession {
        let dh_x3dh = x25519_dh(&self.signed_prekey, &peer_dh_public);
        // `hkdf_sha256`/`kdf_rk` only fail on a pathological output length,
        // never for these fixed 32/64-byte requests.
        let root_key_bytes =
            hkdf_sha256(&dh_x3dh, X3DH_INFO, 32).expect("fixed-length HKDF expansion cannot fail");
        let mut root_key = [0u8; 32];
        root_key.copy_from_slice(&root_key_bytes);

        let dh_recv = x25519_dh(&self.signed_prekey, &peer_dh_public);
        let (root_key, chain_key_recv) =
            kdf_rk(&root_key, &dh_recv).expect("fixed-length HKDF expansion cannot fail");

        let mut state = RatchetState::new(self.signed_prekey.clone(), root_key);
        state.dh_remote = Some(peer_dh_public);
        state.chain_key_recv = Some(chain_key_recv);

        let session = Arc::new(Mutex::new(Session::new(peer_id.clone(), state)));
        self.sessions.write().insert(peer_id, session.clone());
        tracing::info!(peer = %session.lock().peer_id, "created session as responder");
        session
    }

    /// Fetch the existing session with `peer_id`, if any.
    pub fn get_session(&self, peer_id: &Did) -> Option<SharedSession> {
        self.sessions.read().get(peer_id).cloned()
    }

    /// Whether a session with `peer_id` exists.
    pub fn has_session(&self, peer_id: &Did) -> bool {
        self.sessions.read().contains_key(peer_id)
    }

    /// Remove the session with `peer_id`, if any.
    pub fn remove_session(&self, peer_id: &Did) -> bool {
        self.sessions.write().remove(peer_id).is_some()
    }
}
