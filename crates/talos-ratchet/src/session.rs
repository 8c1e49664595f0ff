//! A single Double Ratchet session with one peer.

use talos_core::{Did, MAX_SKIP};
use talos_crypto::{chacha20poly1305_decrypt, chacha20poly1305_encrypt, kdf_ck, kdf_rk, x25519_dh, AeadKey};

use crate::error::RatchetError;
use crate::header::MessageHeader;
use crate::state::RatchetState;
use crate::Result;

/// An authenticated, forward-secret channel with a single peer.
pub struct Session {
    /// The peer this session talks to.
    pub peer_id: Did,
    /// The ratchet's key material and counters.
    pub state: RatchetState,
    /// Messages successfully encrypted on this session.
    pub messages_sent: u64,
    /// Messages successfully decrypted on this session.
    pub messages_received: u64,
}

impl Session {
    /// Wrap freshly derived ratchet state for `peer_id`.
    pub fn new(peer_id: Did, state: RatchetState) -> Self {
        Self {
            peer_id,
            state,
            messages_sent: 0,
            messages_received: 0,
        }
    }

    /// Encrypt `plaintext` with the current sending chain, ratcheting it
    /// forward. Returns `u16-be(header_len) || header_bytes || wire`.
    ///
    /// A responder session starts with no sending chain at all (only its
    /// receiving chain is derived at handshake time); the first call to
    /// `encrypt` bootstraps one by DH-ratcheting against the peer's last
    /// known key, the same way any later DH ratchet step would.
    pub fn encrypt(&mut self, plaintext: &[u8]) -> Result<Vec<u8>> {
        if self.state.chain_key_send.is_none() {
            self.bootstrap_sending_chain()?;
        }
        let chain_key_send = self
            .state
            .chain_key_send
            .ok_or(RatchetError::NotInitialized("no sending chain key"))?;
        let (message_key, next_chain_key) = kdf_ck(&chain_key_send)?;
        self.state.chain_key_send = Some(next_chain_key);

        let header = MessageHeader {
            dh_public: self.state.dh_public,
            previous_chain_length: self.state.prev_send_count,
            message_number: self.state.send_count,
        };
        let header_bytes = header.to_bytes();
        let ciphertext =
            chacha20poly1305_encrypt(&AeadKey::from_bytes(message_key), plaintext, &header_bytes);

        self.state.send_count += 1;
        self.messages_sent += 1;

        let mut wire = Vec::with_capacity(2 + header_bytes.len() + ciphertext.len());
        wire.extend_from_slice(&(header_bytes.len() as u16).to_be_bytes());
        wire.extend_from_slice(&header_bytes);
        wire.extend_from_slice(&ciphertext);
        Ok(wire)
    }

    /// Decrypt a message produced by [`Session::encrypt`], performing a DH
    /// ratchet step first if the message carries a new remote DH key.
    pub fn decrypt(&mut self, message: &[u8]) -> Result<Vec<u8>> {
        if message.len() < 2 {
            return Err(RatchetError::MalformedHeader("message shorter than length prefix".to_string()));
        }
        let header_len = u16::from_be_bytes([message[0], message[1]]) as usize;
        if message.len() < 2 + header_len {
            return Err(RatchetError::MalformedHeader("truncated header".to_string()));
        }
        let header_bytes = &message[2..2 + header_len];
        let ciphertext = &message[2 + header_len..];
        let header = MessageHeader::from_bytes(header_bytes)?;

        if let Some(plaintext) = self.try_skipped_keys(&header, ciphertext, header_bytes)? {
            return Ok(plaintext);
        }

        let is_new_remote_key = match &self.state.dh_remote {
            Some(current) => current != &header.dh_public,
            None => true,
        };
        if is_new_remote_key {
            self.skip_message_keys(header.previous_chain_length)?;
            self.dh_ratchet(&header)?;
        }
        self.skip_message_keys(header.message_number)?;

        let chain_key_recv = self
            .state
            .chain_key_recv
            .ok_or(RatchetError::NotInitialized("no receiving chain key"))?;
        let (message_key, next_chain_key) = kdf_ck(&chain_key_recv)?;
        self.state.chain_key_recv = Some(next_chain_key);
        self.state.recv_count += 1;

        let plaintext =
            chacha20poly1305_decrypt(&AeadKey::from_bytes(message_key), ciphertext, header_bytes)
                .map_err(|_| RatchetError::DecryptFailed)?;
        self.messages_received += 1;
        Ok(plaintext)
    }

    fn try_skipped_keys(
        &mut self,
        header: &MessageHeader,
        ciphertext: &[u8],
        header_bytes: &[u8],
    ) -> Result<Option<Vec<u8>>> {
        let key_id = (*header.dh_public.as_bytes(), header.message_number);
        let Some(message_key) = self.state.skipped_keys.remove(&key_id) else {
            return Ok(None);
        };
        let plaintext =
            chacha20poly1305_decrypt(&AeadKey::from_bytes(message_key), ciphertext, header_bytes)
                .map_err(|_| RatchetError::DecryptFailed)?;
        self.messages_received += 1;
        Ok(Some(plaintext))
    }

    /// Skip forward in the current receiving chain, stashing each
    /// intermediate message key, up to (but not including) `until`.
    fn skip_message_keys(&mut self, until: u64) -> Result<()> {
        let Some(mut chain_key_recv) = self.state.chain_key_recv else {
            return Ok(());
        };
        if self.state.recv_count + u64::from(MAX_SKIP) < until {
            return Err(RatchetError::TooManySkipped);
        }
        let Some(dh_remote) = self.state.dh_remote else {
            return Ok(());
        };
        while self.state.recv_count < until {
            let (message_key, next_chain_key) = kdf_ck(&chain_key_recv)?;
            chain_key_recv = next_chain_key;
            let key_id = (*dh_remote.as_bytes(), self.state.recv_count);
            self.state.skipped_keys.insert(key_id, message_key);
            self.state.recv_count += 1;
        }
        self.state.chain_key_recv = Some(chain_key_recv);
        Ok(())
    }

    /// Derive a first sending chain from the peer's last known DH key,
    /// generating a fresh local keypair for it. Used only when a session
    /// (always the responder side) has a receiving chain but no sending
    /// chain yet.
    fn bootstrap_sending_chain(&mut self) -> Result<()> {
        let dh_remote = self
            .state
            .dh_remote
            .ok_or(RatchetError::NotInitialized("no remote DH key to ratchet against"))?;
        let (new_priv, new_pub) = talos_crypto::generate_x25519_keypair();
        self.state.dh_keypair = new_priv;
        self.state.dh_public = new_pub;
        let dh_out = x25519_dh(&self.state.dh_keypair, &dh_remote);
        let (root_key, chain_key_send) = kdf_rk(&self.state.root_key, &dh_out)?;
        self.state.root_key = root_key;
        self.state.chain_key_send = Some(chain_key_send);
        Ok(())
    }

    /// Perform a DH ratchet step: adopt the peer's new DH key, derive a
    /// fresh receiving chain, generate our own new DH keypair, and derive
    /// a fresh sending chain.
    fn dh_ratchet(&mut self, header: &MessageHeader) -> Result<()> {
        self.state.prev_send_count = self.state.send_count;
        self.state.send_count = 0;
        self.state.recv_count = 0;
        self.state.dh_remote = Some(header.dh_public);

        let dh_recv = x25519_dh(&self.state.dh_keypair, &header.dh_public);
        let (root_key, chain_key_recv) = kdf_rk(&self.state.root_key, &dh_recv)?;
        self.state.root_key = root_key;
        self.state.chain_key_recv = Some(chain_key_recv);

        let (new_priv, new_pub) = talos_crypto::generate_x25519_keypair();
        self.state.dh_keypair = new_priv;
        self.state.dh_public = new_pub;

        let dh_send = x25519_dh(&self.state.dh_keypair, &header.dh_public);
        let (root_key, chain_key_send) = kdf_rk(&self.state.root_key, &dh_send)?;
        self.state.root_key = root_key;
        self.state.chain_key_send = Some(chain_key_send);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::SessionManager;
    use talos_crypto::generate_ed25519_signing_key;

    fn linked_sessions() -> (crate::manager::SharedSession, crate::manager::SharedSession) {
        let alice_identity = generate_ed25519_signing_key();
        let bob_identity = generate_ed25519_signing_key();
        let alice_manager = SessionManager::new(alice_identity);
        let bob_manager = SessionManager::new(bob_identity);

        let bob_bundle = bob_manager.get_prekey_bundle();
        let bob_peer_id = bob_manager.identity();
        let alice_session = alice_manager
            .create_session_as_initiator(bob_peer_id.clone(), &bob_bundle)
            .unwrap();

        let alice_peer_id = alice_manager.identity();
        let alice_dh_public = alice_session.lock().state.dh_public;
        let bob_session =
            bob_manager.create_session_as_responder(alice_peer_id.clone(), alice_dh_public);

        (alice_session, bob_session)
    }

    #[test]
    fn messages_round_trip_in_order() {
        let (alice, bob) = linked_sessions();
        let wire = alice.lock().encrypt(b"hello bob").unwrap();
        let plaintext = bob.lock().decrypt(&wire).unwrap();
        assert_eq!(plaintext, b"hello bob");
    }

    #[test]
    fn out_of_order_delivery_is_recovered_via_skipped_keys() {
        let (alice, bob) = linked_sessions();
        let wire1 = alice.lock().encrypt(b"first").unwrap();
        let wire2 = alice.lock().encrypt(b"second").unwrap();
        let wire3 = alice.lock().encrypt(b"third").unwrap();

        assert_eq!(bob.lock().decrypt(&wire3).unwrap(), b"third");
        assert_eq!(bob.lock().decrypt(&wire1).unwrap(), b"first");
        assert_eq!(bob.lock().decrypt(&wire2).unwrap(), b"second");
    }

    #[test]
    fn forward_secrecy_each_message_uses_a_distinct_key() {
        let (alice, _bob) = linked_sessions();
        let wire1 = alice.lock().encrypt(b"same plaintext").unwrap();
        let wire2 = alice.lock().encrypt(b"same plaintext").unwrap();
        assert_ne!(wire1, wire2);
    }

    #[test]
    fn exactly_at_max_skip_succeeds_one_past_fails() {
        let (alice, bob) = linked_sessions();
        let mut wires = Vec::new();
        for i in 0..=MAX_SKIP {
            wires.push(alice.lock().encrypt(format!("msg-{i}").as_bytes()).unwrap());
        }
        // Decrypting the last message skips over MAX_SKIP prior ones.
        let last = wires.pop().unwrap();
        assert!(bob.lock().decrypt(&last).is_ok());
    }

    #[test]
    fn more_than_max_skip_is_rejected() {
        let (alice, bob) = linked_sessions();
        for _ in 0..=MAX_SKIP + 1 {
            alice.lock().encrypt(b"filler").unwrap();
        }
        let overflow = alice.lock().encrypt(b"tipping point").unwrap();
        let result = bob.lock().decrypt(&overflow);
        assert_eq!(result, Err(RatchetError::TooManySkipped));
    }

    #[test]
    fn tampered_ciphertext_fails_to_decrypt() {
        let (alice, bob) = linked_sessions();
        let mut wire = alice.lock().encrypt(b"hello").unwrap();
        let last = wire.len() - 1;
        wire[last] ^= 0xFF;
        assert_eq!(bob.lock().decrypt(&wire), Err(RatchetError::DecryptFailed));
    }

    #[test]
    fn ratchet_heals_after_dh_step() {
        let (alice, bob) = linked_sessions();
        let wire = alice.lock().encrypt(b"first chain").unwrap();
        bob.lock().decrypt(&wire).unwrap();

        // Bob now replies, forcing Alice to DH-ratchet on her next decrypt.
        let reply = bob.lock().encrypt(b"reply").unwrap();
        // Bob's first reply only has a sending chain once he DH-ratchets
        // on receipt of Alice's message, which happened above.
        let plaintext = alice.lock().decrypt(&reply).unwrap();
        assert_eq!(plaintext, b"reply");
    }
}
