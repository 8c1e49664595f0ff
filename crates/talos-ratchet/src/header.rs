//! The per-message header: the sender's current DH ratchet key and its
//! position in the current and previous sending chains.
//!
//! Serialized deterministically so both parties derive identical
//! associated-data bytes for the AEAD tag.

use talos_crypto::X25519PublicKey;

use crate::error::RatchetError;

/// `{dh_public, previous_chain_length, message_number}`, attached in the
/// clear ahead of every ratcheted message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    /// The sender's current DH ratchet public key.
    pub dh_public: X25519PublicKey,
    /// Number of messages sent in the sender's *previous* sending chain.
    pub previous_chain_length: u64,
    /// This message's index within the sender's current sending chain.
    pub message_number: u64,
}

const ENCODED_LEN: usize = 32 + 8 + 8;

impl MessageHeader {
    /// Deterministically encode the header: `dh_public (32) || pn (8 BE)
    /// || n (8 BE)`.
    pub fn to_bytes(&self) -> [u8; ENCODED_LEN] {
        let mut out = [0u8; ENCODED_LEN];
        out[..32].copy_from_slice(self.dh_public.as_bytes());
        out[32..40].copy_from_slice(&self.previous_chain_length.to_be_bytes());
        out[40..48].copy_from_slice(&self.message_number.to_be_bytes());
        out
    }

    /// Parse a header from its encoded form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RatchetError> {
        if bytes.len() != ENCODED_LEN {
            return Err(RatchetError::MalformedHeader(format!(
                "expected {ENCODED_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        let dh_public = X25519PublicKey::try_from_slice(&bytes[..32])
            .map_err(|e| RatchetError::MalformedHeader(e.to_string()))?;
        let previous_chain_length = u64::from_be_bytes(bytes[32..40].try_into().unwrap());
        let message_number = u64::from_be_bytes(bytes[40..48].try_into().unwrap());
        Ok(Self {
            dh_public,
            previous_chain_length,
            message_number,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use talos_crypto::generate_x25519_keypair;

    #[test]
    fn header_round_trips_through_bytes() {
        let (_priv, public) = generate_x25519_keypair();
        let header = MessageHeader {
            dh_public: public,
            previous_chain_length: 7,
            message_number: 42,
        };
        let bytes = header.to_bytes();
        let parsed = MessageHeader::from_bytes(&bytes).unwrap();
        assert_eq!(header, parsed);
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(MessageHeader::from_bytes(&[0u8; 10]).is_err());
    }
}
