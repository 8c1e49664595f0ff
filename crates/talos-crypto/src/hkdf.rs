//! HKDF-SHA256 key derivation, used for the Double Ratchet's root and
//! chain KDF steps.

use hkdf::Hkdf;
use sha2::Sha256;

use crate::CryptoError;

/// HKDF info label for the root-key KDF step (`KDF_RK`).
pub const INFO_ROOT: &[u8] = b"talos-double-ratchet-root";
/// HKDF info label for the chain-key half of `KDF_CK`.
pub const INFO_CHAIN: &[u8] = b"talos-double-ratchet-chain";
/// HKDF info label for the message-key half of `KDF_CK`.
pub const INFO_MESSAGE: &[u8] = b"talos-double-ratchet-message";

/// Expand `input_key_material` with HKDF-SHA256 (no salt) under `info`,
/// producing `length` bytes.
pub fn hkdf_sha256(
    input_key_material: &[u8],
    info: &[u8],
    length: usize,
) -> Result<Vec<u8>, CryptoError> {
    let hk = Hkdf::<Sha256>::new(None, input_key_material);
    let mut okm = vec![0u8; length];
    hk.expand(info, &mut okm)
        .map_err(|e| CryptoError::InvalidHkdfLength(e.to_string()))?;
    Ok(okm)
}

/// The Double Ratchet's root-key KDF: derive a new root key and a new
/// chain key from the current root key and a fresh DH output.
///
/// Returns `(new_root_key, new_chain_key)`, each 32 bytes.
pub fn kdf_rk(root_key: &[u8; 32], dh_output: &[u8; 32]) -> Result<([u8; 32], [u8; 32]), CryptoError> {
    let mut combined = Vec::with_capacity(64);
    combined.extend_from_slice(root_key);
    combined.extend_from_slice(dh_output);
    let okm = hkdf_sha256(&combined, INFO_ROOT, 64)?;
    let mut new_root = [0u8; 32];
    let mut new_chain = [0u8; 32];
    new_root.copy_from_slice(&okm[..32]);
    new_chain.copy_from_slice(&okm[32..]);
    Ok((new_root, new_chain))
}

/// The Double Ratchet's chain-key KDF: derive a per-message key and the
/// next chain key from the current chain key.
///
/// Returns `(message_key, next_chain_key)`, each 32 bytes.
pub fn kdf_ck(chain_key: &[u8; 32]) -> Result<([u8; 32], [u8; 32]), CryptoError> {
    let message_key = hkdf_sha256(chain_key, INFO_MESSAGE, 32)?;
    let next_chain_key = hkdf_sha256(chain_key, INFO_CHAIN, 32)?;
    let mut mk = [0u8; 32];
    let mut ck = [0u8; 32];
    mk.copy_from_slice(&message_key);
    ck.copy_from_slice(&next_chain_key);
    Ok((mk, ck))
}
