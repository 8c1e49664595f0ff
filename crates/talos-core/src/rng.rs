//! Injectable randomness.

use rand::rngs::OsRng;
use rand::RngCore;

/// A source of cryptographically secure randomness, injectable so tests
/// can use a fixed-seed generator instead of the OS CSPRNG.
pub trait SecureRng: Send + Sync {
    /// Fill `dest` with random bytes.
    fn fill_bytes(&self, dest: &mut [u8]);

    /// Generate a random 16-byte session id.
    fn session_id(&self) -> [u8; 16] {
        let mut buf = [0u8; 16];
        self.fill_bytes(&mut buf);
        buf
    }
}

/// The default `SecureRng`, backed by the OS CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct CsRng;

impl SecureRng for CsRng {
    fn fill_bytes(&self, dest: &mut [u8]) {
        OsRng.fill_bytes(dest);
    }
}
