//! Deterministic clock and RNG fixtures for tests, analogous to the
//! teacher's `aura-testkit` crate.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Instant;

use rand::RngCore;
use rand_core::SeedableRng;

use crate::clock::Clock;
use crate::rng::SecureRng;

/// A clock whose `now_unix()` can be set and advanced explicitly.
pub struct FixedClock {
    unix: AtomicI64,
    epoch: Instant,
}

impl FixedClock {
    /// Create a clock fixed at `unix_seconds`.
    pub fn new(unix_seconds: i64) -> Self {
        Self {
            unix: AtomicI64::new(unix_seconds),
            epoch: Instant::now(),
        }
    }

    /// Advance the wall-clock reading by `seconds`.
    pub fn advance(&self, seconds: i64) {
        self.unix.fetch_add(seconds, Ordering::SeqCst);
    }

    /// Set the wall-clock reading directly.
    pub fn set(&self, unix_seconds: i64) {
        self.unix.store(unix_seconds, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_unix(&self) -> i64 {
        self.unix.load(Ordering::SeqCst)
    }

    fn now_monotonic(&self) -> Instant {
        // Monotonic readings still advance in real time; tests that need
        // the rate limiter to see elapsed time rely on this, while expiry
        // checks rely on `now_unix` instead.
        self.epoch
    }
}

/// A `SecureRng` seeded deterministically for reproducible tests.
pub struct SeededRng(parking_lot::Mutex<rand_chacha_like::ChaChaLite>);

impl SeededRng {
    /// Build a generator seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        Self(parking_lot::Mutex::new(rand_chacha_like::ChaChaLite::seed_from_u64(seed)))
    }
}

impl SecureRng for SeededRng {
    fn fill_bytes(&self, dest: &mut [u8]) {
        self.0.lock().fill_bytes(dest);
    }
}

/// A minimal, dependency-free deterministic byte generator used only by
/// test fixtures (not suitable for production randomness).
mod rand_chacha_like {
    use rand_core::{RngCore, SeedableRng};

    pub struct ChaChaLite {
        state: u64,
    }

    impl SeedableRng for ChaChaLite {
        type Seed = [u8; 8];

        fn from_seed(seed: Self::Seed) -> Self {
            Self {
                state: u64::from_le_bytes(seed).wrapping_add(0x9E3779B97F4A7C15),
            }
        }
    }

    impl ChaChaLite {
        pub fn seed_from_u64(seed: u64) -> Self {
            Self::from_seed(seed.to_le_bytes())
        }
    }

    impl RngCore for ChaChaLite {
        fn next_u32(&mut self) -> u32 {
            self.next_u64() as u32
        }

        fn next_u64(&mut self) -> u64 {
            // splitmix64
            self.state = self.state.wrapping_add(0x9E3779B97F4A7C15);
            let mut z = self.state;
            z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
            z ^ (z >> 31)
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            let mut i = 0;
            while i < dest.len() {
                let chunk = self.next_u64().to_le_bytes();
                let n = (dest.len() - i).min(8);
                dest[i..i + n].copy_from_slice(&chunk[..n]);
                i += n;
            }
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }
}
