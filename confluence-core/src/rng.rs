//! Deterministic RNG hierarchy.
//!
//! A master seed generates deterministic sub-seeds for each `(stream, iteration)`
//! pair. Sub-seeds are derived via BLAKE3 hashing, independently of thread scheduling
//! order, so calibration results are identical regardless of thread count.

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Deterministic RNG hierarchy.
///
/// A stream names one consumer of randomness (e.g. `"path"`, shared by every
/// tier so they all score the same markets, or `"outcome/balanced"`). Two
/// streams never share a sub-seed, so adding a new consumer does not shift the
/// draws of existing ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RngHierarchy {
    master_seed: u64,
}

impl RngHierarchy {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Derive a deterministic sub-seed for `(stream, iteration)`.
    pub fn sub_seed(&self, stream: &str, iteration: u64) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        hasher.update(&(stream.len() as u64).to_le_bytes());
        hasher.update(stream.as_bytes());
        hasher.update(&iteration.to_le_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }

    /// Create a seeded StdRng from a sub-seed.
    pub fn rng_for(&self, stream: &str, iteration: u64) -> StdRng {
        StdRng::seed_from_u64(self.sub_seed(stream, iteration))
    }
}
