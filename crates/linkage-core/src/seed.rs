//! Deterministic seed derivation for reproducible sampling runs.
//!
//! ```text
//! Run seed ── root stream (sequential sampler run)
//! ├── Worker seed (per parallel sampler worker)
//! └── Named stream (test fixture configurations)
//! ```
//!
//! A single-worker run consumes the root stream directly, so its output is
//! identical to a plain `ChaCha8Rng::seed_from_u64(seed)` loop.

use std::hash::{DefaultHasher, Hash, Hasher};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Derive a child seed from a parent seed and a string key.
///
/// ```
/// use linkage_core::seed::derive_seed;
///
/// let child = derive_seed(42, "configurations");
/// assert_eq!(child, derive_seed(42, "configurations"));
/// assert_ne!(child, derive_seed(42, "fixtures"));
/// ```
#[must_use]
pub fn derive_seed(parent: u64, key: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    parent.hash(&mut hasher);
    key.hash(&mut hasher);
    hasher.finish()
}

/// Derive a child seed from a parent seed and a numeric index.
///
/// ```
/// use linkage_core::seed::derive_seed_indexed;
///
/// assert_ne!(derive_seed_indexed(42, 0), derive_seed_indexed(42, 1));
/// ```
#[must_use]
pub fn derive_seed_indexed(parent: u64, index: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    parent.hash(&mut hasher);
    index.hash(&mut hasher);
    hasher.finish()
}

/// Disjoint random streams derived from one run seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedStreams {
    root: u64,
}

impl SeedStreams {
    #[must_use]
    pub const fn new(root: u64) -> Self {
        Self { root }
    }

    #[must_use]
    pub const fn root(&self) -> u64 {
        self.root
    }

    /// Seed of sampler worker `worker`.
    #[must_use]
    pub fn worker_seed(&self, worker: usize) -> u64 {
        derive_seed_indexed(self.root, worker as u64)
    }

    /// Seed of a named auxiliary stream.
    #[must_use]
    pub fn named_seed(&self, name: &str) -> u64 {
        derive_seed(self.root, name)
    }

    /// RNG over the root seed itself.
    #[must_use]
    pub fn root_rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.root)
    }

    /// RNG for sampler worker `worker`.
    #[must_use]
    pub fn worker_rng(&self, worker: usize) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.worker_seed(worker))
    }

    /// RNG for a named auxiliary stream.
    #[must_use]
    pub fn named_rng(&self, name: &str) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.named_seed(name))
    }
}

impl Default for SeedStreams {
    fn default() -> Self {
        Self::new(0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
