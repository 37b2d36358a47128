//! Deterministic RNG utilities for reproducible tests.

use std::f64::consts::PI;

use linkage_core::seed::SeedStreams;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// Name of the stream that [`random_configurations`] draws from.
pub const CONFIGURATION_STREAM: &str = "configurations";

/// Create a deterministic `ChaCha8Rng` from a seed.
///
/// All test randomization should go through this to ensure reproducibility.
pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    SeedStreams::new(seed).root_rng()
}

/// A joint configuration with every angle uniform in `[-pi, pi)`.
pub fn random_configuration<R: Rng>(rng: &mut R, joints: usize) -> Vec<f64> {
    (0..joints).map(|_| rng.gen_range(-PI..PI)).collect()
}

/// `count` configurations drawn from the seed's configuration stream, so
/// they never replay the draws of [`seeded_rng`] with the same seed.
pub fn random_configurations(seed: u64, joints: usize, count: usize) -> Vec<Vec<f64>> {
    let mut rng = SeedStreams::new(seed).named_rng(CONFIGURATION_STREAM);
    (0..count)
        .map(|_| random_configuration(&mut rng, joints))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
