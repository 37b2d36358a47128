//! Shared test fixtures and utilities for linkage crates.
//!
//! Deterministic RNG setup, random joint configurations within limits, and
//! a handful of reference geometries and environments.

pub mod fixtures;
pub mod rng;

// ---------------------------------------------------------------------------
// Re-exports for convenience
// ---------------------------------------------------------------------------

pub use fixtures::{
    circle_env, compact_geometry, ellipse_geometry, empty_env, registry, scenario_c_env,
    standard_geometry,
};
pub use rng::{random_configuration, random_configurations, seeded_rng};
