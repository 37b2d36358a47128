//! Deterministic rejection sampling of collision-free arm configurations.
//!
//! [`generate`] draws joint vectors uniformly within per-joint limits from a
//! seeded ChaCha8 stream and keeps those that pass the obstacle check (and,
//! optionally, workspace-bounds and self-collision tests). Identical inputs
//! reproduce identical poses and statistics.
//! [`PoseSampler::generate_parallel`] spreads the work over rayon workers
//! with per-worker sub-seeds.

pub mod analysis;
pub mod dataset;
pub mod error;
pub mod limits;
pub mod predicates;
pub mod sampler;
pub mod stats;

pub use analysis::{PoseAnalysis, Summary, analyze};
pub use dataset::{POSE_FORMAT, PoseDataset, default_file_name};
pub use error::{DatasetError, SamplerError};
pub use limits::JointLimits;
pub use predicates::{Predicates, Rejection};
pub use sampler::{PoseSampler, SampledPoseSet, generate};
pub use stats::{RejectionCounts, SamplingStats};

pub mod prelude {
    pub use crate::{JointLimits, PoseDataset, PoseSampler, SampledPoseSet, SamplingStats, generate};
}
