//! Closed-loop rollouts of control policies against a stand-in plant.
//!
//! The real system hands commands to an external physics engine. This
//! crate replaces it with a first-order joint integrator so policies can be
//! exercised end to end:
//!
//! ```text
//! q, qdot ──► [collision pre-check] ──► policy ──► torques ──► integrator ──► q', qdot'
//! ```

pub mod integrator;
pub mod rollout;

use thiserror::Error;

use linkage_core::error::KinematicsError;

pub use integrator::KinematicIntegrator;
pub use rollout::{ControlLoop, Rollout, RolloutStatus};

/// Errors from setting up or stepping a rollout.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("Invalid value for {field}: {value} (must be positive and finite)")]
    InvalidParameter { field: &'static str, value: f64 },

    #[error(transparent)]
    Kinematics(#[from] KinematicsError),
}

pub mod prelude {
    pub use crate::{ControlLoop, KinematicIntegrator, Rollout, RolloutStatus, SimError};
}
