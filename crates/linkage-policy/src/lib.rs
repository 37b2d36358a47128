//! Obstacle-avoidance control laws for planar linkage arms.
//!
//! Every policy is a pure function of the current state: it takes a
//! [`ControlInput`] (geometry, joint angles and velocities, target,
//! obstacle set) and returns a fresh [`ControlCommand`] of joint torques.
//! Policies never fail; near-singular poses and unreachable targets are
//! reported as flags on the command.
//!
//! ```text
//! ControlInput ──► task-space force ──► J^T ──► ControlCommand
//! ```
//!
//! Policies read obstacle geometry directly and never call the collision
//! detector.

pub mod mapping;
pub mod potential_field;
pub mod rmp;

use std::fmt;
use std::str::FromStr;

use nalgebra::{DVector, Matrix2xX, Point2, Vector2};
use serde::{Deserialize, Serialize};

use linkage_core::config::LinkageConfig;
use linkage_core::error::KinematicsError;
use linkage_core::geometry::RobotGeometry;
use linkage_core::obstacle::Environment;
use linkage_kinematics::{ChainState, jacobian::cartesian_velocity};

pub use potential_field::{PotentialFieldPdPolicy, PotentialFieldPolicy};
pub use rmp::{Rmp, RmpPolicy};

// ---------------------------------------------------------------------------
// ControlInput
// ---------------------------------------------------------------------------

/// Everything a policy sees during one control tick.
///
/// Construction validates joint vector lengths and computes forward
/// kinematics once; policies only read from it.
#[derive(Debug, Clone)]
pub struct ControlInput<'a> {
    geometry: &'a RobotGeometry,
    q: &'a [f64],
    qdot: &'a [f64],
    target: Point2<f64>,
    env: &'a Environment,
    state: ChainState,
    jacobian: Matrix2xX<f64>,
}

impl<'a> ControlInput<'a> {
    pub fn new(
        geometry: &'a RobotGeometry,
        q: &'a [f64],
        qdot: &'a [f64],
        target: Point2<f64>,
        env: &'a Environment,
    ) -> Result<Self, KinematicsError> {
        if qdot.len() != q.len() {
            return Err(KinematicsError::DimensionMismatch {
                expected: q.len(),
                got: qdot.len(),
            });
        }
        let state = ChainState::new(geometry, q)?;
        let jacobian = state.jacobian();
        Ok(Self {
            geometry,
            q,
            qdot,
            target,
            env,
            state,
            jacobian,
        })
    }

    pub const fn geometry(&self) -> &RobotGeometry {
        self.geometry
    }

    pub const fn q(&self) -> &[f64] {
        self.q
    }

    pub const fn qdot(&self) -> &[f64] {
        self.qdot
    }

    pub const fn target(&self) -> Point2<f64> {
        self.target
    }

    pub const fn env(&self) -> &Environment {
        self.env
    }

    pub const fn state(&self) -> &ChainState {
        &self.state
    }

    /// End-effector Jacobian at the current pose.
    pub const fn jacobian(&self) -> &Matrix2xX<f64> {
        &self.jacobian
    }

    pub fn end_effector(&self) -> Point2<f64> {
        self.state.end_effector()
    }

    /// `target - end_effector`.
    pub fn position_error(&self) -> Vector2<f64> {
        self.target - self.end_effector()
    }

    /// End-effector velocity `J * qdot`.
    pub fn end_effector_velocity(&self) -> Vector2<f64> {
        cartesian_velocity(&self.jacobian, self.qdot)
    }

    /// Whether the target lies beyond the arm's maximum reach.
    pub fn target_unreachable(&self) -> bool {
        self.target.coords.norm() > self.geometry.max_reach()
    }
}

// ---------------------------------------------------------------------------
// ControlCommand
// ---------------------------------------------------------------------------

/// Per-joint actuation produced by one policy evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlCommand {
    pub torques: DVector<f64>,
    /// Task-space force at the end-effector before mapping to joints.
    pub cartesian_force: Vector2<f64>,
    /// The Jacobian was near singular and `torques` were norm-clamped.
    pub near_singular: bool,
    /// The target lies beyond max reach; the command is best effort.
    pub target_unreachable: bool,
}

impl ControlCommand {
    pub fn zeros(joints: usize) -> Self {
        Self {
            torques: DVector::zeros(joints),
            cartesian_force: Vector2::zeros(),
            near_singular: false,
            target_unreachable: false,
        }
    }

    pub fn torques(&self) -> &[f64] {
        self.torques.as_slice()
    }
}

// ---------------------------------------------------------------------------
// ControlPolicy
// ---------------------------------------------------------------------------

/// A stateless control law mapping the current state to joint torques.
pub trait ControlPolicy: Send + Sync {
    /// Compute this tick's command. Never fails.
    fn compute_command(&self, input: &ControlInput<'_>) -> ControlCommand;

    /// Human-readable name for this policy.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// PolicyKind
// ---------------------------------------------------------------------------

/// The available control laws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    PotentialField,
    #[default]
    PotentialFieldPd,
    Rmp,
}

impl PolicyKind {
    pub const ALL: [Self; 3] = [Self::PotentialField, Self::PotentialFieldPd, Self::Rmp];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PotentialField => "potential_field",
            Self::PotentialFieldPd => "potential_field_pd",
            Self::Rmp => "rmp",
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognised policy name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown policy '{0}'. Expected one of: potential_field, potential_field_pd, rmp")]
pub struct UnknownPolicy(pub String);

impl FromStr for PolicyKind {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownPolicy(s.to_owned()))
    }
}

/// Build a boxed policy of `kind` from the matching config sections.
pub fn build_policy(kind: PolicyKind, config: &LinkageConfig) -> Box<dyn ControlPolicy> {
    match kind {
        PolicyKind::PotentialField => Box::new(PotentialFieldPolicy::new(
            config.potential_field.clone(),
            config.singularity,
        )),
        PolicyKind::PotentialFieldPd => Box::new(PotentialFieldPdPolicy::new(
            config.potential_field_pd.clone(),
            config.singularity,
        )),
        PolicyKind::Rmp => Box::new(RmpPolicy::new(config.rmp.clone(), config.singularity)),
    }
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        ControlCommand, ControlInput, ControlPolicy, PolicyKind, build_policy,
        potential_field::{PotentialFieldPdPolicy, PotentialFieldPolicy},
        rmp::RmpPolicy,
    };
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
