//! Validity tests applied to each candidate configuration.

use linkage_collision::{CollisionMode, check_poses, self_collision};
use linkage_core::error::KinematicsError;
use linkage_core::geometry::RobotGeometry;
use linkage_core::obstacle::Environment;
use linkage_kinematics::ChainState;
use serde::{Deserialize, Serialize};

/// Why a candidate was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    /// A link touches an obstacle.
    Collision,
    /// The end-effector lies outside the environment's workspace bounds.
    OutOfBounds,
    /// Two non-adjacent joints are too close together.
    SelfCollision,
}

/// Which predicates run after the obstacle check.
///
/// Obstacle collision is always tested, first, in short-circuit mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Predicates {
    pub check_self_collision: bool,
    /// Ignored when the environment has no bounds.
    pub enforce_workspace_bounds: bool,
}

impl Default for Predicates {
    fn default() -> Self {
        Self {
            check_self_collision: true,
            enforce_workspace_bounds: true,
        }
    }
}

impl Predicates {
    /// Only the obstacle check.
    pub const fn collision_only() -> Self {
        Self {
            check_self_collision: false,
            enforce_workspace_bounds: false,
        }
    }

    /// `None` if `q` is accepted, else the first failing reason.
    pub fn evaluate(
        &self,
        geometry: &RobotGeometry,
        env: &Environment,
        q: &[f64],
    ) -> Result<Option<Rejection>, KinematicsError> {
        let state = ChainState::new(geometry, q)?;
        if check_poses(state.poses(), env, CollisionMode::ShortCircuit).in_collision {
            return Ok(Some(Rejection::Collision));
        }
        if self.enforce_workspace_bounds {
            if let Some(bounds) = env.bounds() {
                if !bounds.contains(&state.end_effector()) {
                    return Ok(Some(Rejection::OutOfBounds));
                }
            }
        }
        if self.check_self_collision && self_collision(geometry, state.poses()) {
            return Ok(Some(Rejection::SelfCollision));
        }
        Ok(None)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
