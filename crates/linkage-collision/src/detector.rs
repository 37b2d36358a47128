//! Collision queries between a posed arm and an [`Environment`].
//!
//! Links are tested in increasing index order and, for each link, obstacles
//! in environment order. A bounding-circle pre-test skips pairs that cannot
//! touch: its radius encloses the link grown by the obstacle extent and
//! margin, so it never changes which contacts are found or their order.

use linkage_core::error::KinematicsError;
use linkage_core::geometry::RobotGeometry;
use linkage_core::obstacle::{Environment, Obstacle};
use linkage_kinematics::{ChainState, LinkPose};
use nalgebra::Point2;

use crate::shapes::link_contains;

/// How many contacts a query collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionMode {
    /// Stop at the first contact.
    #[default]
    ShortCircuit,
    /// Collect every (link, obstacle) contact pair.
    Exhaustive,
}

/// A link touching an obstacle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Contact {
    pub link: usize,
    pub obstacle: usize,
}

/// Outcome of one collision query.
///
/// In short-circuit mode `contacts` holds at most the first contact found.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CollisionResult {
    pub in_collision: bool,
    pub contacts: Vec<Contact>,
}

impl CollisionResult {
    pub fn free() -> Self {
        Self::default()
    }

    pub fn first_contact(&self) -> Option<Contact> {
        self.contacts.first().copied()
    }
}

/// Collision check of configuration `q` against `env`.
pub fn check(
    geometry: &RobotGeometry,
    q: &[f64],
    env: &Environment,
    mode: CollisionMode,
) -> Result<CollisionResult, KinematicsError> {
    let state = ChainState::new(geometry, q)?;
    Ok(check_poses(state.poses(), env, mode))
}

/// Collision check of already-computed link poses.
pub fn check_poses(poses: &[LinkPose], env: &Environment, mode: CollisionMode) -> CollisionResult {
    let mut result = CollisionResult::free();
    for pose in poses {
        for (index, obstacle) in env.obstacles().iter().enumerate() {
            if link_hits_obstacle(pose, obstacle, env.margin_of(obstacle)) {
                result.in_collision = true;
                result.contacts.push(Contact {
                    link: pose.index,
                    obstacle: index,
                });
                if mode == CollisionMode::ShortCircuit {
                    return result;
                }
            }
        }
    }
    result
}

/// Whether one posed link touches one obstacle inflated by `margin`.
pub fn link_hits_obstacle(pose: &LinkPose, obstacle: &Obstacle, margin: f64) -> bool {
    // Probes lie within `r` of the obstacle center and inflate by at most
    // `r + margin`; square-inflated corners reach farthest.
    let r = obstacle.bounding_radius();
    let reach = pose.inflated_radius(r + margin) + r;
    if (pose.center() - obstacle.center()).norm_squared() > reach * reach {
        return false;
    }
    obstacle
        .probe_points()
        .any(|(p, radius)| link_contains(pose, &p, radius + margin))
}

/// Whether any pair of non-adjacent joint points sits closer than
/// `1.5 x` the widest link. The base/end-effector pair is exempt.
pub fn self_collision(geometry: &RobotGeometry, poses: &[LinkPose]) -> bool {
    let joints: Vec<Point2<f64>> = std::iter::once(Point2::origin())
        .chain(poses.iter().map(|pose| pose.distal))
        .collect();
    let min_distance = geometry.max_width() * 1.5;
    let last = joints.len() - 1;
    for i in 0..joints.len() {
        for j in (i + 2)..joints.len() {
            if i == 0 && j == last {
                continue;
            }
            if (joints[i] - joints[j]).norm() < min_distance {
                return true;
            }
        }
    }
    false
}

// ---------------------------------------------------------------------------
// Batch helpers
// ---------------------------------------------------------------------------

/// Short-circuit check of many configurations; `true` means colliding.
pub fn check_many(
    geometry: &RobotGeometry,
    configurations: &[Vec<f64>],
    env: &Environment,
) -> Result<Vec<bool>, KinematicsError> {
    configurations
        .iter()
        .map(|q| check(geometry, q, env, CollisionMode::ShortCircuit).map(|r| r.in_collision))
        .collect()
}

/// The collision-free configurations, in input order.
pub fn filter_collision_free(
    geometry: &RobotGeometry,
    configurations: &[Vec<f64>],
    env: &Environment,
) -> Result<Vec<Vec<f64>>, KinematicsError> {
    let flags = check_many(geometry, configurations, env)?;
    let free: Vec<Vec<f64>> = configurations
        .iter()
        .zip(flags)
        .filter(|(_, colliding)| !colliding)
        .map(|(q, _)| q.clone())
        .collect();
    tracing::debug!(
        total = configurations.len(),
        free = free.len(),
        environment = env.name(),
        "filtered configurations"
    );
    Ok(free)
}
