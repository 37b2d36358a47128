//! Forward kinematics of a planar revolute chain.
//!
//! The base joint sits at the origin. Link `i` is rotated by the cumulative
//! sum of joint angles `q[0..=i]`, starts at the distal end of link `i - 1`
//! and extends `length[i]` along its orientation.

use nalgebra::{Matrix2xX, Point2, Vector2};

use linkage_core::error::KinematicsError;
use linkage_core::geometry::RobotGeometry;

use crate::jacobian;
use crate::pose::LinkPose;

/// Check that `q` has one angle per link.
pub fn check_dimension(geometry: &RobotGeometry, q: &[f64]) -> Result<(), KinematicsError> {
    if q.len() == geometry.link_count() {
        Ok(())
    } else {
        Err(KinematicsError::DimensionMismatch {
            expected: geometry.link_count(),
            got: q.len(),
        })
    }
}

/// Pose of every link for joint configuration `q`.
pub fn link_poses(geometry: &RobotGeometry, q: &[f64]) -> Result<Vec<LinkPose>, KinematicsError> {
    check_dimension(geometry, q)?;

    let mut poses = Vec::with_capacity(q.len());
    let mut proximal = Point2::origin();
    let mut angle = 0.0;
    for (index, &joint) in q.iter().enumerate() {
        angle += joint;
        let length = geometry.lengths()[index];
        let distal = proximal + Vector2::new(angle.cos(), angle.sin()) * length;
        poses.push(LinkPose {
            index,
            proximal,
            distal,
            angle,
            length,
            width: geometry.widths()[index],
            shape: geometry.shapes()[index],
        });
        proximal = distal;
    }
    Ok(poses)
}

/// End-effector position (distal point of the last link).
pub fn end_effector(geometry: &RobotGeometry, q: &[f64]) -> Result<Point2<f64>, KinematicsError> {
    Ok(ChainState::new(geometry, q)?.end_effector())
}

/// Joint positions: the base followed by every link's distal point.
pub fn joint_positions(
    geometry: &RobotGeometry,
    q: &[f64],
) -> Result<Vec<Point2<f64>>, KinematicsError> {
    Ok(ChainState::new(geometry, q)?.joint_positions())
}

/// Link poses for one configuration, computed once and queried many times.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainState {
    poses: Vec<LinkPose>,
}

impl ChainState {
    pub fn new(geometry: &RobotGeometry, q: &[f64]) -> Result<Self, KinematicsError> {
        Ok(Self {
            poses: link_poses(geometry, q)?,
        })
    }

    pub fn poses(&self) -> &[LinkPose] {
        &self.poses
    }

    pub fn into_poses(self) -> Vec<LinkPose> {
        self.poses
    }

    pub fn link_count(&self) -> usize {
        self.poses.len()
    }

    pub fn end_effector(&self) -> Point2<f64> {
        self.poses
            .last()
            .map_or_else(Point2::origin, |pose| pose.distal)
    }

    pub fn joint_positions(&self) -> Vec<Point2<f64>> {
        std::iter::once(Point2::origin())
            .chain(self.poses.iter().map(|pose| pose.distal))
            .collect()
    }

    /// Link centerline midpoints.
    pub fn midpoints(&self) -> Vec<Point2<f64>> {
        self.poses.iter().map(LinkPose::center).collect()
    }

    /// End-effector Jacobian (2 x N).
    pub fn jacobian(&self) -> Matrix2xX<f64> {
        jacobian::end_effector_jacobian(&self.poses)
    }

    /// Jacobian of a point rigidly attached to link `link`.
    pub fn point_jacobian(
        &self,
        link: usize,
        point: &Point2<f64>,
    ) -> Result<Matrix2xX<f64>, KinematicsError> {
        jacobian::point_jacobian(&self.poses, link, point)
    }
}
