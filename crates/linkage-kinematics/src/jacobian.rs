//! Analytic Jacobians of planar revolute chains and singularity measures.

use nalgebra::{DVector, Matrix2xX, Point2, Vector2};

use linkage_core::error::KinematicsError;
use linkage_core::geometry::RobotGeometry;

use crate::chain::ChainState;
use crate::pose::LinkPose;

/// Rotate a planar vector by +90 degrees.
fn perp(v: Vector2<f64>) -> Vector2<f64> {
    Vector2::new(-v.y, v.x)
}

/// End-effector Jacobian for configuration `q`.
///
/// Column `i` is `(ee - proximal_i)` rotated by 90 degrees.
pub fn jacobian(geometry: &RobotGeometry, q: &[f64]) -> Result<Matrix2xX<f64>, KinematicsError> {
    Ok(ChainState::new(geometry, q)?.jacobian())
}

pub(crate) fn end_effector_jacobian(poses: &[LinkPose]) -> Matrix2xX<f64> {
    let ee = poses.last().map_or_else(Point2::origin, |pose| pose.distal);
    let mut jac = Matrix2xX::zeros(poses.len());
    for (i, pose) in poses.iter().enumerate() {
        jac.set_column(i, &perp(ee - pose.proximal));
    }
    jac
}

/// Jacobian of `point`, rigidly attached to link `link`.
///
/// Joints after `link` do not move the point, so their columns are zero.
pub(crate) fn point_jacobian(
    poses: &[LinkPose],
    link: usize,
    point: &Point2<f64>,
) -> Result<Matrix2xX<f64>, KinematicsError> {
    if link >= poses.len() {
        return Err(KinematicsError::LinkOutOfRange {
            index: link,
            links: poses.len(),
        });
    }
    let mut jac = Matrix2xX::zeros(poses.len());
    for (i, pose) in poses.iter().enumerate().take(link + 1) {
        jac.set_column(i, &perp(point - pose.proximal));
    }
    Ok(jac)
}

/// Cartesian velocity `J * qdot`.
pub fn cartesian_velocity(jac: &Matrix2xX<f64>, qdot: &[f64]) -> Vector2<f64> {
    jac * DVector::from_column_slice(qdot)
}

/// Joint torques `J^T * force`.
pub fn transpose_map(jac: &Matrix2xX<f64>, force: &Vector2<f64>) -> DVector<f64> {
    jac.transpose() * force
}

/// Smallest singular value of a 2 x N Jacobian.
///
/// Closed form via the eigenvalues of the 2 x 2 matrix `J * J^T`.
pub fn smallest_singular_value(jac: &Matrix2xX<f64>) -> f64 {
    let jjt = jac * jac.transpose();
    let (a, b, d) = (jjt[(0, 0)], jjt[(0, 1)], jjt[(1, 1)]);
    let disc = (a - d).hypot(2.0 * b);
    let lambda_min = 0.5 * (a + d - disc);
    lambda_min.max(0.0).sqrt()
}

/// Whether the Jacobian's smallest singular value is below `threshold`.
pub fn is_near_singular(jac: &Matrix2xX<f64>, threshold: f64) -> bool {
    smallest_singular_value(jac) < threshold
}
