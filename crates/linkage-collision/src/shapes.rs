//! Point-in-inflated-link tests in the link's local frame.

use nalgebra::{Point2, Vector2};

use linkage_core::geometry::LinkShape;
use linkage_kinematics::LinkPose;

/// Whether `local` lies inside the link shape grown by `inflation`.
///
/// Rectangles grow `inflation` along both local axes (square corners).
/// Ellipses grow both semi-axes by `inflation`.
pub fn contains_local(
    shape: LinkShape,
    half_length: f64,
    half_width: f64,
    local: &Vector2<f64>,
    inflation: f64,
) -> bool {
    match shape {
        LinkShape::Rectangle => {
            local.x.abs() <= half_length + inflation && local.y.abs() <= half_width + inflation
        }
        LinkShape::Ellipse => {
            let a = half_length + inflation;
            let b = half_width + inflation;
            let (u, v) = (local.x / a, local.y / b);
            u * u + v * v <= 1.0
        }
    }
}

/// Whether world point `p` lies inside `pose`'s shape grown by `inflation`.
pub fn link_contains(pose: &LinkPose, p: &Point2<f64>, inflation: f64) -> bool {
    let local = pose.to_local(p);
    contains_local(
        pose.shape,
        pose.half_length(),
        pose.half_width(),
        &local,
        inflation,
    )
}
