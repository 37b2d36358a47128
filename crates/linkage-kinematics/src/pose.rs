//! Per-link pose and the shape parameters derived from it.

use nalgebra::{Point2, Rotation2, Unit, Vector2};

use linkage_core::geometry::LinkShape;

/// Pose of one link, derived from a joint configuration.
///
/// The link's local frame is centered on its midpoint with +x along the
/// centerline (proximal to distal) and +y to its left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkPose {
    pub index: usize,
    pub proximal: Point2<f64>,
    pub distal: Point2<f64>,
    /// Absolute centerline orientation (cumulative joint angle).
    pub angle: f64,
    pub length: f64,
    pub width: f64,
    pub shape: LinkShape,
}

/// Collision parameters of a posed link in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeParams {
    /// Corners counter-clockwise, starting at proximal-right.
    Rectangle { corners: [Point2<f64>; 4] },
    Ellipse {
        center: Point2<f64>,
        semi_major: f64,
        semi_minor: f64,
        rotation: f64,
    },
}

impl LinkPose {
    /// Centerline midpoint.
    pub fn center(&self) -> Point2<f64> {
        nalgebra::center(&self.proximal, &self.distal)
    }

    /// Unit vector along the centerline.
    pub fn direction(&self) -> Unit<Vector2<f64>> {
        Unit::new_unchecked(Vector2::new(self.angle.cos(), self.angle.sin()))
    }

    pub fn half_length(&self) -> f64 {
        self.length * 0.5
    }

    pub fn half_width(&self) -> f64 {
        self.width * 0.5
    }

    /// Radius of the circle around [`center`](Self::center) enclosing the
    /// link shape with both half extents grown by `inflation`.
    pub fn inflated_radius(&self, inflation: f64) -> f64 {
        (self.half_length() + inflation).hypot(self.half_width() + inflation)
    }

    /// Express a world point in the link's local frame.
    pub fn to_local(&self, p: &Point2<f64>) -> Vector2<f64> {
        Rotation2::new(self.angle).inverse() * (p - self.center())
    }

    /// Express a local-frame offset in world coordinates.
    pub fn to_world(&self, local: &Vector2<f64>) -> Point2<f64> {
        self.center() + Rotation2::new(self.angle) * local
    }

    /// Rectangle corners in world coordinates.
    pub fn corners(&self) -> [Point2<f64>; 4] {
        let (hl, hw) = (self.half_length(), self.half_width());
        [
            Vector2::new(-hl, -hw),
            Vector2::new(hl, -hw),
            Vector2::new(hl, hw),
            Vector2::new(-hl, hw),
        ]
        .map(|v| self.to_world(&v))
    }

    pub fn shape_params(&self) -> ShapeParams {
        match self.shape {
            LinkShape::Rectangle => ShapeParams::Rectangle {
                corners: self.corners(),
            },
            LinkShape::Ellipse => ShapeParams::Ellipse {
                center: self.center(),
                semi_major: self.half_length(),
                semi_minor: self.half_width(),
                rotation: self.angle,
            },
        }
    }
}
