//! Reference geometries and environments.

use linkage_core::geometry::{GeometryRegistry, RobotGeometry};
use linkage_core::obstacle::{Environment, Obstacle};
use linkage_core::Point2;

/// The built-in registry.
pub fn registry() -> GeometryRegistry {
    GeometryRegistry::builtin()
}

fn builtin(id: u32) -> RobotGeometry {
    registry()
        .get(id)
        .cloned()
        .unwrap_or_else(|err| panic!("built-in geometry {id}: {err}"))
}

/// Lengths `[3.0, 2.5, 2.0]`, rectangles.
pub fn standard_geometry() -> RobotGeometry {
    builtin(0)
}

/// Lengths `[2.5, 2.0, 1.5]`, rectangles.
pub fn compact_geometry() -> RobotGeometry {
    builtin(1)
}

/// Lengths `[3.0, 2.5, 2.0]`, ellipses.
pub fn ellipse_geometry() -> RobotGeometry {
    builtin(3)
}

/// No obstacles, no bounds.
pub fn empty_env() -> Environment {
    Environment::empty("empty")
}

/// A single circle obstacle with an explicit margin.
pub fn circle_env(center: [f64; 2], radius: f64, margin: f64) -> Environment {
    let obstacle = Obstacle::circle(Point2::new(center[0], center[1]), radius)
        .and_then(|o| o.with_margin(margin))
        .unwrap_or_else(|err| panic!("fixture circle: {err}"));
    Environment::new("circle", vec![obstacle])
}

/// Circle at (4, 3), radius 0.3, margin 0.1.
pub fn scenario_c_env() -> Environment {
    circle_env([4.0, 3.0], 0.3, 0.1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixtures_build() {
        assert_eq!(standard_geometry().link_count(), 3);
        assert!(empty_env().is_empty());
        assert_eq!(scenario_c_env().obstacles()[0].margin(), Some(0.1));
    }
}
