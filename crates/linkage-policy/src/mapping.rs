//! Task-space force to joint torque mapping shared by all policies.

use nalgebra::{DVector, Vector2};
use tracing::debug;

use linkage_core::config::SingularityConfig;
use linkage_kinematics::jacobian::{smallest_singular_value, transpose_map};

use crate::{ControlCommand, ControlInput};

/// Scale `v` down so its norm is at most `max`.
pub fn clamp_norm(v: Vector2<f64>, max: f64) -> Vector2<f64> {
    let norm = v.norm();
    if norm > max && norm > 0.0 {
        v * (max / norm)
    } else {
        v
    }
}

/// Scale a torque vector down so its norm is at most `max`.
pub fn clamp_torque(tau: DVector<f64>, max: f64) -> DVector<f64> {
    let norm = tau.norm();
    if norm > max && norm > 0.0 {
        tau * (max / norm)
    } else {
        tau
    }
}

/// Map an end-effector force through `J^T`, add any extra joint torques and
/// apply the near-singular clamp.
pub fn finish_command(
    input: &ControlInput<'_>,
    force: Vector2<f64>,
    extra: Option<DVector<f64>>,
    singularity: &SingularityConfig,
) -> ControlCommand {
    let mut torques = transpose_map(input.jacobian(), &force);
    if let Some(extra) = extra {
        torques += extra;
    }

    let sigma_min = smallest_singular_value(input.jacobian());
    let near_singular = sigma_min < singularity.threshold;
    if near_singular {
        debug!(
            sigma_min,
            torque_norm = torques.norm(),
            limit = singularity.torque_limit,
            "near-singular pose, clamping torques"
        );
        torques = clamp_torque(torques, singularity.torque_limit);
    }

    ControlCommand {
        torques,
        cartesian_force: force,
        near_singular,
        target_unreachable: input.target_unreachable(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use linkage_core::Point2;
    use linkage_test_utils::{empty_env, standard_geometry};

    #[test]
    fn clamp_norm_limits_magnitude() {
        let v = clamp_norm(Vector2::new(30.0, 40.0), 10.0);
        assert_relative_eq!(v.norm(), 10.0, epsilon = 1e-12);
        assert_relative_eq!(v.x / v.y, 0.75, epsilon = 1e-12);
        let small = clamp_norm(Vector2::new(1.0, 0.0), 10.0);
        assert_relative_eq!(small.x, 1.0);
    }

    #[test]
    fn clamp_zero_is_zero() {
        assert_relative_eq!(clamp_norm(Vector2::zeros(), 0.0).norm(), 0.0);
    }

    #[test]
    fn singular_pose_clamps_torque() {
        let geometry = standard_geometry();
        let env = empty_env();
        // straight arm, sideways force: J^T F is large
        let input =
            ControlInput::new(&geometry, &[0.0; 3], &[0.0; 3], Point2::new(0.0, 5.0), &env).unwrap();
        let cmd = finish_command(
            &input,
            Vector2::new(0.0, 50.0),
            None,
            &SingularityConfig::default(),
        );
        assert!(cmd.near_singular);
        assert_relative_eq!(cmd.torques.norm(), 20.0, epsilon = 1e-9);
        // direction preserved
        assert!(cmd.torques.iter().all(|t| *t > 0.0));
    }

    #[test]
    fn regular_pose_not_clamped() {
        let geometry = standard_geometry();
        let env = empty_env();
        let input = ControlInput::new(
            &geometry,
            &[0.0, 1.0, 1.0],
            &[0.0; 3],
            Point2::new(0.0, 5.0),
            &env,
        )
        .unwrap();
        let force = Vector2::new(0.0, 50.0);
        let cmd = finish_command(&input, force, None, &SingularityConfig::default());
        assert!(!cmd.near_singular);
        let expected = input.jacobian().transpose() * force;
        assert_relative_eq!(cmd.torques, expected, epsilon = 1e-12);
    }
}
