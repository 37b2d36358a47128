//! Riemannian Motion Policy at the end-effector.
//!
//! Each objective proposes a task-space acceleration `a_i` with a PSD
//! importance metric `A_i`. They are combined as the metric-weighted average
//! `a = (sum A_i)^-1 * sum(A_i * a_i)`, so objectives with small metrics
//! barely influence the result.

use nalgebra::{Matrix2, Vector2};

use linkage_core::config::{RmpConfig, SingularityConfig};

use crate::mapping::{clamp_norm, finish_command};
use crate::potential_field::MIN_DISTANCE;
use crate::{ControlCommand, ControlInput, ControlPolicy};

/// Regularisation added when the summed metric is singular.
const METRIC_REGULARIZATION: f64 = 1e-6;

/// One elementary motion policy: desired acceleration plus importance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rmp {
    pub accel: Vector2<f64>,
    pub metric: Matrix2<f64>,
}

impl Rmp {
    pub const fn new(accel: Vector2<f64>, metric: Matrix2<f64>) -> Self {
        Self { accel, metric }
    }

    /// Combine RMPs by metric-weighted averaging.
    ///
    /// A single RMP returns its own acceleration unchanged. If the summed
    /// metric cannot be inverted even after regularisation the result is
    /// zero.
    pub fn combine(rmps: &[Self]) -> Vector2<f64> {
        match rmps {
            [] => Vector2::zeros(),
            [only] => only.accel,
            _ => {
                let metric: Matrix2<f64> = rmps.iter().map(|r| r.metric).sum();
                let force: Vector2<f64> = rmps.iter().map(|r| r.metric * r.accel).sum();
                metric
                    .try_inverse()
                    .or_else(|| {
                        (metric + Matrix2::identity() * METRIC_REGULARIZATION).try_inverse()
                    })
                    .map_or_else(Vector2::zeros, |inv| inv * force)
            }
        }
    }
}

/// Goal attractor: `a = k (target - p) - c v`, isotropic metric.
pub fn goal_rmp(input: &ControlInput<'_>, cfg: &RmpConfig) -> Rmp {
    let accel = cfg.task_gain * input.position_error() - cfg.damping * input.end_effector_velocity();
    Rmp::new(accel, Matrix2::identity() * cfg.goal_weight)
}

/// Obstacle repellers within `obstacle_range` of the end-effector.
///
/// Acceleration `gain * n / d^2` along the outward normal `n`; metric
/// `w * n n^T` with `w = weight * (1 - d/range)^2 / d^4`, which vanishes at
/// the range boundary. Zero-weight repellers are dropped.
pub fn obstacle_rmps(input: &ControlInput<'_>, cfg: &RmpConfig) -> Vec<Rmp> {
    let ee = input.end_effector();
    let env = input.env();
    env.obstacles()
        .iter()
        .filter_map(|obstacle| {
            let surface = obstacle.surface_distance(&ee, env.margin_of(obstacle));
            if surface.distance >= cfg.obstacle_range {
                return None;
            }
            let d = surface.distance.max(MIN_DISTANCE);
            let falloff = (1.0 - d / cfg.obstacle_range).max(0.0);
            let weight = cfg.obstacle_weight * falloff * falloff / d.powi(4);
            if weight <= 0.0 {
                return None;
            }
            let n = surface.direction.into_inner();
            Some(Rmp::new(
                n * (cfg.obstacle_gain / (d * d)),
                n * n.transpose() * weight,
            ))
        })
        .collect()
}

/// RMP policy: combined acceleration times task inertia, through `J^T`.
#[derive(Debug, Clone, PartialEq)]
pub struct RmpPolicy {
    config: RmpConfig,
    singularity: SingularityConfig,
}

impl RmpPolicy {
    pub const fn new(config: RmpConfig, singularity: SingularityConfig) -> Self {
        Self {
            config,
            singularity,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(RmpConfig::default(), SingularityConfig::default())
    }

    pub const fn config(&self) -> &RmpConfig {
        &self.config
    }

    /// Combined task-space acceleration for this input.
    pub fn acceleration(&self, input: &ControlInput<'_>) -> Vector2<f64> {
        let mut rmps = vec![goal_rmp(input, &self.config)];
        rmps.extend(obstacle_rmps(input, &self.config));
        Rmp::combine(&rmps)
    }
}

impl ControlPolicy for RmpPolicy {
    fn compute_command(&self, input: &ControlInput<'_>) -> ControlCommand {
        let accel = self.acceleration(input);
        let force = clamp_norm(self.config.inertia * accel, self.config.max_force);
        finish_command(input, force, None, &self.singularity)
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "RmpPolicy"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use linkage_core::Point2;
    use linkage_test_utils::{circle_env, empty_env, standard_geometry};

    const BENT: [f64; 3] = [0.3, 0.8, 0.6];

    #[test]
    fn combine_single_returns_own_accel() {
        let rmp = Rmp::new(Vector2::new(1.5, -2.0), Matrix2::identity() * 3.0);
        assert_eq!(Rmp::combine(&[rmp]), Vector2::new(1.5, -2.0));
    }

    #[test]
    fn combine_weights_by_metric() {
        let a = Rmp::new(Vector2::new(1.0, 0.0), Matrix2::identity());
        let b = Rmp::new(Vector2::new(0.0, 1.0), Matrix2::identity() * 3.0);
        let c = Rmp::combine(&[a, b]);
        assert_relative_eq!(c, Vector2::new(0.25, 0.75), epsilon = 1e-12);
    }

    #[test]
    fn combine_rank_deficient_is_regularized() {
        let n = Vector2::new(1.0, 0.0);
        let a = Rmp::new(Vector2::new(2.0, 0.0), n * n.transpose());
        let b = Rmp::new(Vector2::new(4.0, 0.0), n * n.transpose());
        let c = Rmp::combine(&[a, b]);
        assert_relative_eq!(c.x, 3.0, epsilon = 1e-5);
        assert_relative_eq!(c.y, 0.0);
    }

    #[test]
    fn combine_empty_is_zero() {
        assert_eq!(Rmp::combine(&[]), Vector2::zeros());
    }

    #[test]
    fn zero_obstacle_weight_reduces_to_goal() {
        let geometry = standard_geometry();
        let qdot = [0.0; 3];
        let probe_env = empty_env();
        let probe =
            ControlInput::new(&geometry, &BENT, &qdot, Point2::new(2.0, 3.0), &probe_env).unwrap();
        let ee = probe.end_effector();
        let env = circle_env([ee.x + 0.4, ee.y], 0.1, 0.0);
        let input = ControlInput::new(&geometry, &BENT, &qdot, Point2::new(2.0, 3.0), &env).unwrap();

        let cfg = RmpConfig {
            obstacle_weight: 0.0,
            ..RmpConfig::default()
        };
        let policy = RmpPolicy::new(cfg.clone(), SingularityConfig::default());
        assert!(obstacle_rmps(&input, &cfg).is_empty());
        assert_eq!(policy.acceleration(&input), goal_rmp(&input, &cfg).accel);
    }

    #[test]
    fn nearby_obstacle_bends_acceleration_away() {
        let geometry = standard_geometry();
        let qdot = [0.0; 3];
        let probe_env = empty_env();
        let probe =
            ControlInput::new(&geometry, &BENT, &qdot, Point2::new(0.0, 0.0), &probe_env).unwrap();
        let ee = probe.end_effector();
        // target straight ahead in +x, obstacle slightly off to +y
        let env = circle_env([ee.x + 0.5, ee.y + 0.3], 0.1, 0.0);
        let target = Point2::new(ee.x + 2.0, ee.y);
        let input = ControlInput::new(&geometry, &BENT, &qdot, target, &env).unwrap();
        let accel = RmpPolicy::with_defaults().acceleration(&input);
        assert!(accel.y < 0.0);
        assert!(accel.x > 0.0);
    }

    #[test]
    fn command_is_inertia_scaled_force() {
        let geometry = standard_geometry();
        let env = empty_env();
        let qdot = [0.0; 3];
        let input = ControlInput::new(&geometry, &BENT, &qdot, Point2::new(2.0, 3.0), &env).unwrap();
        let policy = RmpPolicy::with_defaults();
        let cmd = policy.compute_command(&input);
        let expected = clamp_norm(5.0 * 10.0 * input.position_error(), 50.0);
        assert_relative_eq!(cmd.cartesian_force, expected, epsilon = 1e-12);
    }
}
