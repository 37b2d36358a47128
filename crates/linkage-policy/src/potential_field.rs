//! Potential-field policies: attraction to the target plus inverse-distance
//! repulsion from nearby obstacle surfaces.
//!
//! Repulsion distance is measured from the end-effector by default. With
//! [`RepulsionPoints::LinkMidpoints`] every link midpoint is repelled
//! instead, each force mapped to torques through that midpoint's own
//! Jacobian.

use nalgebra::{DVector, Point2, Vector2};

use linkage_core::config::{
    PotentialFieldConfig, PotentialFieldPdConfig, RepulsionConfig, RepulsionPoints,
    SingularityConfig,
};
use linkage_core::obstacle::Environment;

use crate::mapping::{clamp_norm, finish_command};
use crate::{ControlCommand, ControlInput, ControlPolicy};

/// Distances are clamped to at least this before inversion.
pub const MIN_DISTANCE: f64 = 1e-3;

/// Sum of repulsive forces on `point` from every obstacle within range.
///
/// Each obstacle contributes `gain * (1/d - 1/range) / d^2` along the
/// outward surface normal, where `d` is the distance to its inflated surface.
pub fn repulsive_force(point: &Point2<f64>, env: &Environment, cfg: &RepulsionConfig) -> Vector2<f64> {
    let mut force = Vector2::zeros();
    for obstacle in env.obstacles() {
        let surface = obstacle.surface_distance(point, env.margin_of(obstacle));
        if surface.distance >= cfg.repulsive_range {
            continue;
        }
        let d = surface.distance.max(MIN_DISTANCE);
        let magnitude = cfg.repulsive_gain * (1.0 / d - 1.0 / cfg.repulsive_range) / (d * d);
        force += surface.direction.into_inner() * magnitude;
    }
    force
}

/// Repulsion applied at every link midpoint, as joint torques.
///
/// Returns the summed Cartesian force (for reporting) and the torques.
fn midpoint_repulsion(
    input: &ControlInput<'_>,
    cfg: &RepulsionConfig,
    max_force: f64,
) -> (Vector2<f64>, DVector<f64>) {
    let state = input.state();
    let mut total = Vector2::zeros();
    let mut torques = DVector::zeros(state.link_count());
    for (link, mid) in state.midpoints().iter().enumerate() {
        let force = clamp_norm(repulsive_force(mid, input.env(), cfg), max_force);
        if force == Vector2::zeros() {
            continue;
        }
        // link < link_count, so the Jacobian always exists
        if let Ok(jac) = state.point_jacobian(link, mid) {
            torques += jac.transpose() * force;
        }
        total += force;
    }
    (total, torques)
}

/// Shared tail of both potential-field variants.
fn apply_repulsion(
    input: &ControlInput<'_>,
    attraction: Vector2<f64>,
    repulsion: &RepulsionConfig,
    max_force: f64,
    singularity: &SingularityConfig,
) -> ControlCommand {
    match repulsion.repulsion_points {
        RepulsionPoints::EndEffector => {
            let rep = repulsive_force(&input.end_effector(), input.env(), repulsion);
            let net = clamp_norm(attraction + rep, max_force);
            finish_command(input, net, None, singularity)
        }
        RepulsionPoints::LinkMidpoints => {
            let net = clamp_norm(attraction, max_force);
            let (rep, extra) = midpoint_repulsion(input, repulsion, max_force);
            let mut cmd = finish_command(input, net, Some(extra), singularity);
            cmd.cartesian_force = net + rep;
            cmd
        }
    }
}

// ---------------------------------------------------------------------------
// PotentialFieldPolicy
// ---------------------------------------------------------------------------

/// `F = clamp(k_att * e) + F_rep`, clamped to `max_force`; `tau = J^T F`.
#[derive(Debug, Clone, PartialEq)]
pub struct PotentialFieldPolicy {
    config: PotentialFieldConfig,
    singularity: SingularityConfig,
}

impl PotentialFieldPolicy {
    pub const fn new(config: PotentialFieldConfig, singularity: SingularityConfig) -> Self {
        Self {
            config,
            singularity,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(PotentialFieldConfig::default(), SingularityConfig::default())
    }

    pub const fn config(&self) -> &PotentialFieldConfig {
        &self.config
    }
}

impl ControlPolicy for PotentialFieldPolicy {
    fn compute_command(&self, input: &ControlInput<'_>) -> ControlCommand {
        let cfg = &self.config;
        let attraction = clamp_norm(cfg.attractive_gain * input.position_error(), cfg.max_force);
        apply_repulsion(input, attraction, &cfg.repulsion, cfg.max_force, &self.singularity)
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "PotentialFieldPolicy"
    }
}

// ---------------------------------------------------------------------------
// PotentialFieldPdPolicy
// ---------------------------------------------------------------------------

/// `F = clamp(Kp * e) - Kd * (J qdot) + F_rep`, clamped to `max_force`.
///
/// With `adaptive` set, `Kp`/`Kd` come from the distance-keyed schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct PotentialFieldPdPolicy {
    config: PotentialFieldPdConfig,
    singularity: SingularityConfig,
}

impl PotentialFieldPdPolicy {
    pub const fn new(config: PotentialFieldPdConfig, singularity: SingularityConfig) -> Self {
        Self {
            config,
            singularity,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(PotentialFieldPdConfig::default(), SingularityConfig::default())
    }

    pub const fn config(&self) -> &PotentialFieldPdConfig {
        &self.config
    }
}

impl ControlPolicy for PotentialFieldPdPolicy {
    fn compute_command(&self, input: &ControlInput<'_>) -> ControlCommand {
        let cfg = &self.config;
        let error = input.position_error();
        let (kp, kd) = cfg.gains_at(error.norm());
        let attraction = clamp_norm(kp * error, cfg.max_force) - kd * input.end_effector_velocity();
        apply_repulsion(input, attraction, &cfg.repulsion, cfg.max_force, &self.singularity)
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "PotentialFieldPdPolicy"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
