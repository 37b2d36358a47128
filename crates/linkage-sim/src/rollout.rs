//! Closed control loop: policy, stand-in integrator and optional collision
//! pre-check, stepped until the end-effector reaches the target.

use linkage_collision::{CollisionMode, Contact, check};
use linkage_core::Point2;
use linkage_core::config::SimulationConfig;
use linkage_core::geometry::RobotGeometry;
use linkage_core::obstacle::Environment;
use linkage_kinematics::{chain::check_dimension, end_effector};
use linkage_policy::{ControlCommand, ControlInput, ControlPolicy};
use tracing::{debug, info, warn};

use crate::SimError;
use crate::integrator::KinematicIntegrator;

// ---------------------------------------------------------------------------
// Rollout
// ---------------------------------------------------------------------------

/// How a rollout ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolloutStatus {
    /// End-effector within tolerance of the target.
    Converged,
    /// Step budget used up.
    Truncated,
    /// The pre-check found a contact before the step was taken.
    Collided(Contact),
}

impl RolloutStatus {
    pub const fn is_converged(self) -> bool {
        matches!(self, Self::Converged)
    }
}

/// Trace and final state of one rollout.
#[derive(Debug, Clone, PartialEq)]
pub struct Rollout {
    pub q: Vec<f64>,
    pub qdot: Vec<f64>,
    /// Commands applied.
    pub steps: usize,
    pub status: RolloutStatus,
    /// Distance to target before the first step and after every step.
    pub distances: Vec<f64>,
    /// Steps whose command was clamped for a near-singular Jacobian.
    pub near_singular_steps: usize,
    pub target_unreachable: bool,
}

impl Rollout {
    pub fn final_distance(&self) -> f64 {
        self.distances.last().copied().unwrap_or(f64::INFINITY)
    }

    /// Whether distance never grew by more than `tolerance` between steps.
    pub fn is_monotone(&self, tolerance: f64) -> bool {
        self.distances.windows(2).all(|w| w[1] <= w[0] + tolerance)
    }
}

// ---------------------------------------------------------------------------
// ControlLoop
// ---------------------------------------------------------------------------

/// One policy driving one geometry in one environment.
pub struct ControlLoop<'a> {
    geometry: &'a RobotGeometry,
    env: &'a Environment,
    policy: &'a dyn ControlPolicy,
    integrator: KinematicIntegrator,
    max_steps: usize,
    tolerance: f64,
    collision_precheck: bool,
}

impl<'a> ControlLoop<'a> {
    pub fn new(
        geometry: &'a RobotGeometry,
        env: &'a Environment,
        policy: &'a dyn ControlPolicy,
        config: &SimulationConfig,
    ) -> Result<Self, SimError> {
        Ok(Self {
            geometry,
            env,
            policy,
            integrator: KinematicIntegrator::from_config(config)?,
            max_steps: config.max_steps,
            tolerance: config.tolerance,
            collision_precheck: config.collision_precheck,
        })
    }

    #[must_use]
    pub const fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    #[must_use]
    pub const fn with_collision_precheck(mut self, enabled: bool) -> Self {
        self.collision_precheck = enabled;
        self
    }

    pub fn policy_name(&self) -> &str {
        self.policy.name()
    }

    /// Compute one command at `(q, qdot)` and integrate it in place.
    pub fn step(
        &self,
        q: &mut [f64],
        qdot: &mut [f64],
        target: Point2<f64>,
    ) -> Result<ControlCommand, SimError> {
        let command = {
            let input = ControlInput::new(self.geometry, q, qdot, target, self.env)?;
            self.policy.compute_command(&input)
        };
        self.integrator.step(q, qdot, command.torques())?;
        Ok(command)
    }

    /// Run from rest at `q0` until converged, collided or out of steps.
    pub fn run(&self, q0: &[f64], target: Point2<f64>) -> Result<Rollout, SimError> {
        check_dimension(self.geometry, q0)?;
        let mut q = q0.to_vec();
        let mut qdot = vec![0.0; q.len()];
        let mut distances = vec![self.distance(&q, target)?];
        let mut near_singular_steps = 0;
        let mut target_unreachable = false;
        let mut status = None;

        for _ in 0..self.max_steps {
            if distances.last().is_some_and(|d| *d <= self.tolerance) {
                status = Some(RolloutStatus::Converged);
                break;
            }
            if self.collision_precheck {
                let result = check(self.geometry, &q, self.env, CollisionMode::ShortCircuit)?;
                if let Some(contact) = result.first_contact() {
                    warn!(
                        link = contact.link,
                        obstacle = contact.obstacle,
                        step = distances.len() - 1,
                        "collision pre-check stopped the rollout"
                    );
                    status = Some(RolloutStatus::Collided(contact));
                    break;
                }
            }

            let command = self.step(&mut q, &mut qdot, target)?;
            near_singular_steps += usize::from(command.near_singular);
            target_unreachable |= command.target_unreachable;
            distances.push(self.distance(&q, target)?);
        }

        let status = status.unwrap_or(if distances.last().is_some_and(|d| *d <= self.tolerance) {
            RolloutStatus::Converged
        } else {
            RolloutStatus::Truncated
        });
        let rollout = Rollout {
            q,
            qdot,
            steps: distances.len() - 1,
            status,
            distances,
            near_singular_steps,
            target_unreachable,
        };
        if rollout.near_singular_steps > 0 {
            debug!(steps = rollout.near_singular_steps, "near-singular steps during rollout");
        }
        info!(
            policy = self.policy.name(),
            geometry = self.geometry.id(),
            steps = rollout.steps,
            final_distance = rollout.final_distance(),
            status = ?rollout.status,
            "rollout finished"
        );
        Ok(rollout)
    }

    fn distance(&self, q: &[f64], target: Point2<f64>) -> Result<f64, SimError> {
        Ok((target - end_effector(self.geometry, q)?).norm())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
