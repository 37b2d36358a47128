use std::f64::consts::{FRAC_PI_2, PI};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::geometry::{GeometryRecord, GeometryRegistry};
use crate::obstacle::DEFAULT_MARGIN;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_margin() -> f64 {
    DEFAULT_MARGIN
}
const fn default_attractive_gain() -> f64 {
    5.0
}
const fn default_repulsive_gain() -> f64 {
    2.0
}
const fn default_repulsive_range() -> f64 {
    1.0
}
const fn default_max_force() -> f64 {
    50.0
}
const fn default_pd_gain_p() -> f64 {
    10.0
}
const fn default_pd_gain_d() -> f64 {
    12.0
}
const fn default_task_gain() -> f64 {
    10.0
}
const fn default_one() -> f64 {
    1.0
}
const fn default_obstacle_range() -> f64 {
    1.5
}
const fn default_inertia() -> f64 {
    5.0
}
const fn default_singular_threshold() -> f64 {
    1e-3
}
const fn default_torque_limit() -> f64 {
    20.0
}
const fn default_num_poses() -> usize {
    100
}
const fn default_max_attempts() -> usize {
    1000
}
const fn default_seed() -> u64 {
    42
}
const fn default_workers() -> usize {
    1
}
const fn default_true() -> bool {
    true
}
const fn default_dt() -> f64 {
    0.1
}
const fn default_joint_damping() -> f64 {
    2500.0
}
const fn default_max_steps() -> usize {
    20_000
}
const fn default_tolerance() -> f64 {
    0.05
}
fn default_schedule() -> Vec<GainStage> {
    vec![
        GainStage {
            min_distance: 2.0,
            kp: 15.0,
            kd: 8.0,
        },
        GainStage {
            min_distance: 0.5,
            kp: 10.0,
            kd: 12.0,
        },
        GainStage {
            min_distance: 0.0,
            kp: 8.0,
            kd: 15.0,
        },
    ]
}

fn check_non_negative(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be finite and >= 0, got {value}")))
    }
}

fn check_positive(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be finite and > 0, got {value}")))
    }
}

// ---------------------------------------------------------------------------
// CollisionConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionConfig {
    /// Margin for obstacles that carry none of their own.
    #[serde(default = "default_margin")]
    pub default_margin: f64,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            default_margin: default_margin(),
        }
    }
}

// ---------------------------------------------------------------------------
// RepulsionPoints
// ---------------------------------------------------------------------------

/// Where obstacle distance is measured for potential-field repulsion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepulsionPoints {
    /// Only the end-effector is repelled.
    #[default]
    EndEffector,
    /// Every link midpoint is repelled, each through its own point Jacobian.
    LinkMidpoints,
}

// ---------------------------------------------------------------------------
// Repulsion
// ---------------------------------------------------------------------------

/// Repulsive term shared by both potential-field policies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepulsionConfig {
    #[serde(default = "default_repulsive_gain")]
    pub repulsive_gain: f64,
    /// Obstacles farther than this contribute nothing.
    #[serde(default = "default_repulsive_range")]
    pub repulsive_range: f64,
    #[serde(default)]
    pub repulsion_points: RepulsionPoints,
}

impl Default for RepulsionConfig {
    fn default() -> Self {
        Self {
            repulsive_gain: default_repulsive_gain(),
            repulsive_range: default_repulsive_range(),
            repulsion_points: RepulsionPoints::default(),
        }
    }
}

impl RepulsionConfig {
    fn validate(&self, section: &str) -> Result<(), ConfigError> {
        check_non_negative(&format!("{section}.repulsive_gain"), self.repulsive_gain)?;
        check_positive(&format!("{section}.repulsive_range"), self.repulsive_range)
    }
}

// ---------------------------------------------------------------------------
// PotentialFieldConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PotentialFieldConfig {
    #[serde(default = "default_attractive_gain")]
    pub attractive_gain: f64,
    #[serde(default = "default_max_force")]
    pub max_force: f64,
    #[serde(flatten)]
    pub repulsion: RepulsionConfig,
}

impl Default for PotentialFieldConfig {
    fn default() -> Self {
        Self {
            attractive_gain: default_attractive_gain(),
            max_force: default_max_force(),
            repulsion: RepulsionConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// PotentialFieldPdConfig
// ---------------------------------------------------------------------------

/// One row of the adaptive PD schedule: applies while the end-effector is
/// farther than `min_distance` from the target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GainStage {
    pub min_distance: f64,
    pub kp: f64,
    pub kd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PotentialFieldPdConfig {
    #[serde(default = "default_pd_gain_p")]
    pub pd_gain_p: f64,
    #[serde(default = "default_pd_gain_d")]
    pub pd_gain_d: f64,
    #[serde(default = "default_max_force")]
    pub max_force: f64,
    #[serde(flatten)]
    pub repulsion: RepulsionConfig,
    /// Replace the fixed gains with the distance-keyed schedule.
    #[serde(default)]
    pub adaptive: bool,
    /// Stages sorted by descending `min_distance`; first match wins.
    #[serde(default = "default_schedule")]
    pub schedule: Vec<GainStage>,
}

impl Default for PotentialFieldPdConfig {
    fn default() -> Self {
        Self {
            pd_gain_p: default_pd_gain_p(),
            pd_gain_d: default_pd_gain_d(),
            max_force: default_max_force(),
            repulsion: RepulsionConfig::default(),
            adaptive: false,
            schedule: default_schedule(),
        }
    }
}

impl PotentialFieldPdConfig {
    /// `(kp, kd)` to use at `distance` from the target.
    pub fn gains_at(&self, distance: f64) -> (f64, f64) {
        if !self.adaptive {
            return (self.pd_gain_p, self.pd_gain_d);
        }
        self.schedule
            .iter()
            .find(|stage| distance > stage.min_distance)
            .or_else(|| self.schedule.last())
            .map_or((self.pd_gain_p, self.pd_gain_d), |s| (s.kp, s.kd))
    }
}

// ---------------------------------------------------------------------------
// RmpConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RmpConfig {
    /// Stiffness of the goal attractor acceleration.
    #[serde(default = "default_task_gain")]
    pub task_gain: f64,
    /// Scale of the (isotropic) goal metric.
    #[serde(default = "default_one")]
    pub goal_weight: f64,
    #[serde(default = "default_one")]
    pub obstacle_gain: f64,
    /// Scale of the obstacle metric; zero disables obstacle RMPs.
    #[serde(default = "default_one")]
    pub obstacle_weight: f64,
    #[serde(default = "default_obstacle_range")]
    pub obstacle_range: f64,
    /// Velocity damping on the goal acceleration.
    #[serde(default)]
    pub damping: f64,
    /// Task-space inertia converting acceleration into force.
    #[serde(default = "default_inertia")]
    pub inertia: f64,
    #[serde(default = "default_max_force")]
    pub max_force: f64,
}

impl Default for RmpConfig {
    fn default() -> Self {
        Self {
            task_gain: default_task_gain(),
            goal_weight: default_one(),
            obstacle_gain: default_one(),
            obstacle_weight: default_one(),
            obstacle_range: default_obstacle_range(),
            damping: 0.0,
            inertia: default_inertia(),
            max_force: default_max_force(),
        }
    }
}

// ---------------------------------------------------------------------------
// SingularityConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SingularityConfig {
    /// Smallest-singular-value threshold below which a pose is near singular.
    #[serde(default = "default_singular_threshold")]
    pub threshold: f64,
    /// Joint torque norm cap applied to near-singular commands.
    #[serde(default = "default_torque_limit")]
    pub torque_limit: f64,
}

impl Default for SingularityConfig {
    fn default() -> Self {
        Self {
            threshold: default_singular_threshold(),
            torque_limit: default_torque_limit(),
        }
    }
}

// ---------------------------------------------------------------------------
// SamplerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplerConfig {
    #[serde(default = "default_num_poses")]
    pub num_poses: usize,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Per-joint `[min, max]` ranges. When absent, joint 0 spans
    /// `[-pi, pi]` and the rest `[-pi/2, pi/2]`.
    #[serde(default)]
    pub joint_limits: Option<Vec<[f64; 2]>>,
    #[serde(default = "default_true")]
    pub check_self_collision: bool,
    #[serde(default = "default_true")]
    pub enforce_workspace_bounds: bool,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            num_poses: default_num_poses(),
            max_attempts: default_max_attempts(),
            seed: default_seed(),
            workers: default_workers(),
            joint_limits: None,
            check_self_collision: true,
            enforce_workspace_bounds: true,
        }
    }
}

/// Default per-joint ranges: the base joint spins freely, the rest bend up
/// to a right angle.
pub fn default_joint_limits(joints: usize) -> Vec<[f64; 2]> {
    (0..joints)
        .map(|i| if i == 0 { [-PI, PI] } else { [-FRAC_PI_2, FRAC_PI_2] })
        .collect()
}

impl SamplerConfig {
    /// Joint limits for an `n`-joint chain.
    pub fn limits_for(&self, n: usize) -> Vec<[f64; 2]> {
        self.joint_limits
            .clone()
            .unwrap_or_else(|| default_joint_limits(n))
    }
}

// ---------------------------------------------------------------------------
// SimulationConfig
// ---------------------------------------------------------------------------

/// Stand-in integrator and rollout settings.
///
/// The integrator feeds back last tick's joint velocity, so PD damping is
/// only stable while `kd * max_eig(J J^T) / joint_damping < 1`. The
/// defaults keep that product below 1 for every built-in geometry at
/// `kd = 15`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Control timestep in seconds.
    #[serde(default = "default_dt")]
    pub dt: f64,
    /// Viscous joint damping: joint velocity = torque / damping.
    #[serde(default = "default_joint_damping")]
    pub joint_damping: f64,
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    /// Distance to target at which a rollout counts as converged.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Run the collision detector before every step.
    #[serde(default)]
    pub collision_precheck: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            dt: default_dt(),
            joint_damping: default_joint_damping(),
            max_steps: default_max_steps(),
            tolerance: default_tolerance(),
            collision_precheck: false,
        }
    }
}

// ---------------------------------------------------------------------------
// LinkageConfig
// ---------------------------------------------------------------------------

/// Complete configuration loaded from TOML.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LinkageConfig {
    #[serde(default)]
    pub default_geometry: u32,
    /// Replaces the built-in geometry table when present.
    #[serde(default)]
    pub geometries: Option<Vec<GeometryRecord>>,
    #[serde(default)]
    pub collision: CollisionConfig,
    #[serde(default)]
    pub potential_field: PotentialFieldConfig,
    #[serde(default)]
    pub potential_field_pd: PotentialFieldPdConfig,
    #[serde(default)]
    pub rmp: RmpConfig,
    #[serde(default)]
    pub singularity: SingularityConfig,
    #[serde(default)]
    pub sampler: SamplerConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl LinkageConfig {
    /// Validate configuration. Returns Err on the first invalid value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_non_negative("collision.default_margin", self.collision.default_margin)?;

        let pf = &self.potential_field;
        check_non_negative("potential_field.attractive_gain", pf.attractive_gain)?;
        check_positive("potential_field.max_force", pf.max_force)?;
        pf.repulsion.validate("potential_field")?;

        let pd = &self.potential_field_pd;
        check_non_negative("potential_field_pd.pd_gain_p", pd.pd_gain_p)?;
        check_non_negative("potential_field_pd.pd_gain_d", pd.pd_gain_d)?;
        check_positive("potential_field_pd.max_force", pd.max_force)?;
        pd.repulsion.validate("potential_field_pd")?;
        if pd.adaptive && pd.schedule.is_empty() {
            return Err(ConfigError::invalid(
                "potential_field_pd.schedule",
                "adaptive gains need at least one stage",
            ));
        }

        let rmp = &self.rmp;
        for (field, value) in [
            ("rmp.task_gain", rmp.task_gain),
            ("rmp.goal_weight", rmp.goal_weight),
            ("rmp.obstacle_gain", rmp.obstacle_gain),
            ("rmp.obstacle_weight", rmp.obstacle_weight),
            ("rmp.damping", rmp.damping),
        ] {
            check_non_negative(field, value)?;
        }
        check_positive("rmp.obstacle_range", rmp.obstacle_range)?;
        check_positive("rmp.inertia", rmp.inertia)?;
        check_positive("rmp.max_force", rmp.max_force)?;

        check_non_negative("singularity.threshold", self.singularity.threshold)?;
        check_positive("singularity.torque_limit", self.singularity.torque_limit)?;

        if self.sampler.workers == 0 {
            return Err(ConfigError::invalid("sampler.workers", "must be >= 1"));
        }
        if let Some(limits) = &self.sampler.joint_limits {
            for (i, [lo, hi]) in limits.iter().enumerate() {
                if !(lo.is_finite() && hi.is_finite() && lo <= hi) {
                    return Err(ConfigError::invalid(
                        "sampler.joint_limits",
                        format!("joint {i}: [{lo}, {hi}] is not a valid range"),
                    ));
                }
            }
        }

        check_positive("simulation.dt", self.simulation.dt)?;
        check_positive("simulation.joint_damping", self.simulation.joint_damping)?;
        check_non_negative("simulation.tolerance", self.simulation.tolerance)?;
        Ok(())
    }

    /// Build the geometry registry this configuration describes.
    pub fn registry(&self) -> Result<GeometryRegistry, ConfigError> {
        match &self.geometries {
            Some(records) => Ok(GeometryRegistry::from_records(records.clone())?),
            None => Ok(GeometryRegistry::builtin()),
        }
    }

    /// Load from TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
