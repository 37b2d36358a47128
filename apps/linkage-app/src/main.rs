//! Planar linkage arm CLI.
//!
//! Three commands:
//! - `geometries`: list the robot geometry registry
//! - `generate`: sample collision-free poses in an environment file and
//!   write them as a JSON dataset
//! - `simulate`: roll out a control policy toward a target with the
//!   stand-in integrator

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use thiserror::Error;
use tracing::{info, warn};

use linkage_collision::{CollisionMode, check};
use linkage_core::Point2;
use linkage_core::config::LinkageConfig;
use linkage_core::error::{ConfigError, EnvironmentError, GeometryError, KinematicsError};
use linkage_core::geometry::RobotGeometry;
use linkage_core::obstacle::Environment;
use linkage_policy::{PolicyKind, build_policy};
use linkage_sampler::{
    DatasetError, PoseAnalysis, PoseDataset, PoseSampler, SamplerError, analyze,
    default_file_name,
};
use linkage_sim::{ControlLoop, SimError};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Collision-free pose sampling and obstacle-avoidance control for planar
/// multi-link arms.
#[derive(Parser, Debug)]
#[command(name = "linkage", version, about)]
struct Cli {
    /// TOML configuration file. Built-in defaults when absent.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List available robot geometries.
    Geometries,

    /// Sample collision-free poses and save them as JSON.
    Generate(GenerateArgs),

    /// Drive an arm toward a target with a control policy.
    Simulate(SimulateArgs),
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Environment JSON file.
    environment: PathBuf,

    /// Robot geometry id.
    robot_id: u32,

    /// Number of poses to accept.
    #[arg(short, long)]
    num_poses: Option<usize>,

    /// Margin for obstacles without their own.
    #[arg(long)]
    safety_margin: Option<f64>,

    /// Candidate budget.
    #[arg(long)]
    max_attempts: Option<usize>,

    #[arg(short, long)]
    seed: Option<u64>,

    /// Parallel sampling workers.
    #[arg(short, long)]
    workers: Option<usize>,

    /// Output file. Defaults to `<environment>_geo_<id>_poses.json`.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print joint and end-effector distribution of the result.
    #[arg(long)]
    analyze: bool,
}

#[derive(Args, Debug)]
struct SimulateArgs {
    /// Robot geometry id.
    robot_id: u32,

    /// Target position.
    #[arg(long, num_args = 2, value_names = ["X", "Y"], allow_negative_numbers = true, required = true)]
    target: Vec<f64>,

    /// potential_field, potential_field_pd or rmp.
    #[arg(short, long, default_value_t = PolicyKind::default())]
    policy: PolicyKind,

    /// Environment JSON file. Free space when absent.
    #[arg(short, long)]
    environment: Option<PathBuf>,

    /// Step budget.
    #[arg(long)]
    steps: Option<usize>,

    /// Starting joint angles. Defaults to 0.3 rad at every joint.
    #[arg(long, num_args = 1.., allow_negative_numbers = true)]
    start: Option<Vec<f64>>,

    /// Stop the rollout when the arm touches an obstacle.
    #[arg(long)]
    precheck: bool,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Environment(#[from] EnvironmentError),

    #[error(transparent)]
    Kinematics(#[from] KinematicsError),

    #[error(transparent)]
    Sampler(#[from] SamplerError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Sim(#[from] SimError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn load_config(path: Option<&Path>) -> Result<LinkageConfig, AppError> {
    match path {
        Some(path) => {
            info!(path = %path.display(), "loading configuration");
            Ok(LinkageConfig::from_file(path)?)
        }
        None => Ok(LinkageConfig::default()),
    }
}

fn load_environment(path: &Path, fallback_margin: f64) -> Result<Environment, AppError> {
    let (env, report) = Environment::from_file_with_margin(path, fallback_margin)?;
    if !report.is_clean() {
        warn!(
            environment = env.name(),
            skipped = report.skipped.len(),
            "some obstacle records were malformed"
        );
    }
    info!(
        environment = env.name(),
        obstacles = report.accepted,
        bounded = env.bounds().is_some(),
        "environment loaded"
    );
    Ok(env)
}

fn describe(geometry: &RobotGeometry) -> String {
    let shape = geometry
        .uniform_shape()
        .map_or_else(|| "mixed".to_owned(), |s| s.to_string());
    format!(
        "{:>3}  {:<22} links={} lengths={:?} widths={:?} shape={} reach={:.2}",
        geometry.id(),
        geometry.name(),
        geometry.link_count(),
        geometry.lengths(),
        geometry.widths(),
        shape,
        geometry.max_reach(),
    )
}

fn run_geometries(config: &LinkageConfig) -> Result<(), AppError> {
    let registry = config.registry()?;
    for geometry in registry.iter() {
        println!("{}", describe(geometry));
        if !geometry.description().is_empty() {
            println!("     {}", geometry.description());
        }
    }
    Ok(())
}

fn print_analysis(analysis: &PoseAnalysis) {
    println!("distribution of {} poses:", analysis.count);
    for (i, joint) in analysis.joints.iter().enumerate() {
        println!(
            "  joint {}: mean={:.1}° std={:.1}° range=[{:.1}°, {:.1}°]",
            i + 1,
            joint.mean.to_degrees(),
            joint.std.to_degrees(),
            joint.min.to_degrees(),
            joint.max.to_degrees(),
        );
    }
    for (axis, summary) in [("x", analysis.end_effector_x), ("y", analysis.end_effector_y)] {
        if let Some(s) = summary {
            println!(
                "  end-effector {axis}: mean={:.2} std={:.2} range=[{:.2}, {:.2}]",
                s.mean, s.std, s.min, s.max
            );
        }
    }
}

fn run_generate(args: GenerateArgs, config: &LinkageConfig) -> Result<(), AppError> {
    let registry = config.registry()?;
    let geometry = registry.get(args.robot_id)?;

    let mut env = load_environment(&args.environment, config.collision.default_margin)?;
    if let Some(margin) = args.safety_margin {
        env = env
            .with_default_margin(margin)
            .map_err(|err| AppError::InvalidArgument(format!("--safety-margin: {err}")))?;
    }

    let sampler_config = &config.sampler;
    let count = args.num_poses.unwrap_or(sampler_config.num_poses);
    let max_attempts = args.max_attempts.unwrap_or(sampler_config.max_attempts);
    let seed = args.seed.unwrap_or(sampler_config.seed);
    let workers = args.workers.unwrap_or(sampler_config.workers);

    let sampler = PoseSampler::from_config(geometry, &env, sampler_config)?;
    let set = sampler.generate_parallel(count, max_attempts, seed, workers)?;

    println!(
        "generated {}/{} collision-free poses in {:.2}s ({:.1} poses/s)",
        set.len(),
        set.requested,
        set.elapsed.as_secs_f64(),
        set.poses_per_second(),
    );
    println!(
        "attempts={} success_rate={:.1}% collision_rate={:.1}% (collision={}, out_of_bounds={}, self_collision={})",
        set.stats.attempts,
        set.stats.success_rate() * 100.0,
        set.stats.collision_rate() * 100.0,
        set.stats.rejections.collision,
        set.stats.rejections.out_of_bounds,
        set.stats.rejections.self_collision,
    );

    let dataset = PoseDataset::from_set(geometry.id(), &set, env.name(), env.default_margin());
    let output = args.output.unwrap_or_else(|| {
        PathBuf::from(default_file_name(
            &args.environment.to_string_lossy(),
            geometry.id(),
        ))
    });
    dataset.save(&output)?;
    println!("saved {} poses to {}", dataset.num_poses, output.display());

    if args.analyze {
        print_analysis(&analyze(geometry, &set.poses)?);
    }
    Ok(())
}

fn run_simulate(args: SimulateArgs, config: &LinkageConfig) -> Result<(), AppError> {
    let registry = config.registry()?;
    let geometry = registry.get(args.robot_id)?;
    let env = match &args.environment {
        Some(path) => load_environment(path, config.collision.default_margin)?,
        None => Environment::empty("free_space"),
    };

    let &[x, y] = args.target.as_slice() else {
        return Err(AppError::InvalidArgument(
            "--target takes exactly two values".to_owned(),
        ));
    };
    let target = Point2::new(x, y);
    let start = args
        .start
        .unwrap_or_else(|| vec![0.3; geometry.link_count()]);

    let start_contacts = check(geometry, &start, &env, CollisionMode::Exhaustive)?;
    if start_contacts.in_collision {
        warn!(
            contacts = start_contacts.contacts.len(),
            "start configuration is in collision"
        );
    }

    let mut sim = config.simulation.clone();
    if let Some(steps) = args.steps {
        sim.max_steps = steps;
    }
    sim.collision_precheck |= args.precheck;

    let policy = build_policy(args.policy, config);
    let rollout = ControlLoop::new(geometry, &env, policy.as_ref(), &sim)?.run(&start, target)?;

    let final_ee = linkage_kinematics::end_effector(geometry, &rollout.q)?;
    println!(
        "{} on geometry {}: {:?} after {} steps",
        policy.name(),
        geometry.id(),
        rollout.status,
        rollout.steps,
    );
    println!(
        "distance {:.4} -> {:.4}, end-effector ({:.3}, {:.3})",
        rollout.distances[0],
        rollout.final_distance(),
        final_ee.x,
        final_ee.y,
    );
    println!("final joints: {:?}", rollout.q);
    if rollout.target_unreachable {
        println!(
            "target is beyond max reach {:.2}; result is best effort",
            geometry.max_reach()
        );
    }
    if rollout.near_singular_steps > 0 {
        println!("{} near-singular steps were torque-limited", rollout.near_singular_steps);
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), AppError> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Geometries => run_geometries(&config),
        Commands::Generate(args) => run_generate(args, &config),
        Commands::Simulate(args) => run_simulate(args, &config),
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
