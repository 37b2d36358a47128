//! Rejection sampling of collision-free joint configurations.
//!
//! A run draws candidates from one ChaCha8 stream in a fixed order, so the
//! accepted sequence is a pure function of the inputs. Parallel runs give
//! each worker its own stream derived from the run seed and merge results
//! in worker order.

use std::time::{Duration, Instant};

use linkage_core::config::SamplerConfig;
use linkage_core::error::KinematicsError;
use linkage_core::geometry::RobotGeometry;
use linkage_core::obstacle::Environment;
use linkage_core::seed::SeedStreams;
use rand::Rng;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::SamplerError;
use crate::limits::JointLimits;
use crate::predicates::Predicates;
use crate::stats::SamplingStats;

// ---------------------------------------------------------------------------
// SampledPoseSet
// ---------------------------------------------------------------------------

/// Accepted configurations of one run plus how they were obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledPoseSet {
    /// Accepted joint vectors in acceptance order.
    pub poses: Vec<Vec<f64>>,
    pub stats: SamplingStats,
    /// Number of poses asked for.
    pub requested: usize,
    /// `false` when the attempt budget ran out first.
    pub complete: bool,
    pub seed: u64,
    pub workers: usize,
    pub elapsed: Duration,
}

impl SampledPoseSet {
    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    /// Accepted poses per wall-clock second, 0 for an instantaneous run.
    #[allow(clippy::cast_precision_loss)]
    pub fn poses_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.poses.len() as f64 / secs
        } else {
            0.0
        }
    }
}

// ---------------------------------------------------------------------------
// PoseSampler
// ---------------------------------------------------------------------------

/// Samples configurations of one geometry in one environment.
#[derive(Debug, Clone)]
pub struct PoseSampler<'a> {
    geometry: &'a RobotGeometry,
    env: &'a Environment,
    limits: JointLimits,
    predicates: Predicates,
}

impl<'a> PoseSampler<'a> {
    /// Default joint limits and all predicates enabled.
    pub fn new(geometry: &'a RobotGeometry, env: &'a Environment) -> Self {
        Self {
            geometry,
            env,
            limits: JointLimits::default_for(geometry.link_count()),
            predicates: Predicates::default(),
        }
    }

    /// Limits and predicate switches from the `[sampler]` config section.
    pub fn from_config(
        geometry: &'a RobotGeometry,
        env: &'a Environment,
        config: &SamplerConfig,
    ) -> Result<Self, SamplerError> {
        Ok(Self {
            geometry,
            env,
            limits: JointLimits::from_config(config, geometry.link_count())?,
            predicates: Predicates {
                check_self_collision: config.check_self_collision,
                enforce_workspace_bounds: config.enforce_workspace_bounds,
            },
        })
    }

    pub fn with_limits(mut self, limits: JointLimits) -> Result<Self, SamplerError> {
        limits.expect_joints(self.geometry.link_count())?;
        self.limits = limits;
        Ok(self)
    }

    #[must_use]
    pub const fn with_predicates(mut self, predicates: Predicates) -> Self {
        self.predicates = predicates;
        self
    }

    pub const fn limits(&self) -> &JointLimits {
        &self.limits
    }

    pub const fn predicates(&self) -> Predicates {
        self.predicates
    }

    /// Sample until `count` poses are accepted or `max_attempts` candidates
    /// have been drawn.
    pub fn generate(
        &self,
        count: usize,
        max_attempts: usize,
        seed: u64,
    ) -> Result<SampledPoseSet, SamplerError> {
        let start = Instant::now();
        let mut rng = SeedStreams::new(seed).root_rng();
        let (poses, stats) = self.run_stream(&mut rng, count, max_attempts)?;
        Ok(self.finish(poses, stats, count, seed, 1, start.elapsed()))
    }

    /// Split the run over `workers` rayon tasks.
    ///
    /// Worker `w` gets an even share of `count` and of `max_attempts`
    /// (earlier workers take the remainders) and draws from its own stream
    /// seeded with `derive_seed_indexed(seed, w)`. Accepted poses are
    /// concatenated in worker order, so the result depends only on the
    /// inputs and `workers`. One worker is the same as [`generate`](Self::generate).
    pub fn generate_parallel(
        &self,
        count: usize,
        max_attempts: usize,
        seed: u64,
        workers: usize,
    ) -> Result<SampledPoseSet, SamplerError> {
        match workers {
            0 => return Err(SamplerError::NoWorkers),
            1 => return self.generate(count, max_attempts, seed),
            _ => {}
        }

        let start = Instant::now();
        let streams = SeedStreams::new(seed);
        let chunks: Vec<(Vec<Vec<f64>>, SamplingStats)> = (0..workers)
            .into_par_iter()
            .map(|worker| {
                let mut rng = streams.worker_rng(worker);
                self.run_stream(
                    &mut rng,
                    share(count, workers, worker),
                    share(max_attempts, workers, worker),
                )
            })
            .collect::<Result<Vec<_>, KinematicsError>>()?;

        let mut poses = Vec::with_capacity(count);
        let mut stats = SamplingStats::new();
        for (worker, (chunk, chunk_stats)) in chunks.into_iter().enumerate() {
            debug!(
                worker,
                accepted = chunk_stats.accepted,
                attempts = chunk_stats.attempts,
                "worker finished"
            );
            poses.extend(chunk);
            stats.merge(&chunk_stats);
        }
        Ok(self.finish(poses, stats, count, seed, workers, start.elapsed()))
    }

    fn run_stream<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        count: usize,
        max_attempts: usize,
    ) -> Result<(Vec<Vec<f64>>, SamplingStats), KinematicsError> {
        let mut poses = Vec::with_capacity(count);
        let mut stats = SamplingStats::new();
        let batch = (max_attempts / 10).max(1);

        while poses.len() < count && stats.attempts < max_attempts {
            let q = self.limits.sample(rng);
            match self.predicates.evaluate(self.geometry, self.env, &q)? {
                None => {
                    stats.record_accept();
                    poses.push(q);
                }
                Some(reason) => stats.record_reject(reason),
            }
            if stats.attempts % batch == 0 {
                debug!(
                    accepted = poses.len(),
                    requested = count,
                    attempts = stats.attempts,
                    collisions = stats.rejections.collision,
                    "sampling progress"
                );
            }
        }
        Ok((poses, stats))
    }

    fn finish(
        &self,
        poses: Vec<Vec<f64>>,
        stats: SamplingStats,
        requested: usize,
        seed: u64,
        workers: usize,
        elapsed: Duration,
    ) -> SampledPoseSet {
        let complete = poses.len() >= requested;
        if !complete {
            warn!(
                geometry = self.geometry.id(),
                environment = self.env.name(),
                requested,
                accepted = poses.len(),
                attempts = stats.attempts,
                "attempt budget exhausted before reaching the requested pose count"
            );
        }
        let set = SampledPoseSet {
            poses,
            stats,
            requested,
            complete,
            seed,
            workers,
            elapsed,
        };
        info!(
            geometry = self.geometry.id(),
            environment = self.env.name(),
            accepted = set.len(),
            requested,
            attempts = set.stats.attempts,
            success_rate = set.stats.success_rate(),
            poses_per_second = set.poses_per_second(),
            "sampling finished"
        );
        set
    }
}

/// Worker `worker`'s share of `total` split `workers` ways.
fn share(total: usize, workers: usize, worker: usize) -> usize {
    total / workers + usize::from(worker < total % workers)
}

/// Sample `count` collision-free poses with default limits and predicates.
pub fn generate(
    geometry: &RobotGeometry,
    env: &Environment,
    count: usize,
    max_attempts: usize,
    seed: u64,
) -> Result<SampledPoseSet, SamplerError> {
    PoseSampler::new(geometry, env).generate(count, max_attempts, seed)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
