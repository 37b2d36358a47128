//! Integration test: closed-loop reaching in free space.
//!
//! 1. PD control toward (5, 5) shrinks the distance at every step until it
//!    is within tolerance
//! 2. Every policy makes clear progress toward a reachable target
//! 3. Unreachable targets are flagged while the arm still moves toward them

use linkage_core::Point2;
use linkage_core::config::{LinkageConfig, PotentialFieldPdConfig, SimulationConfig};
use linkage_policy::{PolicyKind, PotentialFieldPdPolicy, build_policy};
use linkage_sim::{ControlLoop, RolloutStatus};
use linkage_test_utils::{empty_env, standard_geometry};

const START: [f64; 3] = [0.3, 0.8, 0.6];

#[test]
fn pd_distance_decreases_monotonically_to_target() {
    let geometry = standard_geometry();
    let env = empty_env();
    let policy = PotentialFieldPdPolicy::new(
        PotentialFieldPdConfig {
            pd_gain_p: 10.0,
            pd_gain_d: 0.5,
            ..PotentialFieldPdConfig::default()
        },
        LinkageConfig::default().singularity,
    );
    let sim = SimulationConfig {
        dt: 0.02,
        joint_damping: 100.0,
        max_steps: 20_000,
        tolerance: 1e-2,
        collision_precheck: false,
    };
    let target = Point2::new(5.0, 5.0);
    let rollout = ControlLoop::new(&geometry, &env, &policy, &sim)
        .unwrap()
        .run(&START, target)
        .unwrap();

    assert!(rollout.status.is_converged(), "{:?} at {}", rollout.status, rollout.final_distance());
    assert!(rollout.final_distance() <= 1e-2);
    assert!(rollout.is_monotone(1e-9));
    assert!(!rollout.target_unreachable);
    assert!(rollout.steps > 0);
}

#[test]
fn every_policy_approaches_reachable_target() {
    let geometry = standard_geometry();
    let env = empty_env();
    let config = LinkageConfig::default();
    let target = Point2::new(-2.0, 3.0);
    for kind in PolicyKind::ALL {
        let policy = build_policy(kind, &config);
        let rollout = ControlLoop::new(&geometry, &env, policy.as_ref(), &config.simulation)
            .unwrap()
            .with_max_steps(8000)
            .run(&START, target)
            .unwrap();
        let initial = rollout.distances[0];
        assert!(
            rollout.final_distance() < 0.5 * initial,
            "{kind}: {initial} -> {}",
            rollout.final_distance()
        );
        assert!(rollout.q.iter().all(|a| a.is_finite()));
    }
}

#[test]
fn unreachable_target_flagged() {
    let geometry = standard_geometry();
    let env = empty_env();
    let config = LinkageConfig::default();
    let policy = build_policy(PolicyKind::PotentialFieldPd, &config);
    let target = Point2::new(0.0, 12.0);
    let rollout = ControlLoop::new(&geometry, &env, policy.as_ref(), &config.simulation)
        .unwrap()
        .with_max_steps(500)
        .run(&START, target)
        .unwrap();
    assert!(rollout.target_unreachable);
    assert_eq!(rollout.status, RolloutStatus::Truncated);
    assert!(rollout.final_distance() < rollout.distances[0]);
}
