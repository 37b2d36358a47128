//! Integration test: every policy honours the common contract.
//!
//! 1. Commands are finite and sized to the chain for arbitrary states
//! 2. Near-singular commands respect the torque limit
//! 3. Policies are pure: the same input gives the same command

use linkage_core::config::LinkageConfig;
use linkage_core::obstacle::{Environment, Obstacle};
use linkage_core::Point2;
use linkage_policy::{ControlInput, PolicyKind, build_policy};
use linkage_test_utils::{random_configurations, standard_geometry};

fn cluttered() -> Environment {
    let obstacles = vec![
        Obstacle::circle(Point2::new(4.0, 3.0), 0.3).unwrap(),
        Obstacle::polygon(
            vec![
                Point2::new(-2.0, 2.0),
                Point2::new(-1.0, 2.0),
                Point2::new(-1.5, 3.0),
            ],
            true,
        )
        .unwrap(),
        Obstacle::point_cluster(vec![Point2::new(2.0, -2.0), Point2::new(2.2, -2.1)]).unwrap(),
    ];
    Environment::new("cluttered", obstacles)
}

#[test]
fn commands_are_finite() {
    let geometry = standard_geometry();
    let env = cluttered();
    let config = LinkageConfig::default();
    let velocities = random_configurations(31, 3, 50);
    for kind in PolicyKind::ALL {
        let policy = build_policy(kind, &config);
        for (q, qdot) in random_configurations(30, 3, 50).iter().zip(&velocities) {
            let input = ControlInput::new(&geometry, q, qdot, Point2::new(5.0, 5.0), &env).unwrap();
            let cmd = policy.compute_command(&input);
            assert_eq!(cmd.torques().len(), 3);
            assert!(
                cmd.torques.iter().all(|t| t.is_finite()),
                "{kind} produced {:?} at {q:?}",
                cmd.torques
            );
        }
    }
}

#[test]
fn singular_commands_are_clamped() {
    let geometry = standard_geometry();
    let env = cluttered();
    let config = LinkageConfig::default();
    let limit = config.singularity.torque_limit;
    for kind in PolicyKind::ALL {
        let policy = build_policy(kind, &config);
        for base in [0.0, 1.0, -2.0] {
            let q = [base, 0.0, 0.0];
            let input = ControlInput::new(&geometry, &q, &[0.0; 3], Point2::new(-5.0, 1.0), &env).unwrap();
            let cmd = policy.compute_command(&input);
            assert!(cmd.near_singular, "{kind} at {q:?}");
            assert!(cmd.torques.norm() <= limit + 1e-9);
        }
    }
}

#[test]
fn unreachable_target_gives_best_effort() {
    let geometry = standard_geometry();
    let env = Environment::empty("open");
    let config = LinkageConfig::default();
    for kind in PolicyKind::ALL {
        let policy = build_policy(kind, &config);
        let q = [0.4, 0.5, 0.6];
        let input = ControlInput::new(&geometry, &q, &[0.0; 3], Point2::new(0.0, 12.0), &env).unwrap();
        let cmd = policy.compute_command(&input);
        assert!(cmd.target_unreachable);
        assert!(cmd.torques.norm() > 0.0);
    }
}

#[test]
fn policies_are_pure() {
    let geometry = standard_geometry();
    let env = cluttered();
    let config = LinkageConfig::default();
    let q = [0.2, 0.9, -0.4];
    let qdot = [0.1, -0.2, 0.05];
    for kind in PolicyKind::ALL {
        let policy = build_policy(kind, &config);
        let input = ControlInput::new(&geometry, &q, &qdot, Point2::new(3.0, 4.0), &env).unwrap();
        assert_eq!(policy.compute_command(&input), policy.compute_command(&input));
    }
}
