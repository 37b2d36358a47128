//! Integration test: collision detector boundary behaviour.
//!
//! 1. A point on any link's centerline midpoint always collides
//! 2. A point clear of every inflated link's farthest corner never does
//! 3. Circle at (4, 3) against a link passing through it / 0.5 away
//! 4. Circles in the inflated corner zones agree with direct containment

use linkage_collision::{CollisionMode, Contact, check, link_contains};
use linkage_core::{Point2, Vector2};
use linkage_core::obstacle::{Environment, Obstacle, closest_on_segment};
use linkage_kinematics::ChainState;
use linkage_test_utils::{circle_env, random_configurations, registry, scenario_c_env, seeded_rng, standard_geometry};
use rand::Rng;

const SAMPLES: usize = 100;
const MARGIN: f64 = 0.05;

fn point_env(p: Point2<f64>) -> Environment {
    let obstacle = Obstacle::circle(p, 0.0).unwrap().with_margin(MARGIN).unwrap();
    Environment::new("point", vec![obstacle])
}

#[test]
fn midpoint_always_collides() {
    for geometry in registry().iter() {
        for q in random_configurations(21, geometry.link_count(), SAMPLES) {
            let state = ChainState::new(geometry, &q).unwrap();
            for mid in state.midpoints() {
                let r = check(geometry, &q, &point_env(mid), CollisionMode::ShortCircuit).unwrap();
                assert!(r.in_collision, "midpoint {mid:?} of {q:?} not detected");
            }
        }
    }
}

#[test]
fn distant_points_never_collide() {
    let eps = 1e-6;
    let mut rng = seeded_rng(22);
    for geometry in registry().iter() {
        let reach = geometry.max_reach() + 1.0;
        for q in random_configurations(23, geometry.link_count(), SAMPLES) {
            let state = ChainState::new(geometry, &q).unwrap();
            for _ in 0..20 {
                let p = Point2::new(rng.gen_range(-reach..reach), rng.gen_range(-reach..reach));
                let clear = state.poses().iter().all(|pose| {
                    let closest = closest_on_segment(&pose.proximal, &pose.distal, &p);
                    // farthest reach of the inflated corner from the centerline
                    let extent = (pose.half_width() + MARGIN).hypot(MARGIN);
                    (p - closest).norm() > extent + eps
                });
                if clear {
                    let r = check(geometry, &q, &point_env(p), CollisionMode::ShortCircuit).unwrap();
                    assert!(!r.in_collision, "{p:?} reported against {q:?}");
                }
            }
        }
    }
}

#[test]
fn inflated_corners_agree_with_containment() {
    for geometry in registry().iter() {
        for q in random_configurations(24, geometry.link_count(), SAMPLES) {
            let state = ChainState::new(geometry, &q).unwrap();
            for pose in state.poses() {
                for (radius, margin) in [(0.0, MARGIN), (0.3, 0.1)] {
                    let grown = radius + margin;
                    for (sx, sy) in [(1.0, 1.0), (1.0, -1.0), (-1.0, 1.0), (-1.0, -1.0)] {
                        let local = Vector2::new(
                            sx * (pose.half_length() + 0.95 * grown),
                            sy * (pose.half_width() + 0.95 * grown),
                        );
                        let p = pose.to_world(&local);
                        let env = circle_env([p.x, p.y], radius, margin);
                        let expected = state
                            .poses()
                            .iter()
                            .any(|link| link_contains(link, &p, grown));
                        let r = check(geometry, &q, &env, CollisionMode::ShortCircuit).unwrap();
                        assert_eq!(r.in_collision, expected, "{p:?} against {q:?}");
                    }
                }
            }
        }
    }
}

/// Base aimed at (4, 3) with link 0 and link 1 collinear, rotated by `offset`.
fn aimed_configuration(offset: f64) -> Vec<f64> {
    vec![3.0_f64.atan2(4.0) + offset, 0.0, 0.0]
}

#[test]
fn scenario_c_link_through_obstacle() {
    let q = aimed_configuration(0.0);
    let state = ChainState::new(&standard_geometry(), &q).unwrap();
    let link1 = state.poses()[1];
    let closest = closest_on_segment(&link1.proximal, &link1.distal, &Point2::new(4.0, 3.0));
    assert!((closest - Point2::new(4.0, 3.0)).norm() < 1e-9);

    let r = check(&standard_geometry(), &q, &scenario_c_env(), CollisionMode::Exhaustive).unwrap();
    assert!(r.in_collision);
    assert_eq!(r.contacts, vec![Contact { link: 1, obstacle: 0 }]);
}

#[test]
fn scenario_c_link_passing_half_a_meter_away() {
    let q = aimed_configuration(0.1_f64.asin());
    let state = ChainState::new(&standard_geometry(), &q).unwrap();
    let link1 = state.poses()[1];
    let closest = closest_on_segment(&link1.proximal, &link1.distal, &Point2::new(4.0, 3.0));
    assert!(((closest - Point2::new(4.0, 3.0)).norm() - 0.5).abs() < 1e-9);

    let env = circle_env([4.0, 3.0], 0.01, 0.0);
    let r = check(&standard_geometry(), &q, &env, CollisionMode::Exhaustive).unwrap();
    assert!(!r.in_collision);
}
