//! Collision detection between posed planar arms and obstacle sets.
//!
//! Each link is tested in its local frame against every obstacle probe
//! point (circle centers, polygon vertices, cluster members) inflated by
//! the obstacle's radius and safety margin.

pub mod detector;
pub mod shapes;

pub use detector::{
    CollisionMode, CollisionResult, Contact, check, check_many, check_poses,
    filter_collision_free, link_hits_obstacle, self_collision,
};
pub use shapes::{contains_local, link_contains};
