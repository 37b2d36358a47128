//! Planar kinematics for linkage arms.
//!
//! Maps a joint configuration of a [`RobotGeometry`](linkage_core::geometry::RobotGeometry)
//! to per-link poses, and provides the analytic Jacobians used to turn
//! Cartesian forces into joint torques.
//!
//! ```text
//! RobotGeometry + q ──► ChainState ──► LinkPose[] ──► collision shapes
//!                                  └──► Jacobian ──► J^T F torques
//! ```

pub mod chain;
pub mod jacobian;
pub mod pose;

pub use chain::{ChainState, end_effector, joint_positions, link_poses};
pub use jacobian::{is_near_singular, jacobian, smallest_singular_value};
pub use pose::{LinkPose, ShapeParams};
