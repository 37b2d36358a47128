//! Distribution summary of a sampled pose set.

use linkage_core::error::KinematicsError;
use linkage_core::geometry::RobotGeometry;
use linkage_kinematics::end_effector;
use serde::{Deserialize, Serialize};

/// Mean, population standard deviation and extent of one quantity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

impl Summary {
    /// `None` for an empty sequence.
    #[allow(clippy::cast_precision_loss)]
    pub fn of(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let values: Vec<f64> = values.into_iter().collect();
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some(Self {
            mean,
            std: var.sqrt(),
            min,
            max,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseAnalysis {
    pub count: usize,
    /// One summary per joint, in radians.
    pub joints: Vec<Summary>,
    pub end_effector_x: Option<Summary>,
    pub end_effector_y: Option<Summary>,
}

/// Summarise joint angles and end-effector positions of `poses`.
pub fn analyze(geometry: &RobotGeometry, poses: &[Vec<f64>]) -> Result<PoseAnalysis, KinematicsError> {
    let ends = poses
        .iter()
        .map(|q| end_effector(geometry, q))
        .collect::<Result<Vec<_>, _>>()?;
    let joints = (0..geometry.link_count())
        .filter_map(|j| Summary::of(poses.iter().map(|q| q[j])))
        .collect();
    Ok(PoseAnalysis {
        count: poses.len(),
        joints,
        end_effector_x: Summary::of(ends.iter().map(|p| p.x)),
        end_effector_y: Summary::of(ends.iter().map(|p| p.y)),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
