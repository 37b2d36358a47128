//! JSON pose dataset written by `linkage generate`.
//!
//! ```json
//! {
//!   "robot_id": 0,
//!   "num_poses": 2,
//!   "poses": [[0.1, -0.4, 0.2], [1.3, 0.9, -1.1]],
//!   "format": "joint_angles_radians",
//!   "statistics": { "success_rate": 0.5, ... }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DatasetError;
use crate::sampler::SampledPoseSet;
use crate::stats::RejectionCounts;

/// Value of the `format` field.
pub const POSE_FORMAT: &str = "joint_angles_radians";

/// Run summary stored next to the poses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetStatistics {
    pub environment: String,
    pub target_poses: usize,
    pub achieved_poses: usize,
    pub attempts: usize,
    pub rejections: RejectionCounts,
    pub success_rate: f64,
    pub collision_rate: f64,
    /// Seconds.
    pub generation_time: f64,
    pub poses_per_second: f64,
    pub safety_margin: f64,
    pub complete: bool,
    pub seed: u64,
    pub workers: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseDataset {
    pub robot_id: u32,
    pub num_poses: usize,
    pub poses: Vec<Vec<f64>>,
    pub format: String,
    #[serde(default)]
    pub statistics: Option<DatasetStatistics>,
}

impl PoseDataset {
    /// Package a sampling run.
    pub fn from_set(
        robot_id: u32,
        set: &SampledPoseSet,
        environment: &str,
        safety_margin: f64,
    ) -> Self {
        let statistics = DatasetStatistics {
            environment: environment.to_owned(),
            target_poses: set.requested,
            achieved_poses: set.len(),
            attempts: set.stats.attempts,
            rejections: set.stats.rejections,
            success_rate: set.stats.success_rate(),
            collision_rate: set.stats.collision_rate(),
            generation_time: set.elapsed.as_secs_f64(),
            poses_per_second: set.poses_per_second(),
            safety_margin,
            complete: set.complete,
            seed: set.seed,
            workers: set.workers,
        };
        Self {
            robot_id,
            num_poses: set.len(),
            poses: set.poses.clone(),
            format: POSE_FORMAT.to_owned(),
            statistics: Some(statistics),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), DatasetError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|source| DatasetError::Json {
            path: path.display().to_string(),
            source,
        })?;
        std::fs::write(path, json).map_err(|source| DatasetError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| DatasetError::Json {
            path: path.display().to_string(),
            source,
        })
    }
}

/// `<environment>_geo_<id>_poses.json`, using the environment file stem.
pub fn default_file_name(environment: &str, robot_id: u32) -> String {
    let stem = Path::new(environment)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(environment);
    format!("{stem}_geo_{robot_id}_poses.json")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::generate;
    use linkage_test_utils::{scenario_c_env, standard_geometry};

    fn dataset() -> PoseDataset {
        let geometry = standard_geometry();
        let env = scenario_c_env();
        let set = generate(&geometry, &env, 5, 200, 42).unwrap();
        PoseDataset::from_set(0, &set, env.name(), 0.05)
    }

    #[test]
    fn document_layout() {
        let json = serde_json::to_value(dataset()).unwrap();
        assert_eq!(json["robot_id"], 0);
        assert_eq!(json["num_poses"], 5);
        assert_eq!(json["format"], "joint_angles_radians");
        assert_eq!(json["poses"].as_array().unwrap().len(), 5);
        assert_eq!(json["poses"][0].as_array().unwrap().len(), 3);
        assert_eq!(json["statistics"]["target_poses"], 5);
        assert_eq!(json["statistics"]["complete"], true);
    }

    #[test]
    fn save_and_load() {
        let path = std::env::temp_dir().join(format!("linkage-dataset-{}.json", std::process::id()));
        let original = dataset();
        original.save(&path).unwrap();
        let loaded = PoseDataset::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.poses, original.poses);
        assert_eq!(loaded.statistics.unwrap().attempts, original.statistics.unwrap().attempts);
    }

    #[test]
    fn statistics_are_optional() {
        let json = r#"{"robot_id": 2, "num_poses": 1, "poses": [[0.0, 0.0, 0.0]], "format": "joint_angles_radians"}"#;
        let loaded: PoseDataset = serde_json::from_str(json).unwrap();
        assert!(loaded.statistics.is_none());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = PoseDataset::load("/nonexistent/poses.json").unwrap_err();
        assert!(matches!(err, DatasetError::Io { .. }));
    }

    #[test]
    fn file_name_uses_stem() {
        assert_eq!(default_file_name("envs/circles_only.json", 3), "circles_only_geo_3_poses.json");
        assert_eq!(default_file_name("open", 0), "open_geo_0_poses.json");
    }
}
