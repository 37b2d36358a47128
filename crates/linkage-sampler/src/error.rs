//! Error types for pose sampling and dataset IO.

use linkage_core::error::KinematicsError;
use thiserror::Error;

/// Errors that stop a sampling run before it starts.
///
/// Running out of attempts is not an error; see
/// [`SampledPoseSet::complete`](crate::SampledPoseSet::complete).
#[derive(Debug, Error)]
pub enum SamplerError {
    #[error("invalid limits for joint {joint}: [{low}, {high}]")]
    InvalidLimit { joint: usize, low: f64, high: f64 },

    #[error("joint limits cover {got} joints but the chain has {expected}")]
    LimitCount { expected: usize, got: usize },

    #[error("worker count must be at least 1")]
    NoWorkers,

    #[error(transparent)]
    Kinematics(#[from] KinematicsError),
}

/// Errors reading or writing a pose dataset file.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("IO error on dataset {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error on dataset {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
