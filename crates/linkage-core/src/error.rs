use thiserror::Error;

/// Top-level error type for linkage crates.
#[derive(Debug, Error)]
pub enum LinkageError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Kinematics error: {0}")]
    Kinematics(#[from] KinematicsError),

    #[error("Environment error: {0}")]
    Environment(#[from] EnvironmentError),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Geometry table error: {0}")]
    Geometry(#[from] GeometryError),
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_owned(),
            message: message.into(),
        }
    }
}

/// Robot geometry registry errors.
///
/// `InvalidGeometryId` is fatal at startup: callers resolve geometry ids
/// before any simulation or sampling run begins.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("Invalid geometry id: {id}. Available ids: {available:?}")]
    InvalidGeometryId { id: u32, available: Vec<u32> },

    #[error("Duplicate geometry id: {0}")]
    DuplicateId(u32),

    #[error("Geometry {id} has no links")]
    EmptyChain { id: u32 },

    #[error("Geometry {id}: {lengths} link lengths but {other} {what}")]
    CountMismatch {
        id: u32,
        lengths: usize,
        other: usize,
        what: &'static str,
    },

    #[error("Geometry {id}: link {link} length must be positive and finite, got {value}")]
    NonPositiveLength { id: u32, link: usize, value: f64 },

    #[error("Geometry {id}: link {link} width must be positive and finite, got {value}")]
    NonPositiveWidth { id: u32, link: usize, value: f64 },
}

/// Kinematics errors.
///
/// Copy + static messages for cheap propagation in hot paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum KinematicsError {
    #[error("Joint dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Link index {index} out of range for a {links}-link chain")]
    LinkOutOfRange { index: usize, links: usize },
}

/// Shape validation failures of a single obstacle.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ShapeError {
    #[error("non-finite coordinate ({x}, {y})")]
    NonFinitePoint { x: f64, y: f64 },

    #[error("circle radius must be finite and >= 0, got {0}")]
    InvalidRadius(f64),

    #[error("polygon needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),

    #[error("point cluster is empty")]
    EmptyCluster,

    #[error("margin must be finite and >= 0, got {0}")]
    InvalidMargin(f64),
}

/// A single obstacle record that failed shape validation.
///
/// Raised at the load boundary only; the record is skipped and the run
/// continues with the remaining obstacles.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ObstacleError {
    #[error("Malformed obstacle #{index}: {reason}")]
    Malformed {
        index: usize,
        #[source]
        reason: ShapeError,
    },
}

/// Environment loading errors.
#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error("IO error reading environment {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON parse error in environment {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid workspace bounds: {0}")]
    InvalidBounds(String),

    #[error("Invalid default margin: {0}")]
    InvalidMargin(#[from] ShapeError),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linkage_error_from_geometry_error() {
        let err = GeometryError::InvalidGeometryId {
            id: 9,
            available: vec![0, 1],
        };
        let top: LinkageError = err.into();
        assert!(matches!(top, LinkageError::Geometry(_)));
        assert!(top.to_string().contains("9"));
    }

    #[test]
    fn linkage_error_from_kinematics_error() {
        let err = KinematicsError::DimensionMismatch {
            expected: 3,
            got: 2,
        };
        let top: LinkageError = err.into();
        assert!(matches!(top, LinkageError::Kinematics(_)));
    }

    #[test]
    fn config_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let config_err: ConfigError = io_err.into();
        assert!(matches!(config_err, ConfigError::Io(_)));
    }

    #[test]
    fn kinematics_error_is_copy() {
        let err = KinematicsError::DimensionMismatch {
            expected: 3,
            got: 4,
        };
        let err2 = err;
        assert_eq!(err, err2);
    }

    #[test]
    fn display_messages() {
        assert_eq!(
            KinematicsError::DimensionMismatch {
                expected: 3,
                got: 2
            }
            .to_string(),
            "Joint dimension mismatch: expected 3, got 2"
        );
        assert_eq!(
            GeometryError::InvalidGeometryId {
                id: 7,
                available: vec![0, 1, 2]
            }
            .to_string(),
            "Invalid geometry id: 7. Available ids: [0, 1, 2]"
        );
        assert_eq!(
            ObstacleError::Malformed {
                index: 4,
                reason: ShapeError::TooFewVertices(2)
            }
            .to_string(),
            "Malformed obstacle #4: polygon needs at least 3 vertices, got 2"
        );
        assert_eq!(
            ConfigError::invalid("sampler.workers", "must be >= 1").to_string(),
            "Invalid value for sampler.workers: must be >= 1"
        );
    }
}
