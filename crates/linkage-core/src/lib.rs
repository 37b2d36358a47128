// linkage-core: Geometry registry, obstacle model, config, seeds and errors for planar arm simulation.

pub mod config;
pub mod error;
pub mod geometry;
pub mod obstacle;
pub mod seed;

pub use nalgebra::{Point2, Vector2};

pub mod prelude {
    pub use crate::config::{
        CollisionConfig, LinkageConfig, PotentialFieldConfig, PotentialFieldPdConfig,
        RepulsionConfig, RepulsionPoints, RmpConfig, SamplerConfig, SimulationConfig,
        SingularityConfig,
    };
    pub use crate::error::{
        ConfigError, EnvironmentError, GeometryError, KinematicsError, LinkageError,
        ObstacleError, ShapeError,
    };
    pub use crate::geometry::{GeometryRecord, GeometryRegistry, LinkShape, RobotGeometry};
    pub use crate::obstacle::{
        Environment, LoadReport, Obstacle, ObstacleRecord, ObstacleShape, SurfaceDistance,
        WorkspaceBounds,
    };
    pub use crate::seed::SeedStreams;
    pub use nalgebra::{Point2, Vector2};
}
