//! Obstacle model: closed tagged variants validated at the load boundary.
//!
//! External obstacle reconstruction produces loosely structured records
//! ([`ObstacleRecord`]). They are validated exactly once, when an
//! [`Environment`] is assembled; malformed records are skipped with a
//! warning and reported in a [`LoadReport`]. Downstream code (collision,
//! policies) only ever sees well-formed [`Obstacle`] values.

use std::path::Path;

use nalgebra::{Point2, Unit, Vector2};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{EnvironmentError, ObstacleError, ShapeError};

/// Distances below this are treated as contact when deriving directions.
const DIRECTION_EPSILON: f64 = 1e-9;

/// Margin used when neither the obstacle nor the environment specifies one.
pub const DEFAULT_MARGIN: f64 = 0.05;

// ---------------------------------------------------------------------------
// ObstacleShape
// ---------------------------------------------------------------------------

/// Geometry of a single obstacle.
#[derive(Debug, Clone, PartialEq)]
pub enum ObstacleShape {
    Circle {
        center: Point2<f64>,
        radius: f64,
    },
    Polygon {
        vertices: Vec<Point2<f64>>,
        closed: bool,
    },
    /// Raw boundary/interior samples of a solid obstacle.
    PointCluster {
        points: Vec<Point2<f64>>,
        /// Distance from the centroid to the farthest member point.
        radius: f64,
    },
}

/// Signed distance from a query point to an obstacle's inflated surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceDistance {
    /// Negative when the query point lies inside the inflated obstacle.
    pub distance: f64,
    /// Unit vector pointing away from the obstacle, toward free space.
    pub direction: Unit<Vector2<f64>>,
    /// Closest point on the (uninflated) obstacle boundary.
    pub closest: Point2<f64>,
}

// ---------------------------------------------------------------------------
// Obstacle
// ---------------------------------------------------------------------------

/// A validated obstacle with an optional per-obstacle safety margin.
#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    shape: ObstacleShape,
    margin: Option<f64>,
    center: Point2<f64>,
    bounding_radius: f64,
}

impl Obstacle {
    /// A circle obstacle.
    pub fn circle(center: Point2<f64>, radius: f64) -> Result<Self, ShapeError> {
        check_point(&center)?;
        if !(radius.is_finite() && radius >= 0.0) {
            return Err(ShapeError::InvalidRadius(radius));
        }
        Ok(Self {
            shape: ObstacleShape::Circle { center, radius },
            margin: None,
            center,
            bounding_radius: radius,
        })
    }

    /// A polygon obstacle. Needs at least three vertices.
    pub fn polygon(vertices: Vec<Point2<f64>>, closed: bool) -> Result<Self, ShapeError> {
        if vertices.len() < 3 {
            return Err(ShapeError::TooFewVertices(vertices.len()));
        }
        vertices.iter().try_for_each(check_point)?;
        let (center, bounding_radius) = bounding_circle(&vertices);
        Ok(Self {
            shape: ObstacleShape::Polygon { vertices, closed },
            margin: None,
            center,
            bounding_radius,
        })
    }

    /// A raw point cluster. Needs at least one point.
    pub fn point_cluster(points: Vec<Point2<f64>>) -> Result<Self, ShapeError> {
        if points.is_empty() {
            return Err(ShapeError::EmptyCluster);
        }
        points.iter().try_for_each(check_point)?;
        let (center, radius) = bounding_circle(&points);
        Ok(Self {
            shape: ObstacleShape::PointCluster { points, radius },
            margin: None,
            center,
            bounding_radius: radius,
        })
    }

    /// Builder: set a per-obstacle margin, overriding the environment default.
    pub fn with_margin(mut self, margin: f64) -> Result<Self, ShapeError> {
        self.margin = Some(check_margin(margin)?);
        Ok(self)
    }

    pub const fn shape(&self) -> &ObstacleShape {
        &self.shape
    }

    /// The per-obstacle margin, if one was set.
    pub const fn margin(&self) -> Option<f64> {
        self.margin
    }

    /// Center of the bounding circle (circle center or point centroid).
    pub const fn center(&self) -> Point2<f64> {
        self.center
    }

    /// Radius of a circle around [`center`](Self::center) enclosing the
    /// whole obstacle, excluding margin.
    pub const fn bounding_radius(&self) -> f64 {
        self.bounding_radius
    }

    /// Short kind label used in logs and reports.
    pub const fn kind(&self) -> &'static str {
        match self.shape {
            ObstacleShape::Circle { .. } => "circle",
            ObstacleShape::Polygon { .. } => "polygon",
            ObstacleShape::PointCluster { .. } => "point_cluster",
        }
    }

    /// Signed distance from `p` to the obstacle surface inflated by `margin`.
    pub fn surface_distance(&self, p: &Point2<f64>, margin: f64) -> SurfaceDistance {
        match &self.shape {
            ObstacleShape::Circle { center, radius } => {
                let offset = p - center;
                let norm = offset.norm();
                let direction = unit_or_x(offset);
                SurfaceDistance {
                    distance: norm - radius - margin,
                    direction,
                    closest: center + direction.into_inner() * *radius,
                }
            }
            ObstacleShape::Polygon { vertices, closed } => {
                let closest = closest_on_polyline(vertices, *closed, p);
                let offset = p - closest;
                let gap = offset.norm();
                let inside = *closed && contains_point(vertices, p);
                if inside {
                    // Push out through the nearest edge.
                    let direction = if gap > DIRECTION_EPSILON {
                        Unit::new_normalize(-offset)
                    } else {
                        unit_or_x(p - self.center)
                    };
                    SurfaceDistance {
                        distance: -gap - margin,
                        direction,
                        closest,
                    }
                } else {
                    SurfaceDistance {
                        distance: gap - margin,
                        direction: unit_or_x(offset),
                        closest,
                    }
                }
            }
            ObstacleShape::PointCluster { points, .. } => {
                let closest = points
                    .iter()
                    .copied()
                    .min_by(|a, b| {
                        (p - a)
                            .norm_squared()
                            .total_cmp(&(p - b).norm_squared())
                    })
                    .unwrap_or(self.center);
                let offset = p - closest;
                let direction = if offset.norm() > DIRECTION_EPSILON {
                    Unit::new_normalize(offset)
                } else {
                    unit_or_x(p - self.center)
                };
                SurfaceDistance {
                    distance: offset.norm() - margin,
                    direction,
                    closest,
                }
            }
        }
    }

    /// Points tested against link shapes, each with its inflation radius
    /// (excluding the margin). Circles contribute their center inflated by
    /// the radius; polygons their vertices; clusters every member point.
    pub fn probe_points(&self) -> Box<dyn Iterator<Item = (Point2<f64>, f64)> + '_> {
        match &self.shape {
            ObstacleShape::Circle { center, radius } => {
                Box::new(std::iter::once((*center, *radius)))
            }
            ObstacleShape::Polygon { vertices, .. } => {
                Box::new(vertices.iter().map(|v| (*v, 0.0)))
            }
            ObstacleShape::PointCluster { points, .. } => {
                Box::new(points.iter().map(|v| (*v, 0.0)))
            }
        }
    }
}

fn check_point(p: &Point2<f64>) -> Result<(), ShapeError> {
    if p.x.is_finite() && p.y.is_finite() {
        Ok(())
    } else {
        Err(ShapeError::NonFinitePoint { x: p.x, y: p.y })
    }
}

fn check_margin(margin: f64) -> Result<f64, ShapeError> {
    if margin.is_finite() && margin >= 0.0 {
        Ok(margin)
    } else {
        Err(ShapeError::InvalidMargin(margin))
    }
}

fn unit_or_x(v: Vector2<f64>) -> Unit<Vector2<f64>> {
    if v.norm() > DIRECTION_EPSILON {
        Unit::new_normalize(v)
    } else {
        Vector2::x_axis()
    }
}

/// Centroid and max distance from it.
#[allow(clippy::cast_precision_loss)]
fn bounding_circle(points: &[Point2<f64>]) -> (Point2<f64>, f64) {
    let sum = points
        .iter()
        .fold(Vector2::zeros(), |acc, p| acc + p.coords);
    let center = Point2::from(sum / points.len() as f64);
    let radius = points
        .iter()
        .map(|p| (p - center).norm())
        .fold(0.0, f64::max);
    (center, radius)
}

/// Closest point to `p` on segment `[a, b]`.
pub fn closest_on_segment(a: &Point2<f64>, b: &Point2<f64>, p: &Point2<f64>) -> Point2<f64> {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq <= f64::EPSILON {
        return *a;
    }
    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

fn closest_on_polyline(vertices: &[Point2<f64>], closed: bool, p: &Point2<f64>) -> Point2<f64> {
    let n = vertices.len();
    let edges = if closed { n } else { n - 1 };
    (0..edges)
        .map(|i| closest_on_segment(&vertices[i], &vertices[(i + 1) % n], p))
        .min_by(|a, b| (p - a).norm_squared().total_cmp(&(p - b).norm_squared()))
        .unwrap_or(vertices[0])
}

/// Even-odd crossing test.
fn contains_point(vertices: &[Point2<f64>], p: &Point2<f64>) -> bool {
    let n = vertices.len();
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (vi, vj) = (vertices[i], vertices[j]);
        if (vi.y > p.y) != (vj.y > p.y) {
            let x_cross = (vj.x - vi.x) * (p.y - vi.y) / (vj.y - vi.y) + vi.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

// ---------------------------------------------------------------------------
// WorkspaceBounds
// ---------------------------------------------------------------------------

/// Axis-aligned workspace rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl WorkspaceBounds {
    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Result<Self, EnvironmentError> {
        let bounds = Self {
            min_x,
            max_x,
            min_y,
            max_y,
        };
        bounds.validate()?;
        Ok(bounds)
    }

    /// Tight bounds around a set of points.
    pub fn from_points(points: &[Point2<f64>]) -> Option<Self> {
        let first = points.first()?;
        let init = Self {
            min_x: first.x,
            max_x: first.x,
            min_y: first.y,
            max_y: first.y,
        };
        Some(points.iter().fold(init, |b, p| Self {
            min_x: b.min_x.min(p.x),
            max_x: b.max_x.max(p.x),
            min_y: b.min_y.min(p.y),
            max_y: b.max_y.max(p.y),
        }))
    }

    fn validate(&self) -> Result<(), EnvironmentError> {
        let all_finite = [self.min_x, self.max_x, self.min_y, self.max_y]
            .iter()
            .all(|v| v.is_finite());
        if !all_finite || self.min_x > self.max_x || self.min_y > self.max_y {
            return Err(EnvironmentError::InvalidBounds(format!(
                "x=[{}, {}], y=[{}, {}]",
                self.min_x, self.max_x, self.min_y, self.max_y
            )));
        }
        Ok(())
    }

    pub fn contains(&self, p: &Point2<f64>) -> bool {
        (self.min_x..=self.max_x).contains(&p.x) && (self.min_y..=self.max_y).contains(&p.y)
    }
}

// ---------------------------------------------------------------------------
// ObstacleRecord
// ---------------------------------------------------------------------------

/// Obstacle record as produced by external reconstruction.
///
/// Unknown fields (clustering parameters and other provenance metadata) are
/// ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObstacleRecord {
    Circle {
        center: [f64; 2],
        radius: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        margin: Option<f64>,
    },
    Polygon {
        vertices: Vec<[f64; 2]>,
        #[serde(default = "default_closed")]
        closed: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        margin: Option<f64>,
    },
    PointCluster {
        points: Vec<[f64; 2]>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        margin: Option<f64>,
    },
}

const fn default_closed() -> bool {
    true
}

fn to_point(xy: &[f64; 2]) -> Point2<f64> {
    Point2::new(xy[0], xy[1])
}

impl ObstacleRecord {
    /// Validate into an [`Obstacle`]. `index` is used only for error reporting.
    pub fn validate(&self, index: usize) -> Result<Obstacle, ObstacleError> {
        let (obstacle, margin) = match self {
            Self::Circle {
                center,
                radius,
                margin,
            } => (Obstacle::circle(to_point(center), *radius), margin),
            Self::Polygon {
                vertices,
                closed,
                margin,
            } => (
                Obstacle::polygon(vertices.iter().map(to_point).collect(), *closed),
                margin,
            ),
            Self::PointCluster { points, margin } => (
                Obstacle::point_cluster(points.iter().map(to_point).collect()),
                margin,
            ),
        };
        let obstacle = match margin {
            Some(m) => obstacle.and_then(|o| o.with_margin(*m)),
            None => obstacle,
        };
        obstacle.map_err(|reason| ObstacleError::Malformed { index, reason })
    }
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// Outcome of assembling an environment from raw records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    /// Records accepted into the environment.
    pub accepted: usize,
    /// Records skipped because they failed validation.
    pub skipped: Vec<ObstacleError>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// A set of obstacles plus optional workspace bounds.
///
/// Read-only during a collision query or control tick; replace the whole
/// environment between ticks to change it.
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    name: String,
    obstacles: Vec<Obstacle>,
    bounds: Option<WorkspaceBounds>,
    default_margin: f64,
}

impl Environment {
    /// An environment from already-validated obstacles.
    pub fn new(name: impl Into<String>, obstacles: Vec<Obstacle>) -> Self {
        Self {
            name: name.into(),
            obstacles,
            bounds: None,
            default_margin: DEFAULT_MARGIN,
        }
    }

    /// An environment with no obstacles.
    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    /// Validate raw records, skipping (and logging) malformed ones.
    pub fn from_records(
        name: impl Into<String>,
        records: &[ObstacleRecord],
    ) -> (Self, LoadReport) {
        let name = name.into();
        let mut report = LoadReport::default();
        let mut obstacles = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            match record.validate(index) {
                Ok(obstacle) => obstacles.push(obstacle),
                Err(err) => {
                    warn!(environment = %name, "skipping obstacle: {err}");
                    report.skipped.push(err);
                }
            }
        }
        report.accepted = obstacles.len();
        (Self::new(name, obstacles), report)
    }

    /// A single point-cluster environment with bounds taken from the point
    /// extents. Returns an empty, unbounded environment for no points.
    pub fn from_points(name: impl Into<String>, points: Vec<Point2<f64>>) -> Self {
        let bounds = WorkspaceBounds::from_points(&points);
        let obstacles = Obstacle::point_cluster(points).into_iter().collect();
        Self {
            bounds,
            ..Self::new(name, obstacles)
        }
    }

    /// Load an [`EnvironmentFile`] from JSON.
    pub fn from_file(path: impl AsRef<Path>) -> Result<(Self, LoadReport), EnvironmentError> {
        Self::from_file_with_margin(path, DEFAULT_MARGIN)
    }

    /// Like [`from_file`](Self::from_file); `fallback_margin` applies when
    /// the file sets no `default_margin` of its own.
    pub fn from_file_with_margin(
        path: impl AsRef<Path>,
        fallback_margin: f64,
    ) -> Result<(Self, LoadReport), EnvironmentError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| EnvironmentError::Io {
            path: display.clone(),
            source,
        })?;
        let file: EnvironmentFile =
            serde_json::from_str(&content).map_err(|source| EnvironmentError::Json {
                path: display.clone(),
                source,
            })?;
        let name = file.name.clone().unwrap_or_else(|| {
            path.file_stem()
                .map_or(display, |s| s.to_string_lossy().into_owned())
        });
        file.into_environment(name, fallback_margin)
    }

    /// Builder: set workspace bounds.
    #[must_use]
    pub const fn with_bounds(mut self, bounds: WorkspaceBounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// Builder: set the margin applied to obstacles without their own.
    pub fn with_default_margin(mut self, margin: f64) -> Result<Self, ShapeError> {
        self.default_margin = check_margin(margin)?;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub const fn bounds(&self) -> Option<&WorkspaceBounds> {
        self.bounds.as_ref()
    }

    pub const fn default_margin(&self) -> f64 {
        self.default_margin
    }

    /// Effective margin of an obstacle in this environment.
    pub fn margin_of(&self, obstacle: &Obstacle) -> f64 {
        obstacle.margin().unwrap_or(self.default_margin)
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }
}

// ---------------------------------------------------------------------------
// EnvironmentFile
// ---------------------------------------------------------------------------

/// On-disk environment description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentFile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub bounds: Option<WorkspaceBounds>,
    #[serde(default)]
    pub default_margin: Option<f64>,
    #[serde(default)]
    pub obstacles: Vec<ObstacleRecord>,
}

impl EnvironmentFile {
    fn into_environment(
        self,
        name: String,
        fallback_margin: f64,
    ) -> Result<(Environment, LoadReport), EnvironmentError> {
        let (mut env, report) = Environment::from_records(name, &self.obstacles);
        if let Some(bounds) = self.bounds {
            bounds.validate()?;
            env = env.with_bounds(bounds);
        }
        let margin = self.default_margin.unwrap_or(fallback_margin);
        Ok((env.with_default_margin(margin)?, report))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
