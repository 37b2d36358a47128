//! Immutable robot geometry records and the registry that holds them.
//!
//! A [`GeometryRegistry`] is built once at startup (from the built-in table
//! or from a config file) and then passed by reference to every component
//! that needs it. Nothing mutates it after construction.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::GeometryError;

// ---------------------------------------------------------------------------
// LinkShape
// ---------------------------------------------------------------------------

/// Collision shape of a single link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkShape {
    /// Oriented box of `length x width` centered on the link midpoint.
    #[default]
    Rectangle,
    /// Ellipse with semi-axes `length / 2` and `width / 2`.
    Ellipse,
}

impl std::fmt::Display for LinkShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rectangle => f.write_str("rectangle"),
            Self::Ellipse => f.write_str("ellipse"),
        }
    }
}

// ---------------------------------------------------------------------------
// RobotGeometry
// ---------------------------------------------------------------------------

/// Link lengths, widths and shapes of one planar arm.
///
/// Validated on construction: at least one link, matching counts, strictly
/// positive finite lengths and widths.
#[derive(Debug, Clone, PartialEq)]
pub struct RobotGeometry {
    id: u32,
    name: String,
    description: String,
    lengths: Vec<f64>,
    widths: Vec<f64>,
    shapes: Vec<LinkShape>,
    max_reach: f64,
}

impl RobotGeometry {
    /// Create a geometry where every link shares the same shape.
    pub fn new(
        id: u32,
        name: impl Into<String>,
        shape: LinkShape,
        lengths: Vec<f64>,
        widths: Vec<f64>,
    ) -> Result<Self, GeometryError> {
        let shapes = vec![shape; lengths.len()];
        Self::with_shapes(id, name, shapes, lengths, widths)
    }

    /// Create a geometry with a per-link shape.
    pub fn with_shapes(
        id: u32,
        name: impl Into<String>,
        shapes: Vec<LinkShape>,
        lengths: Vec<f64>,
        widths: Vec<f64>,
    ) -> Result<Self, GeometryError> {
        if lengths.is_empty() {
            return Err(GeometryError::EmptyChain { id });
        }
        if widths.len() != lengths.len() {
            return Err(GeometryError::CountMismatch {
                id,
                lengths: lengths.len(),
                other: widths.len(),
                what: "widths",
            });
        }
        if shapes.len() != lengths.len() {
            return Err(GeometryError::CountMismatch {
                id,
                lengths: lengths.len(),
                other: shapes.len(),
                what: "shapes",
            });
        }
        for (link, &value) in lengths.iter().enumerate() {
            if !(value.is_finite() && value > 0.0) {
                return Err(GeometryError::NonPositiveLength { id, link, value });
            }
        }
        for (link, &value) in widths.iter().enumerate() {
            if !(value.is_finite() && value > 0.0) {
                return Err(GeometryError::NonPositiveWidth { id, link, value });
            }
        }

        let max_reach = lengths.iter().sum();
        Ok(Self {
            id,
            name: name.into(),
            description: String::new(),
            lengths,
            widths,
            shapes,
            max_reach,
        })
    }

    /// Builder: attach a human-readable description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub const fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Number of links (and joints) in the chain.
    pub fn link_count(&self) -> usize {
        self.lengths.len()
    }

    pub fn lengths(&self) -> &[f64] {
        &self.lengths
    }

    pub fn widths(&self) -> &[f64] {
        &self.widths
    }

    pub fn shapes(&self) -> &[LinkShape] {
        &self.shapes
    }

    /// Sum of link lengths.
    pub const fn max_reach(&self) -> f64 {
        self.max_reach
    }

    /// Widest link width, used by the coarse self-collision test.
    pub fn max_width(&self) -> f64 {
        self.widths.iter().copied().fold(0.0, f64::max)
    }

    /// The shape shared by all links, or `None` when shapes are mixed.
    pub fn uniform_shape(&self) -> Option<LinkShape> {
        let first = self.shapes[0];
        self.shapes.iter().all(|&s| s == first).then_some(first)
    }
}

// ---------------------------------------------------------------------------
// GeometryRecord
// ---------------------------------------------------------------------------

/// Serialized form of a geometry as it appears in config files.
///
/// Either `link_shape` (shared) or `link_shapes` (per link) may be given;
/// when both are missing every link is a rectangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryRecord {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub link_shape: Option<LinkShape>,
    #[serde(default)]
    pub link_shapes: Option<Vec<LinkShape>>,
    pub link_lengths: Vec<f64>,
    pub link_widths: Vec<f64>,
}

impl GeometryRecord {
    /// Validate the record into a [`RobotGeometry`].
    pub fn into_geometry(self) -> Result<RobotGeometry, GeometryError> {
        let shapes = match (self.link_shapes, self.link_shape) {
            (Some(shapes), _) => shapes,
            (None, shape) => vec![shape.unwrap_or_default(); self.link_lengths.len()],
        };
        Ok(RobotGeometry::with_shapes(
            self.id,
            self.name,
            shapes,
            self.link_lengths,
            self.link_widths,
        )?
        .with_description(self.description))
    }
}

impl From<&RobotGeometry> for GeometryRecord {
    fn from(geometry: &RobotGeometry) -> Self {
        let (link_shape, link_shapes) = match geometry.uniform_shape() {
            Some(shape) => (Some(shape), None),
            None => (None, Some(geometry.shapes.clone())),
        };
        Self {
            id: geometry.id,
            name: geometry.name.clone(),
            description: geometry.description.clone(),
            link_shape,
            link_shapes,
            link_lengths: geometry.lengths.clone(),
            link_widths: geometry.widths.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// GeometryRegistry
// ---------------------------------------------------------------------------

/// Read-only lookup table from geometry id to [`RobotGeometry`].
#[derive(Debug, Clone, Default)]
pub struct GeometryRegistry {
    geometries: BTreeMap<u32, RobotGeometry>,
}

impl GeometryRegistry {
    /// Build a registry, rejecting duplicate ids.
    pub fn new(geometries: impl IntoIterator<Item = RobotGeometry>) -> Result<Self, GeometryError> {
        let mut map = BTreeMap::new();
        for geometry in geometries {
            let id = geometry.id();
            if map.insert(id, geometry).is_some() {
                return Err(GeometryError::DuplicateId(id));
            }
        }
        Ok(Self { geometries: map })
    }

    /// Validate config records into a registry.
    pub fn from_records(
        records: impl IntoIterator<Item = GeometryRecord>,
    ) -> Result<Self, GeometryError> {
        let geometries = records
            .into_iter()
            .map(GeometryRecord::into_geometry)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(geometries)
    }

    /// The six standard three-link arms.
    pub fn builtin() -> Self {
        let table = builtin_records();
        Self::from_records(table).expect("built-in geometry table is valid")
    }

    /// Look up a geometry by id.
    pub fn get(&self, id: u32) -> Result<&RobotGeometry, GeometryError> {
        self.geometries
            .get(&id)
            .ok_or_else(|| GeometryError::InvalidGeometryId {
                id,
                available: self.ids(),
            })
    }

    /// All registered ids in ascending order.
    pub fn ids(&self) -> Vec<u32> {
        self.geometries.keys().copied().collect()
    }

    /// Iterate geometries in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &RobotGeometry> {
        self.geometries.values()
    }

    pub fn len(&self) -> usize {
        self.geometries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }
}

fn record(
    id: u32,
    name: &str,
    description: &str,
    shape: LinkShape,
    lengths: [f64; 3],
    widths: [f64; 3],
) -> GeometryRecord {
    GeometryRecord {
        id,
        name: name.to_owned(),
        description: description.to_owned(),
        link_shape: Some(shape),
        link_shapes: None,
        link_lengths: lengths.to_vec(),
        link_widths: widths.to_vec(),
    }
}

fn builtin_records() -> Vec<GeometryRecord> {
    use LinkShape::{Ellipse, Rectangle};
    vec![
        record(
            0,
            "Standard Rectangle Robot",
            "standard rectangular-link arm",
            Rectangle,
            [3.0, 2.5, 2.0],
            [0.3, 0.25, 0.2],
        ),
        record(
            1,
            "Compact Rectangle Robot",
            "compact rectangular-link arm",
            Rectangle,
            [2.5, 2.0, 1.5],
            [0.25, 0.2, 0.15],
        ),
        record(
            2,
            "Extended Rectangle Robot",
            "extended rectangular-link arm",
            Rectangle,
            [3.5, 3.0, 2.5],
            [0.35, 0.3, 0.25],
        ),
        record(
            3,
            "Standard Ellipse Robot",
            "standard elliptical-link arm",
            Ellipse,
            [3.0, 2.5, 2.0],
            [0.3, 0.25, 0.2],
        ),
        record(
            4,
            "Slender Ellipse Robot",
            "slender elliptical-link arm",
            Ellipse,
            [3.2, 2.8, 2.3],
            [0.2, 0.18, 0.15],
        ),
        record(
            5,
            "Heavy Duty Robot",
            "heavy duty industrial arm",
            Rectangle,
            [4.0, 3.5, 3.0],
            [0.5, 0.45, 0.4],
        ),
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn builtin_has_six_geometries() {
        let registry = GeometryRegistry::builtin();
        assert_eq!(registry.len(), 6);
        assert_eq!(registry.ids(), vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn standard_geometry_max_reach() {
        let registry = GeometryRegistry::builtin();
        let geometry = registry.get(0).unwrap();
        assert_eq!(geometry.link_count(), 3);
        assert_relative_eq!(geometry.max_reach(), 7.5);
        assert_eq!(geometry.uniform_shape(), Some(LinkShape::Rectangle));
    }

    #[test]
    fn ellipse_geometries_are_ellipses() {
        let registry = GeometryRegistry::builtin();
        assert_eq!(
            registry.get(3).unwrap().uniform_shape(),
            Some(LinkShape::Ellipse)
        );
        assert_eq!(
            registry.get(4).unwrap().uniform_shape(),
            Some(LinkShape::Ellipse)
        );
    }

    #[test]
    fn unknown_id_lists_available() {
        let registry = GeometryRegistry::builtin();
        let err = registry.get(42).unwrap_err();
        assert_eq!(
            err,
            GeometryError::InvalidGeometryId {
                id: 42,
                available: vec![0, 1, 2, 3, 4, 5]
            }
        );
    }

    #[test]
    fn rejects_empty_chain() {
        let err = RobotGeometry::new(1, "empty", LinkShape::Rectangle, vec![], vec![]);
        assert_eq!(err.unwrap_err(), GeometryError::EmptyChain { id: 1 });
    }

    #[test]
    fn rejects_width_count_mismatch() {
        let err = RobotGeometry::new(1, "bad", LinkShape::Rectangle, vec![1.0, 1.0], vec![0.1]);
        assert!(matches!(
            err.unwrap_err(),
            GeometryError::CountMismatch { what: "widths", .. }
        ));
    }

    #[test]
    fn rejects_non_positive_length() {
        let err = RobotGeometry::new(1, "bad", LinkShape::Rectangle, vec![1.0, 0.0], vec![0.1, 0.1]);
        assert!(matches!(
            err.unwrap_err(),
            GeometryError::NonPositiveLength { link: 1, .. }
        ));
    }

    #[test]
    fn rejects_nan_width() {
        let err = RobotGeometry::new(1, "bad", LinkShape::Ellipse, vec![1.0], vec![f64::NAN]);
        assert!(matches!(
            err.unwrap_err(),
            GeometryError::NonPositiveWidth { link: 0, .. }
        ));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let a = RobotGeometry::new(3, "a", LinkShape::Rectangle, vec![1.0], vec![0.1]).unwrap();
        let b = RobotGeometry::new(3, "b", LinkShape::Rectangle, vec![1.0], vec![0.1]).unwrap();
        assert_eq!(
            GeometryRegistry::new([a, b]).unwrap_err(),
            GeometryError::DuplicateId(3)
        );
    }

    #[test]
    fn mixed_shapes_have_no_uniform_shape() {
        let g = RobotGeometry::with_shapes(
            9,
            "mixed",
            vec![LinkShape::Rectangle, LinkShape::Ellipse],
            vec![1.0, 1.0],
            vec![0.1, 0.1],
        )
        .unwrap();
        assert_eq!(g.uniform_shape(), None);
        let record = GeometryRecord::from(&g);
        assert!(record.link_shape.is_none());
        assert_eq!(record.into_geometry().unwrap(), g);
    }

    #[test]
    fn record_defaults_to_rectangle() {
        let record: GeometryRecord = toml::from_str(
            r#"
            id = 7
            name = "two link"
            link_lengths = [1.0, 2.0]
            link_widths = [0.1, 0.2]
            "#,
        )
        .unwrap();
        let g = record.into_geometry().unwrap();
        assert_eq!(g.shapes(), &[LinkShape::Rectangle, LinkShape::Rectangle]);
        assert_relative_eq!(g.max_reach(), 3.0);
    }
}
