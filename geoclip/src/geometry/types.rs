//! Geometry type definitions

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Valid latitude range
pub const MIN_LAT: f64 = -90.0;
pub const MAX_LAT: f64 = 90.0;

/// Ordered feature properties (insertion order is preserved on output).
pub type Properties = IndexMap<String, serde_json::Value>;

/// A WGS84 position, serialized as a GeoJSON `[lon, lat]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "[f64; 2]")]
pub struct Position {
    /// Longitude in degrees (-180 to 180)
    pub lon: f64,
    /// Latitude in degrees (-90 to 90)
    pub lat: f64,
}

impl Position {
    /// Creates a position, validating that both components are finite and in range.
    pub fn new(lon: f64, lat: f64) -> Result<Self, PositionError> {
        if !lon.is_finite() || !(MIN_LON..=MAX_LON).contains(&lon) {
            return Err(PositionError::InvalidLongitude(lon));
        }
        if !lat.is_finite() || !(MIN_LAT..=MAX_LAT).contains(&lat) {
            return Err(PositionError::InvalidLatitude(lat));
        }
        Ok(Self { lon, lat })
    }

    /// Returns true if both components are within `tolerance` degrees of `other`.
    #[inline]
    pub fn approx_eq(&self, other: &Position, tolerance: f64) -> bool {
        (self.lon - other.lon).abs() <= tolerance && (self.lat - other.lat).abs() <= tolerance
    }

    #[inline]
    pub(crate) fn to_geo(self) -> geo::Coord<f64> {
        geo::Coord {
            x: self.lon,
            y: self.lat,
        }
    }

    #[inline]
    pub(crate) fn from_geo(coord: geo::Coord<f64>) -> Self {
        Self {
            lon: coord.x,
            lat: coord.y,
        }
    }
}

impl TryFrom<Vec<f64>> for Position {
    type Error = PositionError;

    fn try_from(components: Vec<f64>) -> Result<Self, Self::Error> {
        match components.as_slice() {
            [lon, lat] => Position::new(*lon, *lat),
            _ => Err(PositionError::WrongArity(components.len())),
        }
    }
}

impl From<Position> for [f64; 2] {
    fn from(pos: Position) -> Self {
        [pos.lon, pos.lat]
    }
}

/// Errors that can occur when building a position.
#[derive(Debug, Clone, PartialEq)]
pub enum PositionError {
    /// Longitude is not finite or outside -180..=180
    InvalidLongitude(f64),
    /// Latitude is not finite or outside -90..=90
    InvalidLatitude(f64),
    /// Position does not have exactly two components
    WrongArity(usize),
}

impl fmt::Display for PositionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionError::InvalidLongitude(lon) => write!(
                f,
                "Invalid longitude: {} (must be between {} and {})",
                lon, MIN_LON, MAX_LON
            ),
            PositionError::InvalidLatitude(lat) => write!(
                f,
                "Invalid latitude: {} (must be between {} and {})",
                lat, MIN_LAT, MAX_LAT
            ),
            PositionError::WrongArity(n) => {
                write!(f, "Position must have exactly 2 components, found {}", n)
            }
        }
    }
}

impl std::error::Error for PositionError {}

/// A closed coordinate sequence (first == last, at least 4 positions).
pub type Ring = Vec<Position>;

/// Geometry variants handled by the pipeline, serialized as GeoJSON geometry objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(Position),
    LineString(Vec<Position>),
    MultiLineString(Vec<Vec<Position>>),
    Polygon(Vec<Ring>),
    MultiPolygon(Vec<Vec<Ring>>),
}

impl Geometry {
    /// GeoJSON type name of this geometry.
    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::LineString(_) => "LineString",
            Geometry::MultiLineString(_) => "MultiLineString",
            Geometry::Polygon(_) => "Polygon",
            Geometry::MultiPolygon(_) => "MultiPolygon",
        }
    }

    /// Iterates over every position of the geometry in storage order.
    pub fn positions(&self) -> Box<dyn Iterator<Item = &Position> + '_> {
        match self {
            Geometry::Point(p) => Box::new(std::iter::once(p)),
            Geometry::LineString(line) => Box::new(line.iter()),
            Geometry::MultiLineString(lines) => Box::new(lines.iter().flatten()),
            Geometry::Polygon(rings) => Box::new(rings.iter().flatten()),
            Geometry::MultiPolygon(polys) => Box::new(polys.iter().flatten().flatten()),
        }
    }

    /// First stored position, if any.
    pub fn first_position(&self) -> Option<Position> {
        self.positions().next().copied()
    }

    /// Whether this is a `Point`.
    pub fn is_point(&self) -> bool {
        matches!(self, Geometry::Point(_))
    }

    /// Whether this is a `LineString` or `MultiLineString`.
    pub fn is_lineal(&self) -> bool {
        matches!(self, Geometry::LineString(_) | Geometry::MultiLineString(_))
    }

    /// Whether this is a `Polygon` or `MultiPolygon`.
    pub fn is_areal(&self) -> bool {
        matches!(self, Geometry::Polygon(_) | Geometry::MultiPolygon(_))
    }
}

/// A geometry with its properties, serialized as a GeoJSON `Feature`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub struct Feature {
    pub geometry: Geometry,
    #[serde(default)]
    pub properties: Properties,
}

impl Feature {
    /// Creates a feature with empty properties.
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            properties: Properties::new(),
        }
    }

    /// Builder-style property insertion.
    pub fn with_property(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    /// Returns a string property, if present.
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(|v| v.as_str())
    }

    /// The `layer_name` property, if present.
    pub fn layer_name(&self) -> Option<&str> {
        self.property_str("layer_name")
    }

    /// Returns a copy of this feature with a different geometry.
    pub fn with_geometry(&self, geometry: Geometry) -> Self {
        Self {
            geometry,
            properties: self.properties.clone(),
        }
    }
}

/// A GeoJSON `FeatureCollection` wrapper used for file input/output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type")]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl From<Vec<Feature>> for FeatureCollection {
    fn from(features: Vec<Feature>) -> Self {
        Self { features }
    }
}
