//! Clipping boundary: a validated polygon or multipolygon with precomputed edges.

use geo::algorithm::coordinate_position::{CoordPos, CoordinatePosition};
use geo::{Coord, MultiPolygon};
use serde_json::Value;
use thiserror::Error;

use super::primitives::{
    segment_crossings, segment_hits, to_geo_polygon, BoundingBox, Edge, Hit, Location,
};
use super::types::{Geometry, Position, Ring};

/// Errors raised while loading a boundary. Always fatal for a run.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BoundaryError {
    /// The boundary string is not valid JSON.
    #[error("Boundary is not valid JSON: {0}")]
    InvalidJson(String),

    /// The JSON value is not a geometry, feature or feature collection.
    #[error("Boundary must be a GeoJSON geometry or feature, found {0}")]
    NotGeoJson(String),

    /// The geometry could not be decoded.
    #[error("Invalid boundary geometry: {0}")]
    InvalidGeometry(String),

    /// Only Polygon and MultiPolygon are accepted.
    #[error("Boundary must be a Polygon or MultiPolygon, found {0}")]
    UnsupportedGeometry(String),

    /// A ring is too short or not closed.
    #[error("Boundary ring {ring} is invalid: {reason}")]
    InvalidRing { ring: usize, reason: String },

    /// No polygon remained after parsing.
    #[error("Boundary contains no polygons")]
    Empty,
}

/// An immutable clipping boundary.
///
/// Built once per pipeline run and shared read-only between stages.
#[derive(Debug, Clone)]
pub struct Boundary {
    polygons: MultiPolygon<f64>,
    rings: Vec<Vec<Ring>>,
    edges: Vec<Edge>,
    hole_anchors: Vec<Coord<f64>>,
    bbox: BoundingBox,
}

impl Boundary {
    /// Builds a boundary from a `Polygon` or `MultiPolygon` geometry.
    pub fn from_geometry(geometry: &Geometry) -> Result<Self, BoundaryError> {
        let polygons: Vec<Vec<Ring>> = match geometry {
            Geometry::Polygon(rings) => vec![rings.clone()],
            Geometry::MultiPolygon(polys) => polys.clone(),
            other => {
                return Err(BoundaryError::UnsupportedGeometry(
                    other.type_name().to_string(),
                ))
            }
        };
        Self::from_rings(polygons)
    }

    /// Parses a boundary from a JSON value: a geometry, a feature, a feature
    /// collection of polygons, or a string containing any of these.
    pub fn from_value(value: &Value) -> Result<Self, BoundaryError> {
        match value {
            Value::String(s) => Self::parse_str(s),
            Value::Object(obj) => match obj.get("type").and_then(Value::as_str) {
                Some("Feature") => {
                    let geometry = obj
                        .get("geometry")
                        .ok_or_else(|| {
                            BoundaryError::InvalidGeometry("feature has no geometry".into())
                        })?;
                    Self::from_value(geometry)
                }
                Some("FeatureCollection") => {
                    let features = obj
                        .get("features")
                        .and_then(Value::as_array)
                        .ok_or_else(|| {
                            BoundaryError::InvalidGeometry("collection has no features".into())
                        })?;
                    let mut polygons = Vec::new();
                    for feature in features {
                        let part = Self::from_value(feature)?;
                        polygons.extend(part.rings);
                    }
                    Self::from_rings(polygons)
                }
                Some(_) => {
                    let geometry: Geometry = serde_json::from_value(value.clone())
                        .map_err(|e| BoundaryError::InvalidGeometry(e.to_string()))?;
                    Self::from_geometry(&geometry)
                }
                None => Err(BoundaryError::NotGeoJson("object without type".into())),
            },
            Value::Null => Err(BoundaryError::NotGeoJson("null".into())),
            Value::Bool(_) => Err(BoundaryError::NotGeoJson("boolean".into())),
            Value::Number(_) => Err(BoundaryError::NotGeoJson("number".into())),
            Value::Array(_) => Err(BoundaryError::NotGeoJson("array".into())),
        }
    }

    /// Parses a boundary from a JSON-encoded string.
    pub fn parse_str(input: &str) -> Result<Self, BoundaryError> {
        let value: Value =
            serde_json::from_str(input).map_err(|e| BoundaryError::InvalidJson(e.to_string()))?;
        if value.is_string() {
            return Err(BoundaryError::NotGeoJson("doubly encoded string".into()));
        }
        Self::from_value(&value)
    }

    fn from_rings(polygons: Vec<Vec<Ring>>) -> Result<Self, BoundaryError> {
        if polygons.is_empty() || polygons.iter().all(|p| p.is_empty()) {
            return Err(BoundaryError::Empty);
        }

        let mut edges = Vec::new();
        let mut hole_anchors = Vec::new();
        let mut ring_index = 0;
        for polygon in &polygons {
            for (i, ring) in polygon.iter().enumerate() {
                validate_ring(ring, ring_index)?;
                edges.extend(ring.windows(2).map(|w| Edge::new(w[0].to_geo(), w[1].to_geo())));
                if i > 0 {
                    hole_anchors.push(ring[0].to_geo());
                }
                ring_index += 1;
            }
        }

        let bbox = BoundingBox::from_positions(polygons.iter().flatten().flatten())
            .ok_or(BoundaryError::Empty)?;
        let geo_polygons = MultiPolygon(polygons.iter().map(|p| to_geo_polygon(p)).collect());

        Ok(Self {
            polygons: geo_polygons,
            rings: polygons,
            edges,
            hole_anchors,
            bbox,
        })
    }

    /// Bounding box over every ring vertex of every polygon.
    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    /// The boundary as a geo multipolygon.
    pub fn as_multi_polygon(&self) -> &MultiPolygon<f64> {
        &self.polygons
    }

    /// The boundary as a pipeline geometry.
    pub fn to_geometry(&self) -> Geometry {
        if self.rings.len() == 1 {
            Geometry::Polygon(self.rings[0].clone())
        } else {
            Geometry::MultiPolygon(self.rings.clone())
        }
    }

    /// Number of polygons making up the boundary.
    pub fn polygon_count(&self) -> usize {
        self.rings.len()
    }

    /// Locates a position relative to the boundary.
    pub fn locate(&self, pos: Position) -> Location {
        self.locate_coord(pos.to_geo())
    }

    pub(crate) fn locate_coord(&self, coord: Coord<f64>) -> Location {
        if coord.x < self.bbox.min_lon
            || coord.x > self.bbox.max_lon
            || coord.y < self.bbox.min_lat
            || coord.y > self.bbox.max_lat
        {
            return Location::Outside;
        }
        // Parts are tested one by one: an edge shared by two adjacent parts
        // must stay on the boundary rather than cancel out.
        let mut on_boundary = false;
        for polygon in &self.polygons.0 {
            match polygon.coordinate_position(&coord) {
                CoordPos::Inside => return Location::Inside,
                CoordPos::OnBoundary => on_boundary = true,
                CoordPos::Outside => {}
            }
        }
        if on_boundary {
            Location::OnBoundary
        } else {
            Location::Outside
        }
    }

    /// Point-in-polygon test; positions on the boundary count as inside.
    pub fn contains(&self, pos: Position) -> bool {
        self.locate(pos).is_kept()
    }

    /// Interior crossings of segment `a → b` with the boundary rings.
    pub(crate) fn crossings(&self, a: Coord<f64>, b: Coord<f64>) -> Vec<Hit> {
        segment_crossings(&self.edges, a, b)
    }

    /// Whether segment `a → b` meets any boundary ring, endpoints included.
    pub(crate) fn touches_segment(&self, a: Coord<f64>, b: Coord<f64>) -> bool {
        !segment_hits(&self.edges, a, b).is_empty()
    }

    /// Whether every vertex of `path` is strictly inside and no segment meets a ring.
    pub(crate) fn strictly_contains_path(&self, path: &[Position]) -> bool {
        path.iter()
            .all(|p| self.locate(*p) == Location::Inside)
            && path
                .windows(2)
                .all(|w| !self.touches_segment(w[0].to_geo(), w[1].to_geo()))
    }

    /// One vertex of every boundary hole.
    pub(crate) fn hole_anchors(&self) -> &[Coord<f64>] {
        &self.hole_anchors
    }
}

fn validate_ring(ring: &[Position], index: usize) -> Result<(), BoundaryError> {
    if ring.len() < 4 {
        return Err(BoundaryError::InvalidRing {
            ring: index,
            reason: format!("has {} positions, at least 4 required", ring.len()),
        });
    }
    if ring.first() != ring.last() {
        return Err(BoundaryError::InvalidRing {
            ring: index,
            reason: "is not closed".to_string(),
        });
    }
    Ok(())
}
