//! Raw Overpass elements as returned by `out geom`.

use indexmap::IndexMap;
use serde::Deserialize;

use super::validate::ValidationError;
use crate::geometry::Position;

/// OSM tag map, kept in source order.
pub type Tags = IndexMap<String, String>;

/// A `{lat, lon}` vertex from an `out geom` geometry array.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    /// Converts to a validated position.
    pub fn to_position(self) -> Result<Position, ValidationError> {
        Ok(Position::new(self.lon, self.lat)?)
    }
}

/// A relation member with its resolved geometry.
#[derive(Debug, Clone, Deserialize)]
pub struct RawMember {
    /// Member element type (`node`, `way`, `relation`).
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub geometry: Vec<LatLon>,
    /// Present on node members.
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

impl RawMember {
    /// Whether this member is an inner ring of a multipolygon.
    pub fn is_inner(&self) -> bool {
        self.role == "inner"
    }
}

/// One element of an Overpass JSON response.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RawElement {
    Node {
        id: i64,
        lat: f64,
        lon: f64,
        #[serde(default)]
        tags: Tags,
    },
    Way {
        id: i64,
        #[serde(default)]
        geometry: Vec<LatLon>,
        #[serde(default)]
        tags: Tags,
    },
    Relation {
        id: i64,
        #[serde(default)]
        members: Vec<RawMember>,
        #[serde(default)]
        tags: Tags,
    },
}

impl RawElement {
    /// Parses one element from a JSON value.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, ValidationError> {
        RawElement::deserialize(value)
            .map_err(|e| ValidationError::MalformedElement(e.to_string()))
    }

    /// OSM element type name.
    pub fn osm_type(&self) -> &'static str {
        match self {
            RawElement::Node { .. } => "node",
            RawElement::Way { .. } => "way",
            RawElement::Relation { .. } => "relation",
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            RawElement::Node { id, .. }
            | RawElement::Way { id, .. }
            | RawElement::Relation { id, .. } => *id,
        }
    }

    pub fn tags(&self) -> &Tags {
        match self {
            RawElement::Node { tags, .. }
            | RawElement::Way { tags, .. }
            | RawElement::Relation { tags, .. } => tags,
        }
    }
}

/// Converts an `out geom` vertex list into validated positions.
pub(crate) fn positions(vertices: &[LatLon]) -> Result<Vec<Position>, ValidationError> {
    vertices.iter().map(|v| v.to_position()).collect()
}
