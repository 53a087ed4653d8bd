//! Validation of caller-supplied GeoJSON geometries and features.

use serde_json::Value;
use thiserror::Error;

use super::family::GeometryFamily;
use crate::geometry::{Feature, Geometry, Position, PositionError, Properties, Ring};

/// Minimum positions in a line.
pub const MIN_LINE_POSITIONS: usize = 2;

/// Minimum positions in a closed ring.
pub const MIN_RING_POSITIONS: usize = 4;

/// Reasons an element or feature is rejected.
///
/// Rejects are per element: callers count and skip them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Malformed element: {0}")]
    MalformedElement(String),

    #[error("Feature has no geometry")]
    MissingGeometry,

    #[error("Unsupported geometry type: {0}")]
    UnsupportedType(String),

    #[error("Malformed {0} coordinates")]
    MalformedCoordinates(&'static str),

    #[error("Invalid position: {0}")]
    InvalidPosition(#[from] PositionError),

    #[error("{kind} needs at least {required} positions, found {found}")]
    TooFewPositions {
        kind: &'static str,
        found: usize,
        required: usize,
    },

    #[error("Way is not closed")]
    NotClosed,

    #[error("{element} element cannot produce {family} geometry")]
    FamilyMismatch {
        element: &'static str,
        family: GeometryFamily,
    },

    #[error("Relation {0} has no usable members")]
    EmptyRelation(i64),

    #[error("Member {index} is invalid: {source}")]
    InvalidMember {
        index: usize,
        #[source]
        source: Box<ValidationError>,
    },
}

impl ValidationError {
    fn member(index: usize, source: ValidationError) -> Self {
        ValidationError::InvalidMember {
            index,
            source: Box::new(source),
        }
    }
}

/// Validates a GeoJSON geometry object into a typed [`Geometry`].
///
/// Polygon rings that are not explicitly closed are closed by repeating the
/// first position. Degenerate inner rings are discarded.
pub fn validate_geometry(value: &Value) -> Result<Geometry, ValidationError> {
    let obj = value.as_object().ok_or(ValidationError::MissingGeometry)?;
    let kind = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or(ValidationError::MissingGeometry)?;
    let coords = obj.get("coordinates").unwrap_or(&Value::Null);

    match kind {
        "Point" => Ok(Geometry::Point(parse_position(coords)?)),
        "LineString" => Ok(Geometry::LineString(parse_line(coords)?)),
        "Polygon" => Ok(Geometry::Polygon(parse_polygon(coords)?)),
        "MultiLineString" => {
            let members = as_array(coords, "MultiLineString")?;
            if members.is_empty() {
                return Err(ValidationError::MalformedCoordinates("MultiLineString"));
            }
            let lines = members
                .iter()
                .enumerate()
                .map(|(i, m)| parse_line(m).map_err(|e| ValidationError::member(i, e)))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Geometry::MultiLineString(lines))
        }
        "MultiPolygon" => {
            let members = as_array(coords, "MultiPolygon")?;
            if members.is_empty() {
                return Err(ValidationError::MalformedCoordinates("MultiPolygon"));
            }
            let polygons = members
                .iter()
                .enumerate()
                .map(|(i, m)| parse_polygon(m).map_err(|e| ValidationError::member(i, e)))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Geometry::MultiPolygon(polygons))
        }
        other => Err(ValidationError::UnsupportedType(other.to_string())),
    }
}

/// Validates a caller-supplied feature (or bare geometry) and fills the
/// mandatory `name`, `feature_name`, `layer_name` and `domain_name`
/// properties. Present values are never overwritten.
pub fn normalize_feature(
    value: &Value,
    layer_name: &str,
    domain_name: &str,
) -> Result<Feature, ValidationError> {
    let (geometry_value, source_properties) = match value.get("type").and_then(Value::as_str) {
        Some("Feature") => (
            value.get("geometry").unwrap_or(&Value::Null),
            value.get("properties").and_then(Value::as_object),
        ),
        _ => (value, None),
    };
    if geometry_value.is_null() {
        return Err(ValidationError::MissingGeometry);
    }
    let geometry = validate_geometry(geometry_value)?;

    let existing = |key: &str| {
        source_properties
            .and_then(|p| p.get(key))
            .filter(|v| !v.is_null())
            .cloned()
    };
    let name = existing("name")
        .or_else(|| existing("feature_name"))
        .unwrap_or_else(|| Value::from(layer_name));
    let feature_name = existing("feature_name").unwrap_or_else(|| name.clone());

    let mut properties = Properties::new();
    properties.insert("name".to_string(), name);
    properties.insert("feature_name".to_string(), feature_name);
    properties.insert(
        "layer_name".to_string(),
        existing("layer_name").unwrap_or_else(|| Value::from(layer_name)),
    );
    properties.insert(
        "domain_name".to_string(),
        existing("domain_name").unwrap_or_else(|| Value::from(domain_name)),
    );
    if let Some(source) = source_properties {
        for (key, value) in source {
            if !properties.contains_key(key) {
                properties.insert(key.clone(), value.clone());
            }
        }
    }

    Ok(Feature {
        geometry,
        properties,
    })
}

fn as_array<'a>(value: &'a Value, kind: &'static str) -> Result<&'a Vec<Value>, ValidationError> {
    value
        .as_array()
        .ok_or(ValidationError::MalformedCoordinates(kind))
}

fn parse_position(value: &Value) -> Result<Position, ValidationError> {
    let components = as_array(value, "Point")?;
    let numbers = components
        .iter()
        .map(|c| c.as_f64().ok_or(ValidationError::MalformedCoordinates("Point")))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Position::try_from(numbers)?)
}

fn parse_positions(value: &Value, kind: &'static str) -> Result<Vec<Position>, ValidationError> {
    as_array(value, kind)?.iter().map(parse_position).collect()
}

fn parse_line(value: &Value) -> Result<Vec<Position>, ValidationError> {
    let line = parse_positions(value, "LineString")?;
    if line.len() < MIN_LINE_POSITIONS {
        return Err(ValidationError::TooFewPositions {
            kind: "LineString",
            found: line.len(),
            required: MIN_LINE_POSITIONS,
        });
    }
    Ok(line)
}

fn parse_polygon(value: &Value) -> Result<Vec<Ring>, ValidationError> {
    let rings = as_array(value, "Polygon")?;
    let (outer, inners) = rings
        .split_first()
        .ok_or(ValidationError::MalformedCoordinates("Polygon"))?;

    let outer = close_ring(parse_positions(outer, "Polygon")?);
    if outer.len() < MIN_RING_POSITIONS {
        return Err(ValidationError::TooFewPositions {
            kind: "Polygon outer ring",
            found: outer.len(),
            required: MIN_RING_POSITIONS,
        });
    }

    let mut result = vec![outer];
    for inner in inners {
        let inner = close_ring(parse_positions(inner, "Polygon")?);
        if inner.len() >= MIN_RING_POSITIONS {
            result.push(inner);
        }
    }
    Ok(result)
}

/// Makes the last position exactly equal to the first.
pub(crate) fn close_ring(mut ring: Ring) -> Ring {
    if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) {
        if first != last {
            ring.push(first);
        }
    }
    ring
}
