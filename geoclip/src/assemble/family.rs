//! Declared geometry family per topic.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tag keys whose features are always linear.
const LINE_KEYS: &[&str] = &["highway", "railway", "waterway", "barrier", "route", "power"];

/// Tag keys whose features are always areal.
const POLYGON_KEYS: &[&str] = &["building", "landuse", "boundary", "area", "place"];

/// Geometry category a topic is constrained to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryFamily {
    /// Always `LineString` / `MultiLineString`.
    Line,
    /// Always `Polygon` / `MultiPolygon`.
    Polygon,
    /// Point, line or polygon inferred from shape.
    #[default]
    Mixed,
}

impl GeometryFamily {
    /// Infers a family from a topic's tag filter keys.
    ///
    /// Every key must agree; a filter mixing linear and areal keys, or using
    /// any unknown key, is `Mixed`.
    pub fn infer_from_keys<'a>(keys: impl IntoIterator<Item = &'a str>) -> Self {
        let mut family = None;
        for key in keys {
            let this = if LINE_KEYS.contains(&key) {
                GeometryFamily::Line
            } else if POLYGON_KEYS.contains(&key) {
                GeometryFamily::Polygon
            } else {
                return GeometryFamily::Mixed;
            };
            match family {
                None => family = Some(this),
                Some(f) if f != this => return GeometryFamily::Mixed,
                Some(_) => {}
            }
        }
        family.unwrap_or(GeometryFamily::Mixed)
    }

    /// Whether queries for this family skip node elements.
    pub fn excludes_nodes(&self) -> bool {
        matches!(self, GeometryFamily::Line)
    }
}

impl fmt::Display for GeometryFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryFamily::Line => write!(f, "line"),
            GeometryFamily::Polygon => write!(f, "polygon"),
            GeometryFamily::Mixed => write!(f, "mixed"),
        }
    }
}

impl FromStr for GeometryFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "line" => Ok(GeometryFamily::Line),
            "polygon" => Ok(GeometryFamily::Polygon),
            "mixed" | "point" => Ok(GeometryFamily::Mixed),
            other => Err(format!("unknown geometry family '{}'", other)),
        }
    }
}
