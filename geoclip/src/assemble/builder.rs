//! Element → feature conversion under a declared geometry family.

use geo::algorithm::coordinate_position::{CoordPos, CoordinatePosition};
use serde_json::Value;
use tracing::trace;

use super::element::{positions, RawElement, RawMember, Tags};
use super::family::GeometryFamily;
use super::validate::{close_ring, ValidationError, MIN_LINE_POSITIONS, MIN_RING_POSITIONS};
use crate::geometry::{
    mean_position, to_geo_polygon, Feature, Geometry, Position, Properties, Ring,
};

/// Tolerance in degrees for treating a way as closed.
pub const CLOSED_TOLERANCE: f64 = 1e-4;

/// Tolerance in degrees for joining member ways end to end.
const STITCH_TOLERANCE: f64 = 1e-9;

/// Whether a vertex sequence forms a closed ring.
pub fn is_closed(coords: &[Position]) -> bool {
    match (coords.first(), coords.last()) {
        (Some(first), Some(last)) if coords.len() >= MIN_RING_POSITIONS => {
            first.approx_eq(last, CLOSED_TOLERANCE)
        }
        _ => false,
    }
}

/// Snaps a closed sequence so that its last vertex equals its first.
fn snap_ring(mut coords: Vec<Position>) -> Ring {
    if let Some(first) = coords.first().copied() {
        if let Some(last) = coords.last_mut() {
            *last = first;
        }
    }
    close_ring(coords)
}

/// Converts raw elements of one topic into features.
#[derive(Debug, Clone)]
pub struct Assembler {
    family: GeometryFamily,
    layer_name: String,
    domain_name: String,
}

impl Assembler {
    pub fn new(
        family: GeometryFamily,
        layer_name: impl Into<String>,
        domain_name: impl Into<String>,
    ) -> Self {
        Self {
            family,
            layer_name: layer_name.into(),
            domain_name: domain_name.into(),
        }
    }

    pub fn family(&self) -> GeometryFamily {
        self.family
    }

    pub fn layer_name(&self) -> &str {
        &self.layer_name
    }

    /// Parses and assembles one element from a JSON value.
    pub fn assemble_value(&self, value: &Value) -> Result<Feature, ValidationError> {
        let element = RawElement::from_value(value)?;
        self.assemble(&element)
    }

    /// Assembles one element into a feature.
    pub fn assemble(&self, element: &RawElement) -> Result<Feature, ValidationError> {
        let geometry = match element {
            RawElement::Node { lat, lon, .. } => self.node_geometry(*lon, *lat)?,
            RawElement::Way { geometry, .. } => self.way_geometry(positions(geometry)?)?,
            RawElement::Relation { id, members, .. } => self.relation_geometry(*id, members)?,
        };
        Ok(Feature {
            geometry,
            properties: self.properties(element.osm_type(), element.id(), element.tags()),
        })
    }

    fn node_geometry(&self, lon: f64, lat: f64) -> Result<Geometry, ValidationError> {
        match self.family {
            GeometryFamily::Mixed => Ok(Geometry::Point(Position::new(lon, lat)?)),
            family => Err(ValidationError::FamilyMismatch {
                element: "node",
                family,
            }),
        }
    }

    fn way_geometry(&self, coords: Vec<Position>) -> Result<Geometry, ValidationError> {
        match self.family {
            GeometryFamily::Line => line(coords),
            GeometryFamily::Polygon if is_closed(&coords) => {
                Ok(Geometry::Polygon(vec![snap_ring(coords)]))
            }
            GeometryFamily::Polygon => Err(ValidationError::NotClosed),
            GeometryFamily::Mixed if is_closed(&coords) => {
                Ok(Geometry::Polygon(vec![snap_ring(coords)]))
            }
            GeometryFamily::Mixed => line(coords),
        }
    }

    fn relation_geometry(
        &self,
        id: i64,
        members: &[RawMember],
    ) -> Result<Geometry, ValidationError> {
        let mut outer = Vec::new();
        let mut inner = Vec::new();
        let mut points = Vec::new();

        for (index, member) in members.iter().enumerate() {
            let result = match member.kind.as_str() {
                "way" if member.geometry.is_empty() => continue,
                "way" => positions(&member.geometry),
                "node" => match (member.lon, member.lat) {
                    (Some(lon), Some(lat)) => {
                        Position::new(lon, lat)
                            .map(|p| vec![p])
                            .map_err(ValidationError::from)
                    }
                    _ => continue,
                },
                _ => continue,
            };
            let coords = result.map_err(|e| ValidationError::InvalidMember {
                index,
                source: Box::new(e),
            })?;
            match coords.len() {
                1 => points.push(coords[0]),
                _ if member.is_inner() => inner.push(coords),
                _ => outer.push(coords),
            }
        }

        match self.family {
            GeometryFamily::Line => {
                let mut lines: Vec<Vec<Position>> = outer
                    .into_iter()
                    .chain(inner)
                    .filter(|l| l.len() >= MIN_LINE_POSITIONS)
                    .collect();
                match lines.len() {
                    0 => Err(ValidationError::EmptyRelation(id)),
                    1 => Ok(Geometry::LineString(lines.remove(0))),
                    _ => Ok(Geometry::MultiLineString(lines)),
                }
            }
            GeometryFamily::Polygon => {
                if outer.is_empty() && inner.is_empty() {
                    return Err(ValidationError::EmptyRelation(id));
                }
                let mut polygons = assign_holes(closed_rings(outer), closed_rings(inner));
                match polygons.len() {
                    0 => Err(ValidationError::NotClosed),
                    1 => Ok(Geometry::Polygon(polygons.remove(0))),
                    _ => Ok(Geometry::MultiPolygon(polygons)),
                }
            }
            GeometryFamily::Mixed => {
                let mut groups = stitch(outer.into_iter().chain(inner).collect());
                groups.extend(points.into_iter().map(|p| vec![p]));
                match groups.len() {
                    0 => Err(ValidationError::EmptyRelation(id)),
                    1 => {
                        let group = groups.remove(0);
                        if group.len() == 1 {
                            Ok(Geometry::Point(group[0]))
                        } else {
                            self.way_geometry(group)
                        }
                    }
                    n => {
                        trace!(relation = id, groups = n, "Collapsing relation to centroid");
                        mean_position(groups.iter().flatten())
                            .map(Geometry::Point)
                            .ok_or(ValidationError::EmptyRelation(id))
                    }
                }
            }
        }
    }

    fn properties(&self, osm_type: &str, osm_id: i64, tags: &Tags) -> Properties {
        let name = tags
            .get("name")
            .cloned()
            .unwrap_or_else(|| format!("{} {}", self.layer_name, osm_id));

        let mut properties = Properties::new();
        properties.insert("name".to_string(), Value::from(name.clone()));
        properties.insert("feature_name".to_string(), Value::from(name));
        properties.insert("layer_name".to_string(), Value::from(self.layer_name.clone()));
        properties.insert(
            "domain_name".to_string(),
            Value::from(self.domain_name.clone()),
        );
        properties.insert("osm_type".to_string(), Value::from(osm_type));
        properties.insert("osm_id".to_string(), Value::from(osm_id));
        for (key, value) in tags {
            if !properties.contains_key(key) {
                properties.insert(key.clone(), Value::from(value.clone()));
            }
        }
        properties
    }
}

fn line(coords: Vec<Position>) -> Result<Geometry, ValidationError> {
    if coords.len() < MIN_LINE_POSITIONS {
        return Err(ValidationError::TooFewPositions {
            kind: "LineString",
            found: coords.len(),
            required: MIN_LINE_POSITIONS,
        });
    }
    Ok(Geometry::LineString(coords))
}

/// Joins member ways end to end into maximal chains.
///
/// Members may be reversed to connect. A chain stops growing once it closes
/// or no remaining member touches either of its ends.
pub(crate) fn stitch(mut segments: Vec<Vec<Position>>) -> Vec<Vec<Position>> {
    segments.retain(|s| !s.is_empty());
    let mut chains = Vec::new();

    while !segments.is_empty() {
        let mut chain = segments.remove(0);
        loop {
            if chain.len() >= MIN_RING_POSITIONS && is_joined(&chain[0], &chain[chain.len() - 1])
            {
                break;
            }
            let Some((index, joined)) = find_join(&chain, &segments) else {
                break;
            };
            segments.remove(index);
            chain = joined;
        }
        chains.push(chain);
    }
    chains
}

fn is_joined(a: &Position, b: &Position) -> bool {
    a.approx_eq(b, STITCH_TOLERANCE)
}

/// Finds the first segment touching either end of `chain` and returns the
/// extended chain.
fn find_join(
    chain: &[Position],
    segments: &[Vec<Position>],
) -> Option<(usize, Vec<Position>)> {
    let head = chain.first()?;
    let tail = chain.last()?;

    segments.iter().enumerate().find_map(|(index, segment)| {
        let first = segment.first()?;
        let last = segment.last()?;
        let joined = if is_joined(tail, first) {
            chain.iter().chain(&segment[1..]).copied().collect()
        } else if is_joined(tail, last) {
            chain.iter().chain(segment.iter().rev().skip(1)).copied().collect()
        } else if is_joined(head, last) {
            segment.iter().chain(&chain[1..]).copied().collect()
        } else if is_joined(head, first) {
            segment.iter().rev().chain(&chain[1..]).copied().collect()
        } else {
            return None;
        };
        Some((index, joined))
    })
}

/// Stitches members and keeps only the chains that close into rings.
fn closed_rings(members: Vec<Vec<Position>>) -> Vec<Ring> {
    stitch(members)
        .into_iter()
        .filter_map(|chain| {
            if is_closed(&chain) {
                Some(snap_ring(chain))
            } else {
                trace!(vertices = chain.len(), "Discarding unclosed relation ring");
                None
            }
        })
        .collect()
}

/// Builds polygons from outer rings, attaching each inner ring to the first
/// outer ring that contains it. Orphan inner rings are dropped.
fn assign_holes(outers: Vec<Ring>, inners: Vec<Ring>) -> Vec<Vec<Ring>> {
    let shells: Vec<geo::Polygon<f64>> = outers
        .iter()
        .map(|ring| to_geo_polygon(std::slice::from_ref(ring)))
        .collect();
    let mut polygons: Vec<Vec<Ring>> = outers.into_iter().map(|ring| vec![ring]).collect();

    for hole in inners {
        let owner = hole.iter().find_map(|vertex| {
            let coord = vertex.to_geo();
            let mut on_edge = false;
            for (index, shell) in shells.iter().enumerate() {
                match shell.coordinate_position(&coord) {
                    CoordPos::Inside => return Some(Some(index)),
                    CoordPos::OnBoundary => on_edge = true,
                    CoordPos::Outside => {}
                }
            }
            // A vertex touching a shell decides nothing; try the next one.
            if on_edge {
                None
            } else {
                Some(None)
            }
        });
        match owner.flatten() {
            Some(index) => polygons[index].push(hole),
            None => trace!(vertices = hole.len(), "Dropping inner ring without outer"),
        }
    }
    polygons
}
