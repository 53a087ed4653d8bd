//! Low-level geometric predicates shared by the clipper and the assembler.

use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::{Centroid, Coord, Line};

use super::types::{Geometry, Position};

/// Parameters closer than this to each other (or to 0/1) are treated as equal.
pub const PARAM_EPSILON: f64 = 1e-12;

/// Where a position lies relative to a boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Inside,
    OnBoundary,
    Outside,
}

impl Location {
    /// Inside or on the boundary.
    #[inline]
    pub fn is_kept(self) -> bool {
        !matches!(self, Location::Outside)
    }
}

/// Axis-aligned bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Smallest box containing every position, or `None` for an empty iterator.
    pub fn from_positions<'a>(positions: impl IntoIterator<Item = &'a Position>) -> Option<Self> {
        let mut iter = positions.into_iter();
        let first = iter.next()?;
        let mut bbox = BoundingBox {
            min_lon: first.lon,
            min_lat: first.lat,
            max_lon: first.lon,
            max_lat: first.lat,
        };
        for p in iter {
            bbox.min_lon = bbox.min_lon.min(p.lon);
            bbox.min_lat = bbox.min_lat.min(p.lat);
            bbox.max_lon = bbox.max_lon.max(p.lon);
            bbox.max_lat = bbox.max_lat.max(p.lat);
        }
        Some(bbox)
    }

    /// Overpass bbox clause body: `south,west,north,east`.
    pub fn to_overpass(&self) -> String {
        format!(
            "{},{},{},{}",
            self.min_lat, self.min_lon, self.max_lat, self.max_lon
        )
    }

    #[inline]
    pub(crate) fn overlaps_segment(&self, a: Coord<f64>, b: Coord<f64>) -> bool {
        a.x.max(b.x) >= self.min_lon
            && a.x.min(b.x) <= self.max_lon
            && a.y.max(b.y) >= self.min_lat
            && a.y.min(b.y) <= self.max_lat
    }
}

/// A boundary edge with its precomputed bounding box.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Edge {
    pub line: Line<f64>,
    pub bbox: BoundingBox,
}

impl Edge {
    pub fn new(start: Coord<f64>, end: Coord<f64>) -> Self {
        Self {
            line: Line::new(start, end),
            bbox: BoundingBox {
                min_lon: start.x.min(end.x),
                min_lat: start.y.min(end.y),
                max_lon: start.x.max(end.x),
                max_lat: start.y.max(end.y),
            },
        }
    }
}

/// Parameter of `p` projected onto the segment `a → b`.
#[inline]
fn param_along(a: Coord<f64>, b: Coord<f64>, p: Coord<f64>) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return 0.0;
    }
    (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0)
}

/// A point where a segment meets the boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Hit {
    /// Parameter along the segment, in `[0, 1]`.
    pub t: f64,
    /// The intersection coordinate as computed by the robust predicate.
    pub at: Coord<f64>,
}

/// Every point at which segment `a → b` meets one of `edges`.
///
/// Collinear overlaps contribute both overlap endpoints. The result is sorted
/// by parameter and deduplicated.
pub(crate) fn segment_hits(edges: &[Edge], a: Coord<f64>, b: Coord<f64>) -> Vec<Hit> {
    if a == b {
        return Vec::new();
    }
    let segment = Line::new(a, b);
    let mut hits = Vec::new();
    let mut push = |at: Coord<f64>| {
        hits.push(Hit {
            t: param_along(a, b, at),
            at,
        })
    };

    for edge in edges {
        if !edge.bbox.overlaps_segment(a, b) {
            continue;
        }
        match line_intersection(segment, edge.line) {
            Some(LineIntersection::SinglePoint { intersection, .. }) => push(intersection),
            Some(LineIntersection::Collinear { intersection }) => {
                push(intersection.start);
                push(intersection.end);
            }
            None => {}
        }
    }

    hits.sort_by(|x, y| x.t.total_cmp(&y.t));
    hits.dedup_by(|x, y| (x.t - y.t).abs() <= PARAM_EPSILON);
    hits
}

/// Interior crossings `t ∈ (0, 1)` of segment `a → b` against `edges`.
pub(crate) fn segment_crossings(edges: &[Edge], a: Coord<f64>, b: Coord<f64>) -> Vec<Hit> {
    segment_hits(edges, a, b)
        .into_iter()
        .filter(|h| h.t > PARAM_EPSILON && h.t < 1.0 - PARAM_EPSILON)
        .collect()
}

/// Linear interpolation along `a → b`.
#[inline]
pub(crate) fn lerp(a: Coord<f64>, b: Coord<f64>, t: f64) -> Coord<f64> {
    Coord {
        x: a.x + (b.x - a.x) * t,
        y: a.y + (b.y - a.y) * t,
    }
}

/// Converts a ring or path to a geo `LineString`.
pub(crate) fn to_geo_line(positions: &[Position]) -> geo::LineString<f64> {
    geo::LineString(positions.iter().map(|p| p.to_geo()).collect())
}

/// Converts polygon rings (exterior first) to a geo `Polygon`.
pub(crate) fn to_geo_polygon(rings: &[Vec<Position>]) -> geo::Polygon<f64> {
    let mut iter = rings.iter();
    let exterior = iter
        .next()
        .map(|r| to_geo_line(r))
        .unwrap_or_else(|| geo::LineString(Vec::new()));
    geo::Polygon::new(exterior, iter.map(|r| to_geo_line(r)).collect())
}

/// Converts a geo polygon back to rings.
pub(crate) fn from_geo_polygon(polygon: &geo::Polygon<f64>) -> Vec<Vec<Position>> {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(|ring| ring.coords().map(|c| Position::from_geo(*c)).collect())
        .collect()
}

/// Converts any pipeline geometry to its geo equivalent.
pub(crate) fn to_geo_geometry(geometry: &Geometry) -> geo::Geometry<f64> {
    match geometry {
        Geometry::Point(p) => geo::Geometry::Point(geo::Point(p.to_geo())),
        Geometry::LineString(line) => geo::Geometry::LineString(to_geo_line(line)),
        Geometry::MultiLineString(lines) => geo::Geometry::MultiLineString(geo::MultiLineString(
            lines.iter().map(|l| to_geo_line(l)).collect(),
        )),
        Geometry::Polygon(rings) => geo::Geometry::Polygon(to_geo_polygon(rings)),
        Geometry::MultiPolygon(polys) => geo::Geometry::MultiPolygon(geo::MultiPolygon(
            polys.iter().map(|p| to_geo_polygon(p)).collect(),
        )),
    }
}

/// Geometric centroid, used as a fallback representative point.
pub fn centroid(geometry: &Geometry) -> Option<Position> {
    to_geo_geometry(geometry)
        .centroid()
        .map(|p| Position::from_geo(p.0))
        .filter(|p| p.lon.is_finite() && p.lat.is_finite())
}

/// Arithmetic mean of a set of positions.
pub fn mean_position<'a>(positions: impl IntoIterator<Item = &'a Position>) -> Option<Position> {
    let points: geo::MultiPoint<f64> = positions
        .into_iter()
        .map(|p| geo::Point(p.to_geo()))
        .collect();
    points.centroid().map(|p| Position::from_geo(p.0))
}
