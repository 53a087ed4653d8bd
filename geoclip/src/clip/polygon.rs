//! Areal clipping via boolean intersection.

use std::panic::{self, AssertUnwindSafe};

use geo::algorithm::coordinate_position::{CoordPos, CoordinatePosition};
use geo::{Area, BooleanOps, Coord, MultiPolygon};

use super::GeometryOperationError;
use crate::geometry::{
    from_geo_polygon, lerp, to_geo_polygon, Boundary, Geometry, Position, Ring,
};

/// Result of clipping an areal geometry.
#[derive(Debug)]
pub(crate) enum AreaClip {
    /// The polygon lies entirely within the boundary.
    Unchanged,
    /// The intersection with the boundary.
    Clipped(Geometry),
    /// Confirmed to lie outside the boundary.
    Outside,
    /// The intersection could not be computed.
    Failed(GeometryOperationError),
}

pub(crate) fn clip_polygons(boundary: &Boundary, polygons: &[Vec<Ring>]) -> AreaClip {
    let feature = MultiPolygon(polygons.iter().map(|p| to_geo_polygon(p)).collect());

    // Containment is decided first so that touching features keep their
    // exact vertex order.
    if within(boundary, polygons, &feature) {
        return AreaClip::Unchanged;
    }

    let intersection = match guarded(|| feature.intersection(boundary.as_multi_polygon())) {
        Ok(result) => result,
        Err(err) => return AreaClip::Failed(err),
    };

    let mut parts: Vec<Vec<Ring>> = intersection
        .0
        .iter()
        .filter(|p| p.exterior().0.len() >= 4 && p.unsigned_area() > 0.0)
        .map(from_geo_polygon)
        .collect();

    match parts.len() {
        0 => AreaClip::Outside,
        1 => AreaClip::Clipped(Geometry::Polygon(parts.remove(0))),
        _ => AreaClip::Clipped(Geometry::MultiPolygon(parts)),
    }
}

/// Every ring lies inside or on the boundary and no boundary hole is
/// enclosed by the feature.
fn within(boundary: &Boundary, polygons: &[Vec<Ring>], feature: &MultiPolygon<f64>) -> bool {
    polygons
        .iter()
        .flatten()
        .all(|ring| ring_within(boundary, ring))
        && boundary
            .hole_anchors()
            .iter()
            .all(|anchor| feature.coordinate_position(anchor) == CoordPos::Outside)
}

/// A ring touching the boundary still counts when every piece of every edge
/// between boundary crossings is kept.
fn ring_within(boundary: &Boundary, ring: &[Position]) -> bool {
    if boundary.strictly_contains_path(ring) {
        return true;
    }
    ring.iter().all(|p| boundary.contains(*p))
        && ring
            .windows(2)
            .all(|w| edge_within(boundary, w[0].to_geo(), w[1].to_geo()))
}

/// Crossings with edges shared by adjacent boundary parts split `a → b`
/// without leaving the boundary, so each piece is judged by its midpoint.
fn edge_within(boundary: &Boundary, a: Coord<f64>, b: Coord<f64>) -> bool {
    let mut cuts = vec![0.0];
    cuts.extend(boundary.crossings(a, b).into_iter().map(|hit| hit.t));
    cuts.push(1.0);
    cuts.windows(2).all(|t| {
        boundary
            .locate_coord(lerp(a, b, (t[0] + t[1]) / 2.0))
            .is_kept()
    })
}

/// Runs a geometry library operation, turning a panic into an error.
pub(super) fn guarded<T>(op: impl FnOnce() -> T) -> Result<T, GeometryOperationError> {
    panic::catch_unwind(AssertUnwindSafe(op)).map_err(|payload| {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        GeometryOperationError(reason)
    })
}
