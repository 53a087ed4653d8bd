//! Geometry module
//!
//! GeoJSON-compatible geometry and feature types, the clipping [`Boundary`],
//! and the low-level predicates (point-in-polygon, segment/boundary
//! intersection, centroid fallback) the rest of the pipeline is built on.
//!
//! Robust predicates come from the `geo` crate; this module only adapts them
//! to the pipeline's own types.

mod boundary;
mod primitives;
mod types;

pub use boundary::{Boundary, BoundaryError};
pub use primitives::{centroid, mean_position, BoundingBox, Location, PARAM_EPSILON};
pub use types::{
    Feature, FeatureCollection, Geometry, Position, PositionError, Properties, Ring, MAX_LAT,
    MAX_LON, MIN_LAT, MIN_LON,
};

pub(crate) use primitives::{from_geo_polygon, lerp, to_geo_polygon, Hit};
