//! Feature assembler
//!
//! Turns raw Overpass elements into validated [`Feature`]s under a declared
//! [`GeometryFamily`], and validates caller-supplied GeoJSON features.
//!
//! | Element  | `line`                      | `polygon`                  | `mixed`                        |
//! |----------|-----------------------------|----------------------------|--------------------------------|
//! | node     | rejected                    | rejected                   | `Point`                        |
//! | way      | `LineString`                | `Polygon` if closed        | `Polygon` if closed, else line |
//! | relation | `LineString`/`MultiLineString` | stitched `(Multi)Polygon` | one group as way, else centroid |
//!
//! Every rejection is a [`ValidationError`]. Callers skip and count them.
//!
//! [`Feature`]: crate::geometry::Feature

mod builder;
mod element;
mod family;
mod validate;

pub use builder::{is_closed, Assembler, CLOSED_TOLERANCE};
pub use element::{LatLon, RawElement, RawMember, Tags};
pub use family::GeometryFamily;
pub use validate::{
    normalize_feature, validate_geometry, ValidationError, MIN_LINE_POSITIONS, MIN_RING_POSITIONS,
};
