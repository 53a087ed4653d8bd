//! Coordinate and geometry fingerprints.

use std::fmt::{self, Write};

use crate::geometry::{centroid, Geometry, Position};

/// Decimal places kept when rounding coordinates for fingerprints.
pub const FINGERPRINT_DECIMALS: usize = 6;

const SCALE: f64 = 1e6;

/// Rounds a component to fingerprint precision, folding `-0` into `0`.
fn round(value: f64) -> f64 {
    let rounded = (value * SCALE).round() / SCALE;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Representative coordinate of a feature, rounded, as `"lat,lon"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CoordKey(String);

impl CoordKey {
    /// Builds the key from the geometry's representative position.
    ///
    /// Points use themselves; compound geometries use their first vertex;
    /// the centroid is the fallback. `None` when nothing can be extracted.
    pub fn of(geometry: &Geometry) -> Option<Self> {
        let position = geometry.first_position().or_else(|| centroid(geometry))?;
        Some(Self::from_position(position))
    }

    pub fn from_position(position: Position) -> Self {
        Self(format!(
            "{:.prec$},{:.prec$}",
            round(position.lat),
            round(position.lon),
            prec = FINGERPRINT_DECIMALS
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CoordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Geometry type plus the full rounded coordinate array.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GeomKey(String);

impl GeomKey {
    /// `None` when the geometry has no coordinates at all.
    pub fn of(geometry: &Geometry) -> Option<Self> {
        geometry.first_position()?;
        let mut key = format!("{}:", geometry.type_name());
        match geometry {
            Geometry::Point(p) => write_position(&mut key, p),
            Geometry::LineString(line) => write_sequence(&mut key, line),
            Geometry::MultiLineString(lines) => write_rings(&mut key, lines),
            Geometry::Polygon(rings) => write_rings(&mut key, rings),
            Geometry::MultiPolygon(polygons) => {
                write_nested(&mut key, polygons, |out, rings| write_rings(out, rings))
            }
        }
        Some(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GeomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn write_position(out: &mut String, position: &Position) {
    // Writing to a String cannot fail.
    let _ = write!(
        out,
        "[{:.prec$},{:.prec$}]",
        round(position.lon),
        round(position.lat),
        prec = FINGERPRINT_DECIMALS
    );
}

fn write_sequence(out: &mut String, positions: &[Position]) {
    write_nested(out, positions, write_position);
}

fn write_rings(out: &mut String, rings: &[Vec<Position>]) {
    write_nested(out, rings, |out, ring| write_sequence(out, ring));
}

fn write_nested<T>(out: &mut String, items: &[T], write_item: impl Fn(&mut String, &T)) {
    out.push('[');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_item(out, item);
    }
    out.push(']');
}
