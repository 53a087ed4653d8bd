//! Boundary clipping.
//!
//! Crops a feature's geometry to the part that lies inside a [`Boundary`].
//! A feature may be dropped, passed through unchanged, or cut into several
//! parts (returned as a `MultiLineString`/`MultiPolygon`).
//!
//! | Geometry            | Strategy                                          |
//! |---------------------|---------------------------------------------------|
//! | Point               | point-in-polygon                                  |
//! | (Multi)LineString   | run state machine over split segments ([`line`])  |
//! | (Multi)Polygon      | boolean intersection, keep-original on failure    |
//!
//! Only a confirmed "outside" determination drops a feature. A numerical
//! failure in the polygon intersection keeps the original geometry.

pub mod line;
mod polygon;

#[cfg(test)]
mod tests;

use thiserror::Error;
use tracing::{trace, warn};

use crate::geometry::{Boundary, Feature, Geometry};
use line::{clip_lines, LineClip};
use polygon::{clip_polygons, AreaClip};

pub use line::{clip_path, RunBuilder, RunState, MIN_RUN_POINTS};

/// The polygon intersection failed inside the geometry library.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Polygon intersection failed: {0}")]
pub struct GeometryOperationError(pub String);

/// Result of clipping one feature.
#[derive(Debug, Clone, PartialEq)]
pub enum ClipOutcome {
    /// Entirely inside; returned coordinate-for-coordinate.
    Unchanged(Feature),
    /// Cropped to the boundary.
    Clipped(Feature),
    /// Intersection failed; the original is kept.
    Fallback(Feature),
    /// Confirmed outside the boundary.
    Dropped,
}

impl ClipOutcome {
    /// The surviving feature, if any.
    pub fn into_feature(self) -> Option<Feature> {
        match self {
            ClipOutcome::Unchanged(f) | ClipOutcome::Clipped(f) | ClipOutcome::Fallback(f) => {
                Some(f)
            }
            ClipOutcome::Dropped => None,
        }
    }

    /// Whether a feature survived.
    pub fn is_kept(&self) -> bool {
        !matches!(self, ClipOutcome::Dropped)
    }
}

/// Clips a single feature against the boundary.
pub fn clip(feature: &Feature, boundary: &Boundary) -> ClipOutcome {
    match &feature.geometry {
        Geometry::Point(pos) => {
            if boundary.contains(*pos) {
                ClipOutcome::Unchanged(feature.clone())
            } else {
                ClipOutcome::Dropped
            }
        }
        Geometry::LineString(line) => {
            lines_outcome(feature, clip_lines(boundary, std::slice::from_ref(line)))
        }
        Geometry::MultiLineString(lines) => lines_outcome(feature, clip_lines(boundary, lines)),
        Geometry::Polygon(rings) => {
            areal_outcome(feature, clip_polygons(boundary, std::slice::from_ref(rings)))
        }
        Geometry::MultiPolygon(polygons) => {
            areal_outcome(feature, clip_polygons(boundary, polygons))
        }
    }
}

fn lines_outcome(feature: &Feature, clip: LineClip) -> ClipOutcome {
    match clip {
        LineClip::Unchanged => ClipOutcome::Unchanged(feature.clone()),
        LineClip::Runs(mut runs) => match runs.len() {
            0 => ClipOutcome::Dropped,
            1 => ClipOutcome::Clipped(feature.with_geometry(Geometry::LineString(runs.remove(0)))),
            _ => ClipOutcome::Clipped(feature.with_geometry(Geometry::MultiLineString(runs))),
        },
    }
}

fn areal_outcome(feature: &Feature, clip: AreaClip) -> ClipOutcome {
    match clip {
        AreaClip::Unchanged => ClipOutcome::Unchanged(feature.clone()),
        AreaClip::Clipped(geometry) => ClipOutcome::Clipped(feature.with_geometry(geometry)),
        AreaClip::Outside => ClipOutcome::Dropped,
        AreaClip::Failed(err) => {
            warn!(
                error = %err,
                name = feature.property_str("name").unwrap_or_default(),
                "Keeping original polygon after intersection failure"
            );
            ClipOutcome::Fallback(feature.clone())
        }
    }
}

/// Per-run clipping counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClipStats {
    /// Features returned unchanged.
    pub unchanged: usize,
    /// Features cropped to the boundary.
    pub clipped: usize,
    /// Features kept after an intersection failure.
    pub fallback: usize,
    /// Features confirmed outside.
    pub dropped: usize,
}

impl ClipStats {
    /// Features that survived clipping.
    pub fn kept(&self) -> usize {
        self.unchanged + self.clipped + self.fallback
    }

    /// Features examined.
    pub fn processed(&self) -> usize {
        self.kept() + self.dropped
    }

    /// Records one outcome.
    pub fn record(&mut self, outcome: &ClipOutcome) {
        match outcome {
            ClipOutcome::Unchanged(_) => self.unchanged += 1,
            ClipOutcome::Clipped(_) => self.clipped += 1,
            ClipOutcome::Fallback(_) => self.fallback += 1,
            ClipOutcome::Dropped => self.dropped += 1,
        }
    }

    /// Adds another set of counters to this one.
    pub fn merge(&mut self, other: &ClipStats) {
        self.unchanged += other.unchanged;
        self.clipped += other.clipped;
        self.fallback += other.fallback;
        self.dropped += other.dropped;
    }
}

/// Clips features against one boundary, keeping running counters.
#[derive(Debug)]
pub struct Clipper<'a> {
    boundary: &'a Boundary,
    stats: ClipStats,
}

impl<'a> Clipper<'a> {
    pub fn new(boundary: &'a Boundary) -> Self {
        Self {
            boundary,
            stats: ClipStats::default(),
        }
    }

    /// Clips one feature, returning the survivor if any.
    pub fn clip(&mut self, feature: &Feature) -> Option<Feature> {
        let outcome = clip(feature, self.boundary);
        self.stats.record(&outcome);
        if !outcome.is_kept() {
            trace!(
                geometry = feature.geometry.type_name(),
                "Dropped feature outside boundary"
            );
        }
        outcome.into_feature()
    }

    /// Clips a batch, preserving input order among survivors.
    pub fn clip_all<'f>(
        &mut self,
        features: impl IntoIterator<Item = &'f Feature>,
    ) -> Vec<Feature> {
        features.into_iter().filter_map(|f| self.clip(f)).collect()
    }

    /// Counters accumulated so far.
    pub fn stats(&self) -> ClipStats {
        self.stats
    }
}
