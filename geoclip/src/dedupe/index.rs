//! Fingerprint sets owned by one pipeline run.

use std::collections::HashSet;

use tracing::debug;

use super::fingerprint::{CoordKey, GeomKey};
use crate::geometry::Feature;

/// Why a candidate was removed, if it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// New feature; its keys were recorded.
    Kept,
    /// Kept without keys because no coordinates could be extracted.
    Unfingerprinted,
    CoordDuplicate,
    GeomDuplicate,
}

/// Running dedupe counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DedupeStats {
    pub kept: usize,
    pub coord_duplicates: usize,
    pub geom_duplicates: usize,
    /// Subset of `kept` that carried no fingerprint.
    pub unfingerprinted: usize,
}

impl DedupeStats {
    pub fn record(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Kept => self.kept += 1,
            Verdict::Unfingerprinted => {
                self.kept += 1;
                self.unfingerprinted += 1;
            }
            Verdict::CoordDuplicate => self.coord_duplicates += 1,
            Verdict::GeomDuplicate => self.geom_duplicates += 1,
        }
    }

    pub fn removed(&self) -> usize {
        self.coord_duplicates + self.geom_duplicates
    }

    /// Every candidate seen.
    pub fn processed(&self) -> usize {
        self.kept + self.removed()
    }

    pub fn merge(&mut self, other: &DedupeStats) {
        self.kept += other.kept;
        self.coord_duplicates += other.coord_duplicates;
        self.geom_duplicates += other.geom_duplicates;
        self.unfingerprinted += other.unfingerprinted;
    }
}

/// Result of deduplicating one candidate batch.
#[derive(Debug, Clone, Default)]
pub struct DedupeReport {
    /// Surviving candidates, in input order.
    pub kept: Vec<Feature>,
    pub stats: DedupeStats,
}

/// Coordinate and geometry fingerprint sets.
///
/// Sets only grow. First occurrence wins.
#[derive(Debug, Clone, Default)]
pub struct FingerprintIndex {
    coords: HashSet<CoordKey>,
    geoms: HashSet<GeomKey>,
}

impl FingerprintIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the index from existing features.
    ///
    /// Features whose `layer_name` equals `exclude_layer` are skipped, so a
    /// layer being re-imported does not dedupe against its own old contents.
    pub fn seeded<'a>(
        seed: impl IntoIterator<Item = &'a Feature>,
        exclude_layer: Option<&str>,
    ) -> Self {
        let mut index = Self::new();
        let mut excluded = 0usize;
        for feature in seed {
            if exclude_layer.is_some() && feature.layer_name() == exclude_layer {
                excluded += 1;
                continue;
            }
            index.insert(feature);
        }
        debug!(
            coord_keys = index.coords.len(),
            geom_keys = index.geoms.len(),
            excluded,
            "Fingerprint index seeded"
        );
        index
    }

    /// Records a feature's keys without checking for duplicates.
    pub fn insert(&mut self, feature: &Feature) {
        if let Some(key) = CoordKey::of(&feature.geometry) {
            self.coords.insert(key);
        }
        if let Some(key) = GeomKey::of(&feature.geometry) {
            self.geoms.insert(key);
        }
    }

    /// Checks one candidate and records its keys when it is new.
    pub fn check(&mut self, feature: &Feature) -> Verdict {
        let coord = CoordKey::of(&feature.geometry);
        if coord.as_ref().is_some_and(|k| self.coords.contains(k)) {
            return Verdict::CoordDuplicate;
        }
        let geom = GeomKey::of(&feature.geometry);
        if geom.as_ref().is_some_and(|k| self.geoms.contains(k)) {
            return Verdict::GeomDuplicate;
        }
        match (coord, geom) {
            (None, None) => Verdict::Unfingerprinted,
            (coord, geom) => {
                if let Some(key) = coord {
                    self.coords.insert(key);
                }
                if let Some(key) = geom {
                    self.geoms.insert(key);
                }
                Verdict::Kept
            }
        }
    }

    /// Removes candidates already represented in the index.
    pub fn dedupe(&mut self, candidates: Vec<Feature>) -> DedupeReport {
        let mut report = DedupeReport::default();
        for feature in candidates {
            let verdict = self.check(&feature);
            report.stats.record(verdict);
            if matches!(verdict, Verdict::Kept | Verdict::Unfingerprinted) {
                report.kept.push(feature);
            }
        }
        report
    }

    pub fn coord_key_count(&self) -> usize {
        self.coords.len()
    }

    pub fn geom_key_count(&self) -> usize {
        self.geoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty() && self.geoms.is_empty()
    }
}
