//! Tests for the fingerprint index.

use super::*;
use crate::geometry::{Feature, Geometry, Position};

fn pos(lon: f64, lat: f64) -> Position {
    Position::new(lon, lat).unwrap()
}

fn point(lon: f64, lat: f64) -> Feature {
    Feature::new(Geometry::Point(pos(lon, lat)))
}

fn line(coords: &[[f64; 2]]) -> Feature {
    Feature::new(Geometry::LineString(
        coords.iter().map(|[lon, lat]| pos(*lon, *lat)).collect(),
    ))
}

#[test]
fn test_near_identical_points_dedupe_to_one() {
    let mut index = FingerprintIndex::new();
    let report = index.dedupe(vec![point(10.0, 20.0), point(10.0000001, 20.0000001)]);

    assert_eq!(report.kept.len(), 1);
    assert_eq!(report.kept[0], point(10.0, 20.0));
    assert_eq!(report.stats.coord_duplicates, 1);
    assert_eq!(report.stats.geom_duplicates, 0);
}

#[test]
fn test_first_occurrence_wins_and_order_is_stable() {
    let a = point(1.0, 1.0).with_property("name", "a");
    let b = point(2.0, 2.0).with_property("name", "b");
    let a_again = point(1.0, 1.0).with_property("name", "a2");
    let c = point(3.0, 3.0).with_property("name", "c");

    let mut index = FingerprintIndex::new();
    let report = index.dedupe(vec![a.clone(), b.clone(), a_again, c.clone()]);
    assert_eq!(report.kept, vec![a, b, c]);
}

#[test]
fn test_coord_check_precedes_geom_check() {
    let seed = vec![line(&[[0.0, 0.0], [1.0, 1.0]])];
    let mut index = FingerprintIndex::seeded(&seed, None);

    // An exact repeat matches both keys and is reported by the first check.
    assert_eq!(
        index.check(&line(&[[0.0, 0.0], [1.0, 1.0]])),
        Verdict::CoordDuplicate
    );
    // The same shape drawn in reverse starts elsewhere and is distinct.
    assert_eq!(index.check(&line(&[[1.0, 1.0], [0.0, 0.0]])), Verdict::Kept);
}

#[test]
fn test_shared_start_vertex_is_a_coord_duplicate() {
    let mut index = FingerprintIndex::new();
    let report = index.dedupe(vec![
        line(&[[0.0, 0.0], [1.0, 1.0]]),
        line(&[[0.0, 0.0], [2.0, 5.0]]),
    ]);
    assert_eq!(report.kept.len(), 1);
    assert_eq!(report.stats.coord_duplicates, 1);
}

#[test]
fn test_seed_excludes_current_layer() {
    let seed = vec![
        point(1.0, 1.0).with_property("layer_name", "Roads"),
        point(2.0, 2.0).with_property("layer_name", "Rivers"),
    ];
    let mut index = FingerprintIndex::seeded(&seed, Some("Roads"));

    assert_eq!(index.coord_key_count(), 1);
    assert_eq!(index.check(&point(1.0, 1.0)), Verdict::Kept);
    assert_eq!(index.check(&point(2.0, 2.0)), Verdict::CoordDuplicate);
}

#[test]
fn test_seed_without_exclusion_keeps_all_layers() {
    let seed = vec![point(1.0, 1.0).with_property("layer_name", "Roads")];
    let index = FingerprintIndex::seeded(&seed, None);
    assert_eq!(index.coord_key_count(), 1);
    assert_eq!(index.geom_key_count(), 1);
}

#[test]
fn test_unfingerprinted_feature_is_kept_and_counted() {
    let mut index = FingerprintIndex::new();
    let empty = Feature::new(Geometry::MultiLineString(Vec::new()));
    let report = index.dedupe(vec![empty.clone(), empty]);

    assert_eq!(report.kept.len(), 2);
    assert_eq!(report.stats.unfingerprinted, 2);
    assert!(index.is_empty());
}

#[test]
fn test_count_conservation() {
    let candidates = vec![
        point(1.0, 1.0),
        point(1.0, 1.0),
        line(&[[0.0, 0.0], [1.0, 0.0]]),
        line(&[[0.0, 0.0], [1.0, 0.0]]),
        point(4.0, 4.0),
        Feature::new(Geometry::LineString(Vec::new())),
    ];
    let total = candidates.len();

    let mut index = FingerprintIndex::new();
    let report = index.dedupe(candidates);
    let stats = report.stats;

    assert_eq!(
        total,
        report.kept.len() + stats.coord_duplicates + stats.geom_duplicates
    );
    assert_eq!(stats.processed(), total);
    assert_eq!(stats.kept, report.kept.len());
}

#[test]
fn test_index_persists_across_batches() {
    let mut index = FingerprintIndex::new();
    let first = index.dedupe(vec![point(7.0, 7.0)]);
    let second = index.dedupe(vec![point(7.0, 7.0), point(8.0, 8.0)]);

    assert_eq!(first.kept.len(), 1);
    assert_eq!(second.kept.len(), 1);

    let mut total = first.stats;
    total.merge(&second.stats);
    assert_eq!(total.kept, 2);
    assert_eq!(total.coord_duplicates, 1);
}
