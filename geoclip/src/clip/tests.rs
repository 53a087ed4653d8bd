//! Clipper behaviour against simple and concave boundaries.

use super::*;
use crate::geometry::Position;
use serde_json::json;

fn p(lon: f64, lat: f64) -> Position {
    Position::new(lon, lat).unwrap()
}

fn path(coords: &[[f64; 2]]) -> Vec<Position> {
    coords.iter().map(|c| p(c[0], c[1])).collect()
}

/// Square [0,4] x [0,4].
fn square() -> Boundary {
    Boundary::from_value(&json!({
        "type": "Polygon",
        "coordinates": [[[0, 0], [4, 0], [4, 4], [0, 4], [0, 0]]]
    }))
    .unwrap()
}

/// U shape: a square [0,6] x [0,6] with a notch [2,4] x [2,6] cut from the top.
fn u_shape() -> Boundary {
    Boundary::from_value(&json!({
        "type": "Polygon",
        "coordinates": [[[0, 0], [6, 0], [6, 6], [4, 6], [4, 2], [2, 2], [2, 6], [0, 6], [0, 0]]]
    }))
    .unwrap()
}

fn line(coords: &[[f64; 2]]) -> Feature {
    Feature::new(Geometry::LineString(path(coords))).with_property("name", "test")
}

fn polygon(coords: &[[f64; 2]]) -> Feature {
    Feature::new(Geometry::Polygon(vec![path(coords)]))
}

/// Compares geometry structure exactly and coordinates within a small tolerance.
fn assert_geometry_approx(actual: &Geometry, expected: &Geometry) {
    assert_eq!(actual.type_name(), expected.type_name(), "{:?}", actual);
    assert_eq!(part_lengths(actual), part_lengths(expected), "{:?}", actual);
    for (a, e) in actual.positions().zip(expected.positions()) {
        assert!(a.approx_eq(e, 1e-9), "{:?} != {:?} in {:?}", a, e, actual);
    }
}

fn part_lengths(geometry: &Geometry) -> Vec<usize> {
    match geometry {
        Geometry::Point(_) => vec![1],
        Geometry::LineString(line) => vec![line.len()],
        Geometry::MultiLineString(lines) => lines.iter().map(Vec::len).collect(),
        Geometry::Polygon(rings) => rings.iter().map(Vec::len).collect(),
        Geometry::MultiPolygon(polys) => polys.iter().flatten().map(Vec::len).collect(),
    }
}

fn assert_within_square(feature: &Feature) {
    const TOL: f64 = 1e-9;
    for pos in feature.geometry.positions() {
        assert!(
            (-TOL..=4.0 + TOL).contains(&pos.lon) && (-TOL..=4.0 + TOL).contains(&pos.lat),
            "{:?} escapes the boundary",
            pos
        );
    }
}

#[test]
fn test_line_entering_and_leaving_keeps_contained_run() {
    // Enters through the left edge, exits through the top edge; the tail is dropped.
    let feature = line(&[[-1.0, 2.0], [2.0, 2.0], [2.0, 5.0], [5.0, 5.0]]);

    let outcome = clip(&feature, &square());

    let clipped = match outcome {
        ClipOutcome::Clipped(f) => f,
        other => panic!("expected a clipped line, got {:?}", other),
    };
    assert_geometry_approx(
        &clipped.geometry,
        &Geometry::LineString(path(&[[0.0, 2.0], [2.0, 2.0], [2.0, 4.0]])),
    );
    assert_eq!(clipped.property_str("name"), Some("test"));
}

#[test]
fn test_line_fully_inside_is_unchanged() {
    let feature = line(&[[1.0, 1.0], [2.0, 3.0], [3.0, 1.5]]);
    assert_eq!(clip(&feature, &square()), ClipOutcome::Unchanged(feature));
}

#[test]
fn test_line_touching_boundary_keeps_its_coordinates() {
    // Touches the right edge at a vertex but never leaves.
    let feature = line(&[[1.0, 1.0], [4.0, 2.0], [1.0, 3.0]]);
    let kept = clip(&feature, &square()).into_feature().unwrap();
    assert_eq!(kept.geometry, feature.geometry);
}

#[test]
fn test_line_passing_through_keeps_middle() {
    let feature = line(&[[-1.0, 2.0], [5.0, 2.0]]);
    let kept = clip(&feature, &square()).into_feature().unwrap();
    assert_geometry_approx(
        &kept.geometry,
        &Geometry::LineString(path(&[[0.0, 2.0], [4.0, 2.0]])),
    );
}

#[test]
fn test_line_outside_is_dropped() {
    let feature = line(&[[5.0, 5.0], [6.0, 7.0]]);
    assert_eq!(clip(&feature, &square()), ClipOutcome::Dropped);
}

#[test]
fn test_line_grazing_corner_from_outside_is_dropped() {
    let feature = line(&[[-1.0, 5.0], [0.0, 4.0], [-1.0, 3.0]]);
    assert_eq!(clip(&feature, &square()), ClipOutcome::Dropped);
}

#[test]
fn test_inside_to_inside_across_notch_splits() {
    let feature = line(&[[1.0, 4.0], [5.0, 4.0]]);

    let kept = clip(&feature, &u_shape()).into_feature().unwrap();

    assert_geometry_approx(
        &kept.geometry,
        &Geometry::MultiLineString(vec![
            path(&[[1.0, 4.0], [2.0, 4.0]]),
            path(&[[4.0, 4.0], [5.0, 4.0]]),
        ]),
    );
}

#[test]
fn test_multilinestring_concatenates_runs() {
    let feature = Feature::new(Geometry::MultiLineString(vec![
        path(&[[-1.0, 1.0], [1.0, 1.0]]),
        path(&[[9.0, 9.0], [10.0, 10.0]]),
        path(&[[3.0, 3.0], [5.0, 3.0]]),
    ]));

    let kept = clip(&feature, &square()).into_feature().unwrap();

    assert_geometry_approx(
        &kept.geometry,
        &Geometry::MultiLineString(vec![
            path(&[[0.0, 1.0], [1.0, 1.0]]),
            path(&[[3.0, 3.0], [4.0, 3.0]]),
        ]),
    );
}

#[test]
fn test_multilinestring_single_survivor_becomes_linestring() {
    let feature = Feature::new(Geometry::MultiLineString(vec![
        path(&[[1.0, 1.0], [2.0, 2.0]]),
        path(&[[8.0, 8.0], [9.0, 9.0]]),
    ]));

    let kept = clip(&feature, &square()).into_feature().unwrap();

    assert_geometry_approx(
        &kept.geometry,
        &Geometry::LineString(path(&[[1.0, 1.0], [2.0, 2.0]])),
    );
}

#[test]
fn test_clipped_lines_stay_inside() {
    let boundary = square();
    let lines = [
        line(&[[-2.0, -2.0], [6.0, 6.0]]),
        line(&[[-1.0, 3.9], [5.0, 0.1], [2.0, -3.0], [2.0, 7.0]]),
        line(&[[0.5, -1.0], [0.5, 5.0], [3.5, 5.0], [3.5, -1.0]]),
        line(&[[-3.0, 1.0], [1.0, 2.0], [7.0, 3.0]]),
    ];

    for feature in &lines {
        if let Some(kept) = clip(feature, &boundary).into_feature() {
            assert_within_square(&kept);
        }
    }
}

#[test]
fn test_zigzag_produces_one_run_per_visit() {
    // Enters and exits through the bottom edge twice.
    let feature = line(&[[0.5, -1.0], [0.5, 5.0], [3.5, 5.0], [3.5, -1.0]]);
    let kept = clip(&feature, &square()).into_feature().unwrap();
    assert_geometry_approx(
        &kept.geometry,
        &Geometry::MultiLineString(vec![
            path(&[[0.5, 0.0], [0.5, 4.0]]),
            path(&[[3.5, 4.0], [3.5, 0.0]]),
        ]),
    );
}

#[test]
fn test_point_inside_and_on_edge_kept() {
    let boundary = square();
    let inside = Feature::new(Geometry::Point(p(2.0, 2.0)));
    let on_edge = Feature::new(Geometry::Point(p(0.0, 2.0)));
    let outside = Feature::new(Geometry::Point(p(-0.1, 2.0)));

    assert_eq!(clip(&inside, &boundary), ClipOutcome::Unchanged(inside.clone()));
    assert!(clip(&on_edge, &boundary).is_kept());
    assert_eq!(clip(&outside, &boundary), ClipOutcome::Dropped);
}

#[test]
fn test_polygon_inside_is_unchanged() {
    let feature = polygon(&[[1.0, 1.0], [2.0, 1.0], [2.0, 2.0], [1.0, 2.0], [1.0, 1.0]]);
    assert_eq!(clip(&feature, &square()), ClipOutcome::Unchanged(feature));
}

#[test]
fn test_polygon_sharing_boundary_edges_is_unchanged() {
    let feature = polygon(&[[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0], [0.0, 0.0]]);
    assert_eq!(clip(&feature, &square()), ClipOutcome::Unchanged(feature));
}

#[test]
fn test_polygon_filling_notch_is_dropped() {
    // Every vertex lies on the boundary but the interior is outside it.
    let feature = polygon(&[[2.0, 2.0], [4.0, 2.0], [4.0, 6.0], [2.0, 6.0], [2.0, 2.0]]);
    assert_eq!(clip(&feature, &u_shape()), ClipOutcome::Dropped);
}

/// Two adjacent districts [0,2] x [0,2] and [2,4] x [0,2] sharing the edge x = 2.
fn districts() -> Boundary {
    let district = |x0: f64, x1: f64| {
        json!({
            "type": "Feature",
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[x0, 0.0], [x1, 0.0], [x1, 2.0], [x0, 2.0], [x0, 0.0]]]
            },
            "properties": {}
        })
    };
    Boundary::from_value(&json!({
        "type": "FeatureCollection",
        "features": [district(0.0, 2.0), district(2.0, 4.0)]
    }))
    .unwrap()
}

#[test]
fn test_polygon_across_shared_district_edge_is_unchanged() {
    let feature = polygon(&[[1.0, 0.5], [3.0, 0.5], [3.0, 1.5], [1.0, 1.5], [1.0, 0.5]]);
    assert_eq!(clip(&feature, &districts()), ClipOutcome::Unchanged(feature));
}

#[test]
fn test_shared_district_edge_counts_as_inside() {
    let boundary = districts();
    let on_shared_edge = Feature::new(Geometry::Point(p(2.0, 1.0)));
    let straddling = polygon(&[[2.0, 0.5], [3.0, 0.5], [3.0, 1.5], [2.0, 1.5], [2.0, 0.5]]);
    let crossing = line(&[[1.0, 1.0], [3.0, 1.0]]);

    assert!(boundary.contains(p(2.0, 1.0)));
    assert!(boundary.contains(p(2.0, 0.0)));
    assert_eq!(
        clip(&on_shared_edge, &boundary),
        ClipOutcome::Unchanged(on_shared_edge.clone())
    );
    assert_eq!(clip(&straddling, &boundary), ClipOutcome::Unchanged(straddling));
    assert_eq!(clip(&crossing, &boundary), ClipOutcome::Unchanged(crossing));
}

#[test]
fn test_polygon_leaving_districts_is_still_clipped() {
    let feature = polygon(&[[1.0, 1.0], [3.0, 1.0], [3.0, 3.0], [1.0, 3.0], [1.0, 1.0]]);

    let clipped = match clip(&feature, &districts()) {
        ClipOutcome::Clipped(f) => f,
        other => panic!("expected clipped polygon, got {:?}", other),
    };

    let max_lat = clipped
        .geometry
        .positions()
        .map(|p| p.lat)
        .fold(f64::NEG_INFINITY, f64::max);
    assert!((max_lat - 2.0).abs() < 1e-9, "{:?}", clipped.geometry);
}

#[test]
fn test_failed_intersection_keeps_original() {
    let feature = polygon(&[[2.0, 2.0], [6.0, 2.0], [6.0, 6.0], [2.0, 6.0], [2.0, 2.0]])
        .with_property("name", "Harbour");

    let result = super::polygon::guarded(|| -> geo::MultiPolygon<f64> {
        panic!("sweep line out of order")
    });
    let err = match result {
        Err(err) => err,
        Ok(_) => panic!("panic should surface as an error"),
    };
    assert_eq!(err.0, "sweep line out of order");

    let outcome = super::areal_outcome(&feature, super::polygon::AreaClip::Failed(err));
    assert_eq!(outcome, ClipOutcome::Fallback(feature.clone()));

    let mut stats = ClipStats::default();
    stats.record(&outcome);
    assert_eq!(stats.fallback, 1);
    assert_eq!(stats.kept(), 1);
    assert_eq!(stats.dropped, 0);
}

#[test]
fn test_guarded_passes_result_through() {
    let value = super::polygon::guarded(|| 42).unwrap();
    assert_eq!(value, 42);
}

#[test]
fn test_polygon_overlapping_is_intersected() {
    let feature = polygon(&[[2.0, 2.0], [6.0, 2.0], [6.0, 6.0], [2.0, 6.0], [2.0, 2.0]]);

    let clipped = match clip(&feature, &square()) {
        ClipOutcome::Clipped(f) => f,
        other => panic!("expected clipped polygon, got {:?}", other),
    };

    assert!(matches!(clipped.geometry, Geometry::Polygon(_)));
    assert_within_square(&clipped);
    let min_lon = clipped
        .geometry
        .positions()
        .map(|p| p.lon)
        .fold(f64::INFINITY, f64::min);
    assert!((min_lon - 2.0).abs() < 1e-9);
}

#[test]
fn test_polygon_outside_is_dropped() {
    let feature = polygon(&[[5.0, 5.0], [6.0, 5.0], [6.0, 6.0], [5.0, 6.0], [5.0, 5.0]]);
    assert_eq!(clip(&feature, &square()), ClipOutcome::Dropped);
}

#[test]
fn test_polygon_spanning_notch_becomes_multipolygon() {
    let feature = polygon(&[[1.0, 3.0], [5.0, 3.0], [5.0, 5.0], [1.0, 5.0], [1.0, 3.0]]);

    let kept = clip(&feature, &u_shape()).into_feature().unwrap();

    match kept.geometry {
        Geometry::MultiPolygon(parts) => assert_eq!(parts.len(), 2),
        other => panic!("expected two parts, got {:?}", other),
    }
}

#[test]
fn test_polygon_enclosing_boundary_hole_is_clipped() {
    let boundary = Boundary::from_value(&json!({
        "type": "Polygon",
        "coordinates": [
            [[0, 0], [10, 0], [10, 10], [0, 10], [0, 0]],
            [[4, 4], [6, 4], [6, 6], [4, 6], [4, 4]]
        ]
    }))
    .unwrap();
    let feature = polygon(&[[3.0, 3.0], [7.0, 3.0], [7.0, 7.0], [3.0, 7.0], [3.0, 3.0]]);

    match clip(&feature, &boundary) {
        ClipOutcome::Clipped(f) => match f.geometry {
            Geometry::Polygon(rings) => assert_eq!(rings.len(), 2, "hole should be carved out"),
            other => panic!("expected polygon with hole, got {:?}", other),
        },
        other => panic!("expected clipped polygon, got {:?}", other),
    }
}

#[test]
fn test_clipper_counts_are_conserved() {
    let boundary = square();
    let features = vec![
        line(&[[1.0, 1.0], [2.0, 2.0]]),
        line(&[[-1.0, 2.0], [5.0, 2.0]]),
        line(&[[5.0, 5.0], [6.0, 6.0]]),
        Feature::new(Geometry::Point(p(3.0, 3.0))),
        Feature::new(Geometry::Point(p(30.0, 3.0))),
    ];

    let mut clipper = Clipper::new(&boundary);
    let kept = clipper.clip_all(&features);
    let stats = clipper.stats();

    assert_eq!(kept.len(), 3);
    assert_eq!(stats.kept(), kept.len());
    assert_eq!(stats.kept() + stats.dropped, features.len());
    assert_eq!(stats.unchanged, 2);
    assert_eq!(stats.clipped, 1);
    assert_eq!(stats.dropped, 2);
}
