//! Common input helpers and output shared across CLI commands.

use std::path::Path;

use geoclip::fetch::Job;
use geoclip::geometry::Feature;
use geoclip::pipeline::RunStats;
use serde_json::Value;

use crate::error::CliError;

/// Read and parse a JSON file.
pub fn read_json(path: &Path) -> Result<Value, CliError> {
    let text = std::fs::read_to_string(path).map_err(|e| CliError::FileRead {
        path: path.to_path_buf(),
        error: e,
    })?;
    serde_json::from_str(&text).map_err(|e| CliError::invalid_input(path, e))
}

/// Read a job list: a JSON array of `{tagFilter, layerName, domainName}`.
pub fn read_jobs(path: &Path) -> Result<Vec<Job>, CliError> {
    let value = read_json(path)?;
    let jobs: Vec<Job> =
        serde_json::from_value(value).map_err(|e| CliError::invalid_input(path, e))?;
    if jobs.is_empty() {
        return Err(CliError::invalid_input(path, "job list is empty"));
    }
    Ok(jobs)
}

/// Read already-known features used to seed deduplication.
///
/// Entries that are not valid features are skipped.
pub fn read_seed(path: Option<&Path>) -> Result<Vec<Feature>, CliError> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let value = read_json(path)?;
    let values = feature_values(value)
        .ok_or_else(|| CliError::invalid_input(path, "expected a FeatureCollection"))?;

    let total = values.len();
    let seed: Vec<Feature> = values
        .into_iter()
        .filter_map(|v| serde_json::from_value(v).ok())
        .collect();
    if seed.len() < total {
        tracing::warn!(
            path = %path.display(),
            skipped = total - seed.len(),
            "Seed entries skipped"
        );
    }
    Ok(seed)
}

/// Raw feature values from a FeatureCollection, a bare array or one Feature.
pub fn feature_values(value: Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(values) => Some(values),
        Value::Object(mut obj) => {
            let kind = obj.get("type").and_then(Value::as_str).unwrap_or_default();
            match kind {
                "FeatureCollection" => match obj.remove("features") {
                    Some(Value::Array(values)) => Some(values),
                    _ => None,
                },
                "Feature" => Some(vec![Value::Object(obj)]),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Print the counters of a finished run.
pub fn print_summary(features: usize, stats: &RunStats) {
    println!();
    println!("Features: {}", features);
    println!(
        "  Clip: {} unchanged, {} clipped, {} fallback, {} dropped",
        stats.clip.unchanged, stats.clip.clipped, stats.clip.fallback, stats.clip.dropped
    );
    println!(
        "  Dedupe: {} kept, {} coordinate duplicates, {} geometry duplicates",
        stats.dedupe.kept, stats.dedupe.coord_duplicates, stats.dedupe.geom_duplicates
    );
    if stats.rejected > 0 {
        println!("  Rejected: {}", stats.rejected);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoclip::geometry::{FeatureCollection, Geometry, Position};
    use serde_json::json;
    use tempfile::TempDir;

    fn write_collection(path: &Path, features: Vec<Feature>) {
        let json = serde_json::to_string(&FeatureCollection::from(features)).unwrap();
        std::fs::write(path, json).unwrap();
    }

    fn point(lon: f64, lat: f64) -> Feature {
        Feature::new(Geometry::Point(Position::new(lon, lat).unwrap()))
    }

    #[test]
    fn test_feature_values_accepts_three_shapes() {
        let feature = json!({"type": "Feature", "geometry": null, "properties": {}});
        let collection = json!({"type": "FeatureCollection", "features": [feature.clone()]});

        assert_eq!(feature_values(collection).map(|v| v.len()), Some(1));
        assert_eq!(feature_values(json!([1, 2, 3])).map(|v| v.len()), Some(3));
        assert_eq!(feature_values(feature).map(|v| v.len()), Some(1));
        assert!(feature_values(json!({"type": "Point", "coordinates": [0, 0]})).is_none());
        assert!(feature_values(json!("text")).is_none());
    }

    #[test]
    fn test_read_jobs() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("jobs.json");
        std::fs::write(
            &path,
            r#"[{"tagFilter": {"amenity": "cafe"}, "layerName": "Cafes", "domainName": "Food"}]"#,
        )
        .unwrap();

        let jobs = read_jobs(&path).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].layer_name, "Cafes");
    }

    #[test]
    fn test_read_jobs_rejects_empty_list() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("jobs.json");
        std::fs::write(&path, "[]").unwrap();

        assert!(matches!(
            read_jobs(&path),
            Err(CliError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_read_json_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = read_json(&temp.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, CliError::FileRead { .. }));
    }

    #[test]
    fn test_read_seed_skips_invalid_entries() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("seed.json");
        write_collection(&path, vec![point(10.0, 20.0), point(11.0, 21.0)]);

        assert_eq!(read_seed(Some(&path)).unwrap().len(), 2);
        assert!(read_seed(None).unwrap().is_empty());

        std::fs::write(
            &path,
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [500, 0]}},
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [1, 2]}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(read_seed(Some(&path)).unwrap().len(), 1);
    }
}
