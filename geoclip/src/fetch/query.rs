//! Overpass QL query construction.

use super::job::Job;
use crate::geometry::BoundingBox;

/// Default server-side query timeout in seconds.
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 25;

/// Builds the full query for one job over a bounding box.
///
/// `[out:json][timeout:<secs>];(<stmts>);out geom;`
pub fn build_query(job: &Job, bbox: &BoundingBox, timeout_secs: u64) -> String {
    let element_types: &[&str] = if job.family().excludes_nodes() {
        &["way", "relation"]
    } else {
        &["node", "way", "relation"]
    };

    let clauses = job.clauses();
    let area = bbox.to_overpass();
    let statements: String = element_types
        .iter()
        .map(|t| format!("{}{}({});", t, clauses, area))
        .collect();

    format!(
        "[out:json][timeout:{}];({});out geom;",
        timeout_secs, statements
    )
}
