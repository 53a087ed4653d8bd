//! One pipeline run and its worker entry point.
//!
//! A [`PipelineRun`] owns everything that must not leak between runs: the
//! shared read-only boundary, the fingerprint index and the counters. File
//! and drawing sources call [`PipelineRun::ingest_values`] directly; the
//! Overpass source goes through [`spawn_fetch_run`], which streams
//! [`PipelineEvent`]s and ends with exactly one `Finished` or `Failed`.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

use crate::assemble::normalize_feature;
use crate::clip::{ClipStats, Clipper};
use crate::dedupe::{DedupeStats, FingerprintIndex};
use crate::fetch::{BatchFetcher, Job, JobOutcome, JobState, OverpassClient, Progress};
use crate::geometry::{Boundary, BoundaryError, Feature};

/// Run-level failures. Everything else is absorbed into counters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RunError {
    #[error("Invalid boundary: {0}")]
    Boundary(#[from] BoundaryError),

    #[error("Run cancelled")]
    Cancelled,

    #[error("Pipeline worker failed: {0}")]
    Worker(String),
}

/// Counters accumulated over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub clip: ClipStats,
    pub dedupe: DedupeStats,
    /// Elements or features that failed validation.
    pub rejected: usize,
    pub jobs_succeeded: usize,
    pub jobs_exhausted: usize,
    pub jobs_aborted: usize,
}

/// Final output of a run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub features: Vec<Feature>,
    pub stats: RunStats,
}

/// State owned by a single run.
#[derive(Debug)]
pub struct PipelineRun {
    boundary: Arc<Boundary>,
    index: FingerprintIndex,
    features: Vec<Feature>,
    stats: RunStats,
}

impl PipelineRun {
    pub fn new(boundary: Arc<Boundary>) -> Self {
        Self::with_index(boundary, FingerprintIndex::new())
    }

    /// Starts a run whose fingerprints are pre-seeded from existing features.
    pub fn seeded(
        boundary: Arc<Boundary>,
        seed: &[Feature],
        exclude_layer: Option<&str>,
    ) -> Self {
        Self::with_index(boundary, FingerprintIndex::seeded(seed, exclude_layer))
    }

    pub fn with_index(boundary: Arc<Boundary>, index: FingerprintIndex) -> Self {
        Self {
            boundary,
            index,
            features: Vec::new(),
            stats: RunStats::default(),
        }
    }

    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Features accepted so far.
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Clips then deduplicates already-validated features.
    ///
    /// Returns how many were accepted.
    pub fn process_features(&mut self, features: Vec<Feature>) -> usize {
        let mut clipper = Clipper::new(&self.boundary);
        let clipped = clipper.clip_all(&features);
        self.stats.clip.merge(&clipper.stats());
        self.accept(clipped)
    }

    /// Validates raw GeoJSON features for one layer, then clips and
    /// deduplicates them. Invalid entries are counted and skipped.
    pub fn ingest_values(
        &mut self,
        values: &[Value],
        layer_name: &str,
        domain_name: &str,
    ) -> usize {
        let mut valid = Vec::with_capacity(values.len());
        for (index, value) in values.iter().enumerate() {
            match normalize_feature(value, layer_name, domain_name) {
                Ok(feature) => valid.push(feature),
                Err(e) => {
                    self.stats.rejected += 1;
                    trace!(index, error = %e, "Feature rejected");
                }
            }
        }
        debug!(
            layer = layer_name,
            valid = valid.len(),
            rejected = values.len() - valid.len(),
            "Features validated"
        );
        self.process_features(valid)
    }

    /// Folds one fetched job into the run. Returns how many of its features
    /// survived deduplication.
    pub fn record_job(&mut self, outcome: JobOutcome) -> usize {
        match outcome.state {
            JobState::Success => self.stats.jobs_succeeded += 1,
            JobState::Exhausted => self.stats.jobs_exhausted += 1,
            JobState::Aborted => self.stats.jobs_aborted += 1,
        }
        self.stats.rejected += outcome.rejected;
        self.stats.clip.merge(&outcome.clip);
        self.accept(outcome.features)
    }

    fn accept(&mut self, clipped: Vec<Feature>) -> usize {
        let report = self.index.dedupe(clipped);
        self.stats.dedupe.merge(&report.stats);
        let kept = report.kept.len();
        self.features.extend(report.kept);
        kept
    }

    pub fn finish(self) -> RunReport {
        info!(
            features = self.features.len(),
            rejected = self.stats.rejected,
            clipped = self.stats.clip.clipped,
            dropped = self.stats.clip.dropped,
            duplicates = self.stats.dedupe.removed(),
            "Run finished"
        );
        RunReport {
            features: self.features,
            stats: self.stats,
        }
    }
}

/// Input message for a fetch worker.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Boundary as received (geometry, Feature, or JSON-encoded string).
    pub boundary: Value,
    pub jobs: Vec<Job>,
    /// Existing features to dedupe against.
    pub seed: Vec<Feature>,
    pub exclude_layer: Option<String>,
}

/// Messages streamed from a fetch worker.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    Progress(Progress),
    Finished(RunReport),
    Failed(RunError),
}

impl PipelineEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PipelineEvent::Progress(_))
    }
}

/// Parses the request, then runs every job.
pub async fn execute_fetch<C, F>(
    fetcher: &BatchFetcher<C>,
    request: FetchRequest,
    cancel: &CancellationToken,
    on_progress: F,
) -> Result<RunReport, RunError>
where
    C: OverpassClient,
    F: FnMut(Progress),
{
    let boundary = Arc::new(Boundary::from_value(&request.boundary)?);
    debug!(
        polygons = boundary.polygon_count(),
        bbox = %boundary.bbox().to_overpass(),
        "Boundary loaded"
    );

    let mut run =
        PipelineRun::seeded(boundary, &request.seed, request.exclude_layer.as_deref());
    fetcher
        .run(&mut run, &request.jobs, cancel, on_progress)
        .await?;
    Ok(run.finish())
}

/// Spawns a fetch worker.
///
/// The receiver yields progress events followed by exactly one terminal
/// event. A panic inside the worker surfaces as [`RunError::Worker`].
pub fn spawn_fetch_run<C>(
    fetcher: BatchFetcher<C>,
    request: FetchRequest,
    cancel: CancellationToken,
) -> (mpsc::UnboundedReceiver<PipelineEvent>, JoinHandle<()>)
where
    C: OverpassClient + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();

    let handle = tokio::spawn(async move {
        let progress_tx = tx.clone();
        let worker = tokio::spawn(async move {
            execute_fetch(&fetcher, request, &cancel, |progress| {
                // A dropped receiver only means nobody is watching.
                let _ = progress_tx.send(PipelineEvent::Progress(progress));
            })
            .await
        });

        let event = match worker.await {
            Ok(Ok(report)) => PipelineEvent::Finished(report),
            Ok(Err(e)) => {
                error!(error = %e, "Fetch run failed");
                PipelineEvent::Failed(e)
            }
            Err(join_error) => {
                error!(error = %join_error, "Fetch worker panicked");
                PipelineEvent::Failed(RunError::Worker(join_error.to_string()))
            }
        };
        let _ = tx.send(event);
    });

    (rx, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Geometry, Position};
    use serde_json::json;

    fn square() -> Arc<Boundary> {
        let value = json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0], [0.0, 0.0]]]
        });
        Arc::new(Boundary::from_value(&value).unwrap())
    }

    fn point_value(lon: f64, lat: f64) -> Value {
        json!({
            "type": "Feature",
            "geometry": {"type": "Point", "coordinates": [lon, lat]},
            "properties": {}
        })
    }

    #[test]
    fn test_ingest_values_validates_clips_and_dedupes() {
        let mut run = PipelineRun::new(square());
        let values = vec![
            point_value(1.0, 1.0),
            point_value(1.0000001, 1.0000001),
            point_value(9.0, 9.0),
            json!({"type": "Feature", "geometry": null}),
            json!({
                "type": "Feature",
                "geometry": {
                    "type": "LineString",
                    "coordinates": [[-1, 2], [2, 2], [2, 5], [5, 5]]
                },
                "properties": {"name": "Scenario"}
            }),
        ];

        let kept = run.ingest_values(&values, "Layer", "Domain");
        assert_eq!(kept, 2);

        let report = run.finish();
        assert_eq!(report.stats.rejected, 1);
        assert_eq!(report.stats.clip.dropped, 1);
        assert_eq!(report.stats.clip.clipped, 1);
        assert_eq!(report.stats.dedupe.coord_duplicates, 1);
        assert_eq!(report.features.len(), 2);
        assert_eq!(report.features[0].layer_name(), Some("Layer"));
        assert!(report.features[1].geometry.is_lineal());
    }

    #[test]
    fn test_seeded_run_skips_existing_features() {
        let existing = vec![
            Feature::new(Geometry::Point(Position::new(2.0, 2.0).unwrap()))
                .with_property("layer_name", "Other"),
        ];
        let mut run = PipelineRun::seeded(square(), &existing, Some("Mine"));
        assert_eq!(run.ingest_values(&[point_value(2.0, 2.0)], "Mine", "D"), 0);

        let mut reimport = PipelineRun::seeded(square(), &existing, Some("Other"));
        assert_eq!(
            reimport.ingest_values(&[point_value(2.0, 2.0)], "Other", "D"),
            1
        );
    }

    #[test]
    fn test_record_job_counts_states() {
        let mut run = PipelineRun::new(square());
        let outcome = JobOutcome {
            state: JobState::Exhausted,
            attempts: 3,
            features: Vec::new(),
            rejected: 0,
            clip: ClipStats::default(),
        };
        assert_eq!(run.record_job(outcome), 0);
        assert_eq!(run.stats().jobs_exhausted, 1);
    }

    #[test]
    fn test_terminal_events() {
        assert!(!PipelineEvent::Progress(Progress::new(1)).is_terminal());
        assert!(PipelineEvent::Failed(RunError::Cancelled).is_terminal());
    }
}
