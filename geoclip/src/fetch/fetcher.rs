//! Sequential per-job acquisition.

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::client::OverpassClient;
use super::config::FetchConfig;
use super::job::Job;
use super::progress::Progress;
use super::query::build_query;
use super::retry::{retry_with_policy, RetryOutcome, RetryPolicy};
use crate::clip::{ClipStats, Clipper};
use crate::geometry::{Boundary, Feature};
use crate::pipeline::{PipelineRun, RunError};

/// Terminal state of one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Success,
    /// Every attempt failed with a retryable error.
    Exhausted,
    /// A non-retryable error ended the job.
    Aborted,
}

/// Result of one job, before deduplication.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub state: JobState,
    pub attempts: u32,
    /// Clipped features in response order.
    pub features: Vec<Feature>,
    /// Elements that failed assembly.
    pub rejected: usize,
    pub clip: ClipStats,
}

impl JobOutcome {
    fn empty(state: JobState, attempts: u32) -> Self {
        Self {
            state,
            attempts,
            features: Vec::new(),
            rejected: 0,
            clip: ClipStats::default(),
        }
    }
}

/// Fetches jobs one at a time with retry, batching and pacing.
pub struct BatchFetcher<C: OverpassClient> {
    client: C,
    config: FetchConfig,
    policy: RetryPolicy,
}

impl<C: OverpassClient> BatchFetcher<C> {
    pub fn new(client: C, config: FetchConfig) -> Self {
        // Both drive `chunks`/`%` in the batch loop and must never be zero.
        let config = FetchConfig {
            batch_size: config.batch_size.max(1),
            yield_every_batches: config.yield_every_batches.max(1),
            ..config
        };
        let policy = config.retry_policy();
        Self {
            client,
            config,
            policy,
        }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Runs every job in order, feeding survivors into `run`.
    ///
    /// `on_progress` receives one `processing` update per job and a final
    /// `complete` update. A failed job contributes nothing; only
    /// cancellation ends the loop early.
    pub async fn run<F>(
        &self,
        run: &mut PipelineRun,
        jobs: &[Job],
        cancel: &CancellationToken,
        mut on_progress: F,
    ) -> Result<Progress, RunError>
    where
        F: FnMut(Progress),
    {
        let mut progress = Progress::new(jobs.len());
        info!(jobs = jobs.len(), "Fetch run started");

        for (index, job) in jobs.iter().enumerate() {
            if index > 0 {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(RunError::Cancelled),
                    _ = tokio::time::sleep(self.config.job_delay) => {}
                }
            }

            let outcome = self
                .fetch_job(job, run.boundary(), cancel)
                .await
                .ok_or(RunError::Cancelled)?;
            let state = outcome.state;
            let kept = run.record_job(outcome);

            progress.job_done(kept > 0);
            info!(
                job = index + 1,
                total = jobs.len(),
                layer = %job.layer_name,
                state = ?state,
                kept,
                "Job finished"
            );
            on_progress(progress);
        }

        let done = progress.completed();
        on_progress(done);
        info!(
            processed = done.processed,
            saved = done.saved,
            "Fetch run complete"
        );
        Ok(done)
    }

    /// Fetches, assembles and clips one job. `None` when cancelled.
    pub async fn fetch_job(
        &self,
        job: &Job,
        boundary: &Boundary,
        cancel: &CancellationToken,
    ) -> Option<JobOutcome> {
        let query = build_query(job, &boundary.bbox(), self.config.query_timeout_secs);
        debug!(layer = %job.layer_name, query = %query, "Querying Overpass");

        let outcome = retry_with_policy(&self.policy, cancel, |attempt| {
            trace!(layer = %job.layer_name, attempt, "Overpass attempt");
            self.client.execute(&query)
        })
        .await;

        match outcome {
            RetryOutcome::Success { value, attempts } => {
                Some(self.process_elements(job, boundary, value, attempts).await)
            }
            RetryOutcome::Exhausted {
                attempts,
                last_error,
            } => {
                warn!(
                    layer = %job.layer_name,
                    attempts,
                    error = %last_error,
                    "Job exhausted retries, continuing with no elements"
                );
                Some(JobOutcome::empty(JobState::Exhausted, attempts))
            }
            RetryOutcome::Aborted { attempts, error } => {
                warn!(layer = %job.layer_name, error = %error, "Job aborted");
                Some(JobOutcome::empty(JobState::Aborted, attempts))
            }
            RetryOutcome::Cancelled => None,
        }
    }

    /// Assembles and clips elements in fixed batches, yielding between them.
    async fn process_elements(
        &self,
        job: &Job,
        boundary: &Boundary,
        elements: Vec<Value>,
        attempts: u32,
    ) -> JobOutcome {
        let assembler = job.assembler();
        let mut clipper = Clipper::new(boundary);
        let mut features = Vec::new();
        let mut rejected = 0;

        for (batch_index, batch) in elements.chunks(self.config.batch_size).enumerate() {
            for value in batch {
                match assembler.assemble_value(value) {
                    Ok(feature) => features.extend(clipper.clip(&feature)),
                    Err(e) => {
                        rejected += 1;
                        trace!(layer = %job.layer_name, error = %e, "Element rejected");
                    }
                }
            }
            if (batch_index + 1) % self.config.yield_every_batches == 0 {
                tokio::task::yield_now().await;
            }
        }

        debug!(
            layer = %job.layer_name,
            elements = elements.len(),
            kept = features.len(),
            rejected,
            "Job elements processed"
        );

        JobOutcome {
            state: JobState::Success,
            attempts,
            features,
            rejected,
            clip: clipper.stats(),
        }
    }
}
