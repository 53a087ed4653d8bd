//! Resilient Overpass acquisition
//!
//! A [`BatchFetcher`] runs [`Job`]s strictly one at a time:
//!
//! ```text
//! Job ──► build_query ──► retry_with_policy(client.execute)
//!                              │
//!             ┌────────────────┴──────────────┐
//!          Success                    Exhausted / Aborted
//!             │                               │
//!   batches of 25: assemble → clip       no elements
//!             │                               │
//!             └───────► PipelineRun (dedupe) ◄┘
//!                              │
//!                     Progress, then 1 s pause
//! ```
//!
//! A job that fails never fails the run. The Overpass service sits behind the
//! [`OverpassClient`] trait so tests can script responses.

mod client;
mod config;
mod error;
mod fetcher;
mod job;
mod progress;
mod query;
mod retry;

pub use client::{
    parse_response, OverpassClient, ReqwestOverpassClient, DEFAULT_ENDPOINT,
    DEFAULT_REQUEST_TIMEOUT,
};
pub use config::{
    FetchConfig, DEFAULT_BATCH_SIZE, DEFAULT_JOB_DELAY, DEFAULT_YIELD_EVERY_BATCHES,
};
pub use error::FetchError;
pub use fetcher::{BatchFetcher, JobOutcome, JobState};
pub use job::{Job, TagFilter, TagValue};
pub use progress::{Progress, ProgressStatus};
pub use query::{build_query, DEFAULT_QUERY_TIMEOUT_SECS};
pub use retry::{
    retry_with_policy, Backoff, FailureClass, RetryOutcome, RetryPolicy, DEFAULT_MAX_ATTEMPTS,
};
