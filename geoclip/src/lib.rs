//! geoclip - boundary clipping and resilient Overpass acquisition
//!
//! This library clips geographic features against a polygon boundary,
//! removes duplicates across large feature sets, and pulls per-topic data
//! from the Overpass API without tripping its rate limits.
//!
//! # High-Level API
//!
//! File and drawing sources go straight through a [`pipeline::PipelineRun`]:
//!
//! ```ignore
//! use std::sync::Arc;
//! use geoclip::geometry::Boundary;
//! use geoclip::pipeline::PipelineRun;
//!
//! let boundary = Arc::new(Boundary::parse_str(&boundary_json)?);
//! let mut run = PipelineRun::seeded(boundary, &existing, Some("Roads"));
//! run.ingest_values(&raw_features, "Roads", "Transport");
//! let report = run.finish();
//! ```
//!
//! Overpass acquisition runs on a worker task:
//!
//! ```ignore
//! use geoclip::fetch::{BatchFetcher, FetchConfig, ReqwestOverpassClient};
//! use geoclip::pipeline::{spawn_fetch_run, PipelineEvent};
//!
//! let config = FetchConfig::default();
//! let client = ReqwestOverpassClient::new(&config.endpoint, config.request_timeout)?;
//! let (mut events, _handle) = spawn_fetch_run(BatchFetcher::new(client, config), request, cancel);
//! while let Some(event) = events.recv().await {
//!     // Progress, then Finished or Failed
//! }
//! ```

pub mod assemble;
pub mod clip;
pub mod config;
pub mod dedupe;
pub mod fetch;
pub mod geometry;
pub mod logging;
pub mod pipeline;

/// Version of the geoclip library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
