//! Fetch command - acquire features from Overpass for a list of jobs.

use std::path::PathBuf;

use geoclip::fetch::{BatchFetcher, OverpassClient};
use geoclip::pipeline::{spawn_fetch_run, FetchRequest, PipelineEvent, RunError, RunReport};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::common::{print_summary, read_jobs, read_json, read_seed};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the fetch command.
pub struct FetchArgs {
    pub boundary: PathBuf,
    pub jobs: PathBuf,
    pub seed: Option<PathBuf>,
    pub exclude_layer: Option<String>,
    pub output: PathBuf,
    pub endpoint: Option<String>,
    pub verbose: bool,
    pub debug: bool,
}

/// Run the fetch command.
pub fn run(args: FetchArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args.verbose, args.debug)?;
    runner.log_startup("fetch");

    let boundary = read_json(&args.boundary)?;
    let jobs = read_jobs(&args.jobs)?;
    let seed = read_seed(args.seed.as_deref())?;
    let fetcher = runner.create_fetcher(args.endpoint)?;

    println!("Fetching {} job(s)", jobs.len());
    println!("  Endpoint: {}", fetcher.config().endpoint);
    if !seed.is_empty() {
        println!("  Seeded with {} existing feature(s)", seed.len());
    }
    println!();

    let request = FetchRequest {
        boundary,
        jobs,
        seed,
        exclude_layer: args.exclude_layer,
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    // Ctrl+C cancels the run; no partial output is written.
    let cancel = CancellationToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || handler_token.cancel())
        .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    let start = std::time::Instant::now();
    let report = runtime.block_on(drive(fetcher, request, cancel))?;
    println!("Fetched in {:.1}s", start.elapsed().as_secs_f64());

    print_summary(report.features.len(), &report.stats);
    println!(
        "  Jobs: {} succeeded, {} exhausted, {} aborted",
        report.stats.jobs_succeeded, report.stats.jobs_exhausted, report.stats.jobs_aborted
    );
    println!();

    runner.save_features(&args.output, report.features)
}

/// Consume the worker's event stream until its terminal event.
async fn drive<C>(
    fetcher: BatchFetcher<C>,
    request: FetchRequest,
    cancel: CancellationToken,
) -> Result<RunReport, CliError>
where
    C: OverpassClient + 'static,
{
    let (mut events, handle) = spawn_fetch_run(fetcher, request, cancel);

    let mut outcome = None;
    while let Some(event) = events.recv().await {
        match event {
            PipelineEvent::Progress(progress) => println!("  {}", progress),
            PipelineEvent::Finished(report) => outcome = Some(Ok(report)),
            PipelineEvent::Failed(e) => outcome = Some(Err(CliError::Run(e))),
        }
    }

    if let Err(e) = handle.await {
        warn!(error = %e, "Fetch supervisor task failed");
    }

    outcome.unwrap_or_else(|| {
        Err(CliError::Run(RunError::Worker(
            "worker ended without a result".to_string(),
        )))
    })
}
