//! Clip command - run a feature file through validation, clipping and
//! deduplication without touching the network.

use std::path::PathBuf;
use std::sync::Arc;

use geoclip::geometry::Boundary;
use geoclip::pipeline::{PipelineRun, RunError};
use tracing::info;

use super::common::{feature_values, print_summary, read_json, read_seed};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the clip command.
pub struct ClipArgs {
    pub boundary: PathBuf,
    pub input: PathBuf,
    pub layer: String,
    pub domain: String,
    pub seed: Option<PathBuf>,
    pub exclude_layer: Option<String>,
    pub output: PathBuf,
    pub debug: bool,
}

/// Run the clip command.
pub fn run(args: ClipArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(false, args.debug)?;
    runner.log_startup("clip");

    let boundary = Boundary::from_value(&read_json(&args.boundary)?).map_err(RunError::from)?;
    let values = feature_values(read_json(&args.input)?).ok_or_else(|| {
        CliError::invalid_input(
            &args.input,
            "expected a FeatureCollection, a Feature or an array of features",
        )
    })?;
    let seed = read_seed(args.seed.as_deref())?;

    println!(
        "Clipping {} feature(s) into layer '{}' ({})",
        values.len(),
        args.layer,
        args.domain
    );

    let mut run = PipelineRun::seeded(Arc::new(boundary), &seed, args.exclude_layer.as_deref());
    let accepted = run.ingest_values(&values, &args.layer, &args.domain);
    info!(input = values.len(), accepted, "Clip finished");

    let report = run.finish();
    print_summary(report.features.len(), &report.stats);
    println!();

    runner.save_features(&args.output, report.features)
}
