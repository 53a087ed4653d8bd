//! geoclip CLI - Command-line interface
//!
//! This binary drives the geoclip library: Overpass acquisition for a job
//! list, clipping of feature files against a boundary, and configuration
//! inspection.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::clip::ClipArgs;
use commands::config::ConfigCommands;
use commands::fetch::FetchArgs;

#[derive(Parser)]
#[command(name = "geoclip")]
#[command(version)]
#[command(
    about = "Clip, deduplicate and fetch geographic features within a boundary",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch features from Overpass for each job and clip them to a boundary
    Fetch {
        /// Boundary file (Polygon/MultiPolygon geometry, Feature or FeatureCollection)
        #[arg(long)]
        boundary: PathBuf,

        /// Job list: JSON array of {tagFilter, layerName, domainName, geometryFamily?}
        #[arg(long)]
        jobs: PathBuf,

        /// Existing features to deduplicate against (FeatureCollection)
        #[arg(long)]
        seed: Option<PathBuf>,

        /// Layer whose seed features are ignored (e.g. the layer being refreshed)
        #[arg(long, requires = "seed")]
        exclude_layer: Option<String>,

        /// Output GeoJSON file
        #[arg(long)]
        output: PathBuf,

        /// Overpass interpreter URL (overrides config.ini)
        #[arg(long)]
        endpoint: Option<String>,

        /// Mirror log output to stdout
        #[arg(long)]
        verbose: bool,

        /// Enable debug-level logging
        #[arg(long)]
        debug: bool,
    },

    /// Clip and deduplicate a feature file against a boundary
    Clip {
        /// Boundary file (Polygon/MultiPolygon geometry, Feature or FeatureCollection)
        #[arg(long)]
        boundary: PathBuf,

        /// Input features (FeatureCollection, Feature or array of features)
        #[arg(long)]
        input: PathBuf,

        /// Layer name stamped on features without one
        #[arg(long)]
        layer: String,

        /// Domain name stamped on features without one
        #[arg(long)]
        domain: String,

        /// Existing features to deduplicate against (FeatureCollection)
        #[arg(long)]
        seed: Option<PathBuf>,

        /// Layer whose seed features are ignored
        #[arg(long, requires = "seed")]
        exclude_layer: Option<String>,

        /// Output GeoJSON file
        #[arg(long)]
        output: PathBuf,

        /// Enable debug-level logging
        #[arg(long)]
        debug: bool,
    },

    /// Inspect the configuration file
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Fetch {
            boundary,
            jobs,
            seed,
            exclude_layer,
            output,
            endpoint,
            verbose,
            debug,
        } => commands::fetch::run(FetchArgs {
            boundary,
            jobs,
            seed,
            exclude_layer,
            output,
            endpoint,
            verbose,
            debug,
        }),
        Commands::Clip {
            boundary,
            input,
            layer,
            domain,
            seed,
            exclude_layer,
            output,
            debug,
        } => commands::clip::run(ClipArgs {
            boundary,
            input,
            layer,
            domain,
            seed,
            exclude_layer,
            output,
            debug,
        }),
        Commands::Config(command) => commands::config::run(command),
    };

    if let Err(e) = result {
        e.exit();
    }
}
