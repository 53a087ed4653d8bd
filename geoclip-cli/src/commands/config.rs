//! Configuration management CLI commands.
//!
//! Provides `config path`, `config show` and `config init` for inspecting
//! `~/.geoclip/config.ini` from the command line.

use clap::Subcommand;
use geoclip::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Show the effective configuration (defaults when no file exists)
    Show,

    /// Write a default configuration file if none exists
    Init,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => run_path(),
        ConfigCommands::Show => run_show(),
        ConfigCommands::Init => run_init(),
    }
}

/// Show the configuration file path.
fn run_path() -> Result<(), CliError> {
    println!("{}", config_file_path().display());
    Ok(())
}

/// Print the effective configuration as INI.
fn run_show() -> Result<(), CliError> {
    let path = config_file_path();
    let config = ConfigFile::load_from(&path)?;

    if path.exists() {
        println!("# Loaded from {}", path.display());
    } else {
        println!("# No file at {}, showing defaults", path.display());
    }
    println!();
    print!("{}", config.to_ini_string());

    Ok(())
}

/// Create the configuration file with defaults.
fn run_init() -> Result<(), CliError> {
    let path = config_file_path();
    if path.exists() {
        println!("Configuration already exists at {}", path.display());
        return Ok(());
    }

    let path = ConfigFile::ensure_exists()?;
    println!("✓ Created {}", path.display());
    Ok(())
}
