//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`clip`] - Clip and deduplicate a feature file
//! - [`config`] - Configuration inspection (path, show, init)
//! - [`fetch`] - Overpass acquisition for a job list

pub mod clip;
pub mod common;
pub mod config;
pub mod fetch;
