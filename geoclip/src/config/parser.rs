//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This module is the single place where INI key names are mapped to struct
//! fields.

use ini::{Ini, Properties};
use std::path::PathBuf;
use std::str::FromStr;

use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [overpass] section
    if let Some(section) = ini.section(Some("overpass")) {
        if let Some(v) = section.get("endpoint") {
            let v = v.trim();
            if !(v.starts_with("http://") || v.starts_with("https://")) {
                return Err(invalid(
                    "overpass",
                    "endpoint",
                    v,
                    "must be an http:// or https:// URL",
                ));
            }
            config.overpass.endpoint = v.to_string();
        }
        if let Some(v) = positive(section, "overpass", "request_timeout_secs")? {
            config.overpass.request_timeout_secs = v;
        }
        if let Some(v) = positive(section, "overpass", "query_timeout_secs")? {
            config.overpass.query_timeout_secs = v;
        }
    }

    // [fetch] section
    if let Some(section) = ini.section(Some("fetch")) {
        if let Some(v) = positive(section, "fetch", "max_attempts")? {
            config.fetch.max_attempts = v;
        }
        if let Some(v) = number(section, "fetch", "job_delay_ms")? {
            config.fetch.job_delay_ms = v;
        }
        if let Some(v) = positive(section, "fetch", "batch_size")? {
            config.fetch.batch_size = v;
        }
        if let Some(v) = positive(section, "fetch", "yield_every_batches")? {
            config.fetch.yield_every_batches = v;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Parses an optional numeric key.
fn number<T: FromStr>(
    section: &Properties,
    name: &str,
    key: &str,
) -> Result<Option<T>, ConfigFileError> {
    section
        .get(key)
        .map(|v| {
            v.trim()
                .parse()
                .map_err(|_| invalid(name, key, v, "must be a non-negative integer"))
        })
        .transpose()
}

/// Parses an optional numeric key that must be at least 1.
fn positive<T: FromStr + PartialOrd + From<u8>>(
    section: &Properties,
    name: &str,
    key: &str,
) -> Result<Option<T>, ConfigFileError> {
    match number::<T>(section, name, key)? {
        Some(v) if v < T::from(1) => Err(invalid(
            name,
            key,
            section.get(key).unwrap_or_default(),
            "must be at least 1",
        )),
        other => Ok(other),
    }
}

/// Expands a leading `~/` to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
