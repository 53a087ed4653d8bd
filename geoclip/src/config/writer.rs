//! INI serialization logic for converting `ConfigFile` → INI string.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    format!(
        r#"[overpass]
; Overpass API interpreter URL queries are POSTed to
endpoint = {}
; HTTP timeout for a single request, in seconds
request_timeout_secs = {}
; Server-side query timeout sent as [timeout:N], in seconds
query_timeout_secs = {}

[fetch]
; Attempts per job before it is given up (rate limits and gateway errors back off exponentially)
max_attempts = {}
; Pause between consecutive jobs, in milliseconds
job_delay_ms = {}
; Elements assembled and clipped per batch
batch_size = {}
; Batches processed between cooperative yields
yield_every_batches = {}

[logging]
; Log file path (cleared at the start of every session)
file = {}
"#,
        config.overpass.endpoint,
        config.overpass.request_timeout_secs,
        config.overpass.query_timeout_secs,
        config.fetch.max_attempts,
        config.fetch.job_delay_ms,
        config.fetch.batch_size,
        config.fetch.yield_every_batches,
        path_to_string(&config.logging.file),
    )
}

/// Renders a path, abbreviating the home directory as `~`.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}
