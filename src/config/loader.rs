// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::cli::CliArgs;
use crate::config::model::RawWatchConfig;
use crate::errors::Result;

/// Load a settings file and return the raw `RawWatchConfig`.
///
/// This only performs TOML deserialization; capability checks and path
/// canonicalization happen in [`crate::config::negotiate`].
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawWatchConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawWatchConfig = toml::from_str(&contents)?;

    Ok(config)
}

/// Build the raw configuration for a run.
///
/// Starts from `--config` (if given) or the defaults, then applies the
/// command line on top: scalar options replace file values, boolean flags
/// can only switch a behaviour on, and positional paths replace the file's
/// `paths` list.
pub fn load_raw_config(args: &CliArgs) -> Result<RawWatchConfig> {
    let mut raw = match args.config {
        Some(ref path) => load_from_path(path)?,
        None => RawWatchConfig::default(),
    };
    apply_cli(&mut raw, args);
    Ok(raw)
}

pub fn apply_cli(raw: &mut RawWatchConfig, args: &CliArgs) {
    if !args.paths.is_empty() {
        raw.paths = args.paths.clone();
    }
    if let Some(cursor) = args.since_when {
        raw.since_when = cursor;
    }
    if let Some(latency) = args.latency {
        raw.latency = latency;
    }
    if let Some(backend) = args.backend {
        raw.backend = backend;
    }
    if let Some(interval) = args.poll_interval {
        raw.poll_interval = interval;
    }
    raw.no_defer |= args.no_defer;
    raw.watch_root |= args.watch_root;
    raw.ignore_self |= args.ignore_self;
    raw.file_events |= args.file_events;
    raw.mark_self |= args.mark_self;
}
