// src/config/validate.rs

use std::time::Duration;

use tracing::debug;

use crate::canonical::canonicalize_all;
use crate::config::model::{RawWatchConfig, WatchFlags, WatchRequest};
use crate::errors::{Result, WatchError};
use crate::fs::FileSystem;
use crate::source::Capabilities;

/// Turn raw settings into a [`WatchRequest`] the given event source can
/// honour.
///
/// This is the single place where source capabilities are consulted: a flag
/// the source cannot provide is a startup error here rather than a silent
/// no-op later. Paths are canonicalized last, in order.
pub fn negotiate(
    raw: &RawWatchConfig,
    caps: &Capabilities,
    fs: &dyn FileSystem,
) -> Result<WatchRequest> {
    let latency = seconds(raw.latency).ok_or(WatchError::InvalidLatency(raw.latency))?;

    let poll_interval = seconds(raw.poll_interval)
        .filter(|d| !d.is_zero())
        .ok_or_else(|| {
            WatchError::ConfigError(format!(
                "poll_interval must be a positive number of seconds (got {})",
                raw.poll_interval
            ))
        })?;

    let flags = negotiate_flags(raw, caps)?;

    let paths = canonicalize_all(fs, &raw.paths);

    debug!(
        ?paths,
        cursor = %raw.since_when,
        ?latency,
        ?flags,
        backend = %raw.backend,
        "watch request validated"
    );

    Ok(WatchRequest::new_unchecked(
        paths,
        raw.since_when,
        latency,
        flags,
        raw.backend,
        poll_interval,
    ))
}

fn negotiate_flags(raw: &RawWatchConfig, caps: &Capabilities) -> Result<WatchFlags> {
    let requested = [
        ("no-defer", raw.no_defer, caps.no_defer),
        ("watch-root", raw.watch_root, caps.watch_root),
        ("ignore-self", raw.ignore_self, caps.ignore_self),
        ("file-events", raw.file_events, caps.file_events),
        ("mark-self", raw.mark_self, caps.mark_self),
    ];

    for (flag, wanted, supported) in requested {
        if wanted && !supported {
            return Err(WatchError::UnsupportedFlag {
                flag,
                backend: caps.name,
            });
        }
    }

    Ok(WatchFlags {
        no_defer: raw.no_defer,
        watch_root: raw.watch_root,
        ignore_self: raw.ignore_self,
        file_events: raw.file_events,
        mark_self: raw.mark_self,
    })
}

fn seconds(value: f64) -> Option<Duration> {
    if value.is_finite() && value >= 0.0 {
        Duration::try_from_secs_f64(value).ok()
    } else {
        None
    }
}
