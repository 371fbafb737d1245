// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::canonical::CanonicalPath;
use crate::types::{Backend, Cursor};

/// Settings as read from a TOML file and/or the command line, before any
/// validation.
///
/// ```toml
/// paths = ["/Users/alice/src/project", "/tmp/drop"]
/// since_when = "now"
/// latency = 0.3
/// file_events = true
/// watch_root = true
/// backend = "native"
/// ```
///
/// Every key is optional; missing keys take the defaults below.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawWatchConfig {
    /// Paths to watch, in order. Empty means the working directory.
    pub paths: Vec<PathBuf>,

    /// Where to resume from (`"now"` or an event id).
    pub since_when: Cursor,

    /// Batching interval in seconds.
    pub latency: f64,

    /// Deliver the first notification after a quiet period immediately
    /// instead of waiting out the latency.
    pub no_defer: bool,

    /// Report moves/removal of a watched root itself.
    pub watch_root: bool,

    /// Suppress notifications caused by this process.
    pub ignore_self: bool,

    /// Per-file granularity instead of per-directory.
    pub file_events: bool,

    /// Flag notifications caused by this process with `OwnEvent`.
    pub mark_self: bool,

    pub backend: Backend,

    /// Rescan interval in seconds for the `poll` backend.
    pub poll_interval: f64,
}

pub const DEFAULT_LATENCY_SECS: f64 = 0.3;
pub const DEFAULT_POLL_INTERVAL_SECS: f64 = 1.0;

impl Default for RawWatchConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            since_when: Cursor::Now,
            latency: DEFAULT_LATENCY_SECS,
            no_defer: false,
            watch_root: false,
            ignore_self: false,
            file_events: false,
            mark_self: false,
            backend: Backend::Native,
            poll_interval: DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}

/// Behavioural flags of a subscription.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchFlags {
    pub no_defer: bool,
    pub watch_root: bool,
    pub ignore_self: bool,
    pub file_events: bool,
    pub mark_self: bool,
}

/// Validated, immutable description of what to subscribe to.
///
/// Only [`crate::config::negotiate`] builds one, so holding a `WatchRequest`
/// means the configuration was checked against the event source's
/// capabilities and every path was canonicalized.
#[derive(Debug, Clone)]
pub struct WatchRequest {
    paths: Vec<CanonicalPath>,
    cursor: Cursor,
    latency: Duration,
    flags: WatchFlags,
    backend: Backend,
    poll_interval: Duration,
}

impl WatchRequest {
    pub(crate) fn new_unchecked(
        paths: Vec<CanonicalPath>,
        cursor: Cursor,
        latency: Duration,
        flags: WatchFlags,
        backend: Backend,
        poll_interval: Duration,
    ) -> Self {
        Self {
            paths,
            cursor,
            latency,
            flags,
            backend,
            poll_interval,
        }
    }

    pub fn paths(&self) -> &[CanonicalPath] {
        &self.paths
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }

    pub fn flags(&self) -> WatchFlags {
        self.flags
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}
