#![allow(dead_code)]

use std::path::{Path, PathBuf};

use fsevent_watch::config::RawWatchConfig;
use fsevent_watch::source::{Batch, RawEvent};
use fsevent_watch::types::{Backend, Cursor};

/// Builder for `RawWatchConfig` to simplify test setup.
pub struct RawConfigBuilder {
    config: RawWatchConfig,
}

impl RawConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: RawWatchConfig::default(),
        }
    }

    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.config.paths.push(path.as_ref().to_path_buf());
        self
    }

    pub fn since(mut self, cursor: Cursor) -> Self {
        self.config.since_when = cursor;
        self
    }

    pub fn latency(mut self, seconds: f64) -> Self {
        self.config.latency = seconds;
        self
    }

    pub fn no_defer(mut self) -> Self {
        self.config.no_defer = true;
        self
    }

    pub fn watch_root(mut self) -> Self {
        self.config.watch_root = true;
        self
    }

    pub fn ignore_self(mut self) -> Self {
        self.config.ignore_self = true;
        self
    }

    pub fn file_events(mut self) -> Self {
        self.config.file_events = true;
        self
    }

    pub fn mark_self(mut self) -> Self {
        self.config.mark_self = true;
        self
    }

    pub fn backend(mut self, backend: Backend) -> Self {
        self.config.backend = backend;
        self
    }

    pub fn poll_interval(mut self, seconds: f64) -> Self {
        self.config.poll_interval = seconds;
        self
    }

    pub fn build(self) -> RawWatchConfig {
        self.config
    }
}

impl Default for RawConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn raw_event(id: u64, flags: u32, path: &str) -> RawEvent {
    RawEvent::new(id, flags, PathBuf::from(path))
}

/// A batch of events with consecutive ids starting at `first_id`.
pub fn batch(first_id: u64, items: &[(u32, &str)]) -> Batch {
    items
        .iter()
        .enumerate()
        .map(|(i, &(flags, path))| raw_event(first_id + i as u64, flags, path))
        .collect()
}
