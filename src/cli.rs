// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::types::{Backend, Cursor};

/// Command-line arguments for `fsevent-watch`.
///
/// Change records go to stdout, one tab-separated line per event. Closing
/// stdin (or Ctrl-C) flushes pending events and exits.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "fsevent-watch",
    version,
    about = "Watch paths for filesystem changes and print one line per event.",
    long_about = None
)]
pub struct CliArgs {
    /// Paths to watch. Default: the current working directory.
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Resume from this event id instead of "now".
    #[arg(long, value_name = "ID|now")]
    pub since_when: Option<Cursor>,

    /// Seconds to batch notifications for before delivering them (default 0.3).
    #[arg(long, value_name = "SECONDS")]
    pub latency: Option<f64>,

    /// Deliver the first event after a quiet period without waiting.
    #[arg(long)]
    pub no_defer: bool,

    /// Report when a watched root itself is moved or removed.
    #[arg(long)]
    pub watch_root: bool,

    /// Ignore changes made by this process.
    #[arg(long)]
    pub ignore_self: bool,

    /// Report individual files instead of their directories.
    #[arg(long)]
    pub file_events: bool,

    /// Mark changes made by this process with `OwnEvent`.
    #[arg(long)]
    pub mark_self: bool,

    /// Event source backend (native, poll).
    #[arg(long, value_name = "BACKEND")]
    pub backend: Option<Backend>,

    /// Rescan interval in seconds for the poll backend (default 1.0).
    #[arg(long, value_name = "SECONDS")]
    pub poll_interval: Option<f64>,

    /// Optional TOML settings file; command-line options take precedence.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `FSEVENT_WATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Validate settings, print the resolved request, and exit.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
