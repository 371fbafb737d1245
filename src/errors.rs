// src/errors.rs

//! Crate-wide error aliases and helpers.
//!
//! Only startup failures (bad configuration, an unsupported flag, a failed
//! subscription) and output-stream failures travel through these types.
//! Per-event problems never become errors; see [`crate::normalize`].

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("--{flag} is not supported by the {backend} event source")]
    UnsupportedFlag {
        flag: &'static str,
        backend: &'static str,
    },

    #[error("Invalid latency: {0} (expected a finite, non-negative number of seconds)")]
    InvalidLatency(f64),

    #[error("Failed to subscribe to change notifications: {0}")]
    Subscribe(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Notify error: {0}")]
    NotifyError(#[from] notify::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, WatchError>;
