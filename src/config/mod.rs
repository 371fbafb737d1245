// src/config/mod.rs

//! Configuration loading and validation for fsevent-watch.
//!
//! Responsibilities:
//! - Define the TOML-backed raw settings and the validated request (`model.rs`).
//! - Load a settings file from disk and merge the command line (`loader.rs`).
//! - Negotiate flags against the event source and canonicalize paths
//!   (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{apply_cli, load_from_path, load_raw_config};
pub use model::{RawWatchConfig, WatchFlags, WatchRequest};
pub use validate::negotiate;
