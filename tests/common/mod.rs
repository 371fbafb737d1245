#![allow(dead_code)]

use std::sync::Arc;

use fsevent_watch::fs::FileSystem;
use fsevent_watch::fs::mock::MockFileSystem;

pub use fsevent_watch_test_utils::init_tracing;

/// A case-insensitive volume with a little home directory on it:
///
/// ```text
/// /Users/Alice/Projects/Demo/README.md
/// /Users/Alice/Projects/Demo/src/main.rs
/// /Volumes/Data
/// ```
pub fn sample_volume() -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_file("/Users/Alice/Projects/Demo/README.md");
    fs.add_file("/Users/Alice/Projects/Demo/src/main.rs");
    fs.add_dir("/Volumes/Data");
    fs
}

pub fn shared(fs: &MockFileSystem) -> Arc<dyn FileSystem> {
    Arc::new(fs.clone())
}
