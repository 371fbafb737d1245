// src/fs/mod.rs

use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub mod mock;

/// Device + inode pair identifying a filesystem object independently of the
/// path (and letter case) used to reach it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId {
    pub dev: u64,
    pub ino: u64,
}

/// Abstract filesystem interface.
///
/// Everything the canonicalizer and the normalizer learn about the disk goes
/// through this trait, so both can be exercised against [`mock::MockFileSystem`].
pub trait FileSystem: Send + Sync + Debug {
    fn current_dir(&self) -> Result<PathBuf>;

    /// True if `path` can be stat'ed (symlinks followed).
    fn is_reachable(&self, path: &Path) -> bool;

    /// `realpath`: resolve symlinks, `.` and `..`. The letter case of the
    /// result is whatever the platform returns, which is not always the
    /// on-disk case.
    fn canonicalize(&self, path: &Path) -> Result<PathBuf>;

    /// Identity of the object `path` resolves to (symlinks followed).
    fn identity(&self, path: &Path) -> Option<FileId>;

    /// Identity of `path` itself, without following a final symlink.
    fn symlink_identity(&self, path: &Path) -> Option<FileId>;

    /// Open `path` read-only without creating it and take the identity from
    /// the open handle. Only regular files and directories are opened.
    fn open_identity(&self, path: &Path) -> Option<FileId>;

    /// Return a list of entries in a directory.
    /// Returns full paths, with entry names as stored on disk.
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;

    /// Best-effort inode number: handle first, then a non-following stat,
    /// then 0.
    fn inode(&self, path: &Path) -> u64 {
        self.open_identity(path)
            .or_else(|| self.symlink_identity(path))
            .map(|id| id.ino)
            .unwrap_or(0)
    }
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn current_dir(&self) -> Result<PathBuf> {
        std::env::current_dir().context("reading current working directory")
    }

    fn is_reachable(&self, path: &Path) -> bool {
        fs::metadata(path).is_ok()
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        fs::canonicalize(path).with_context(|| format!("canonicalizing {:?}", path))
    }

    fn identity(&self, path: &Path) -> Option<FileId> {
        fs::metadata(path).ok().and_then(|m| file_id(&m))
    }

    fn symlink_identity(&self, path: &Path) -> Option<FileId> {
        fs::symlink_metadata(path).ok().and_then(|m| file_id(&m))
    }

    fn open_identity(&self, path: &Path) -> Option<FileId> {
        // A read-only open of a FIFO or device can block indefinitely; those
        // go to the stat fallback instead.
        let target = fs::metadata(path).ok()?.file_type();
        if !target.is_file() && !target.is_dir() {
            return None;
        }
        let file = fs::OpenOptions::new().read(true).open(path).ok()?;
        file.metadata().ok().and_then(|m| file_id(&m))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path).with_context(|| format!("reading dir {:?}", path))? {
            let entry = entry?;
            entries.push(entry.path());
        }
        Ok(entries)
    }
}

#[cfg(unix)]
fn file_id(meta: &fs::Metadata) -> Option<FileId> {
    use std::os::unix::fs::MetadataExt;

    Some(FileId {
        dev: meta.dev(),
        ino: meta.ino(),
    })
}

// No stable inode accessor outside unix; records degrade to inode 0 and the
// canonicalizer keeps the realpath result as is.
#[cfg(not(unix))]
fn file_id(_meta: &fs::Metadata) -> Option<FileId> {
    None
}
