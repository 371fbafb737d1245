// src/canonical.rs

//! Path canonicalization ahead of subscribing.
//!
//! Event sources resolve watched paths internally and report changes using
//! the on-disk spelling. Doing the same resolution up front means the paths
//! we subscribe with, and the paths that come back in events, agree.
//!
//! The algorithm:
//! 1. make the input absolute against the working directory;
//! 2. strip trailing components until the remainder can be stat'ed
//!    (the root always can), remembering what was stripped;
//! 3. resolve that ancestor with `realpath`, then correct the letter case of
//!    every component by matching device/inode identity against the parent
//!    directory's listing;
//! 4. re-append the stripped components verbatim.

use std::collections::VecDeque;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

use crate::fs::FileSystem;

/// Absolute path whose existing prefix matches the on-disk letter case.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalPath(PathBuf);

impl CanonicalPath {
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }
}

impl AsRef<Path> for CanonicalPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for CanonicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Canonicalize every input in order. No inputs means the working directory.
pub fn canonicalize_all<P: AsRef<Path>>(fs: &dyn FileSystem, inputs: &[P]) -> Vec<CanonicalPath> {
    if inputs.is_empty() {
        return vec![canonicalize(fs, ".")];
    }
    inputs.iter().map(|p| canonicalize(fs, p)).collect()
}

/// Resolve `input` to a [`CanonicalPath`]. Never fails: anything that cannot
/// be resolved is kept as written.
pub fn canonicalize(fs: &dyn FileSystem, input: impl AsRef<Path>) -> CanonicalPath {
    let input = input.as_ref();
    debug!(?input, "canonicalizing path");

    let absolute = absolutize(fs, input);

    // Strip until something exists, most recently removed first.
    let mut ancestor = absolute.clone();
    let mut imaginary: VecDeque<OsString> = VecDeque::new();
    while !fs.is_reachable(&ancestor) {
        let Some(last) = ancestor.components().next_back() else {
            break;
        };
        if matches!(last, Component::RootDir | Component::Prefix(_)) {
            break;
        }
        imaginary.push_front(last.as_os_str().to_os_string());
        if !ancestor.pop() {
            break;
        }
        debug!(parent = ?ancestor, "path does not exist; trying parent");
    }

    let mut resolved = correct_case(fs, &ancestor);
    debug!(?resolved, "existing ancestor resolved");

    // Nothing on disk to resolve the missing tail against, `..` included.
    for component in imaginary {
        resolved.push(component);
    }

    debug!(result = ?resolved, "canonicalized");
    CanonicalPath(resolved)
}

fn absolutize(fs: &dyn FileSystem, input: &Path) -> PathBuf {
    let joined = if input.is_absolute() {
        input.to_path_buf()
    } else {
        match fs.current_dir() {
            Ok(cwd) => cwd.join(input),
            Err(err) => {
                warn!(?input, error = %err, "cannot read working directory; keeping relative path");
                input.to_path_buf()
            }
        }
    };
    // `components()` drops interior and trailing `.`.
    joined.components().collect()
}

/// `realpath` followed by an identity-based case fix of every component.
fn correct_case(fs: &dyn FileSystem, existing: &Path) -> PathBuf {
    let resolved = match fs.canonicalize(existing) {
        Ok(p) => p,
        Err(err) => {
            warn!(path = ?existing, error = %err, "realpath failed; using path as written");
            existing.to_path_buf()
        }
    };

    let mut corrected = PathBuf::new();
    let mut as_supplied = PathBuf::new();
    for component in resolved.components() {
        match component {
            Component::Normal(name) => {
                as_supplied.push(name);
                let on_disk = on_disk_name(fs, &corrected, &as_supplied, name)
                    .unwrap_or_else(|| name.to_os_string());
                if on_disk != name {
                    debug!(supplied = ?name, ?on_disk, "corrected component case");
                }
                corrected.push(on_disk);
            }
            other => {
                corrected.push(other.as_os_str());
                as_supplied.push(other.as_os_str());
            }
        }
    }
    corrected
}

/// Name under which `parent` actually stores the object reached through
/// `supplied`. `None` when the parent cannot be listed or nothing matches.
fn on_disk_name(
    fs: &dyn FileSystem,
    parent: &Path,
    supplied: &Path,
    name: &OsStr,
) -> Option<OsString> {
    let entries = fs.read_dir(parent).ok()?;

    if entries.iter().any(|e| e.file_name() == Some(name)) {
        return Some(name.to_os_string());
    }

    let target = fs.identity(supplied)?;
    let wanted = name.to_string_lossy().to_lowercase();
    let mut matches = entries
        .iter()
        .filter(|e| fs.identity(e) == Some(target))
        .filter_map(|e| e.file_name());

    // Hard links share an identity; prefer the one that only differs in case.
    let first = matches.next()?;
    if first.to_string_lossy().to_lowercase() == wanted {
        return Some(first.to_os_string());
    }
    Some(
        matches
            .find(|n| n.to_string_lossy().to_lowercase() == wanted)
            .unwrap_or(first)
            .to_os_string(),
    )
}
