// src/fs/mock.rs

//! In-memory filesystem modelling a case-insensitive, case-preserving volume
//! (the default on macOS). Lookups ignore letter case; listings and
//! identities report the case an entry was created with. `canonicalize`
//! deliberately echoes the caller's case, like `realpath` on such volumes.

use super::{FileId, FileSystem};
use anyhow::{anyhow, Result};
use std::collections::{HashMap, HashSet};
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockKind {
    File,
    Dir,
}

#[derive(Debug, Clone)]
struct MockEntry {
    /// Absolute path in on-disk case.
    on_disk: PathBuf,
    kind: MockKind,
    id: FileId,
}

#[derive(Debug, Default)]
struct MockState {
    entries: HashMap<String, MockEntry>,
    unopenable: HashSet<String>,
    cwd: PathBuf,
    next_ino: u64,
}

#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<MockState>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        let mut state = MockState {
            cwd: PathBuf::from("/"),
            next_ino: 2,
            ..MockState::default()
        };
        // Ensure root exists
        state.entries.insert(
            key(Path::new("/")),
            MockEntry {
                on_disk: PathBuf::from("/"),
                kind: MockKind::Dir,
                id: FileId { dev: 1, ino: 1 },
            },
        );

        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Create a directory (and any missing parents) using the case given.
    /// Existing components keep the case they were first created with.
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        self.insert(path.as_ref(), MockKind::Dir);
    }

    pub fn add_file(&self, path: impl AsRef<Path>) {
        self.insert(path.as_ref(), MockKind::File);
    }

    pub fn remove(&self, path: impl AsRef<Path>) {
        let k = key(path.as_ref());
        let mut state = self.state.lock().unwrap();
        let prefix = format!("{k}/");
        state
            .entries
            .retain(|entry_key, _| entry_key != &k && !entry_key.starts_with(&prefix));
    }

    /// Make `open_identity` fail for `path` (e.g. permission denied) while
    /// stat keeps working.
    pub fn deny_open(&self, path: impl AsRef<Path>) {
        let mut state = self.state.lock().unwrap();
        state.unopenable.insert(key(path.as_ref()));
    }

    pub fn set_current_dir(&self, path: impl AsRef<Path>) {
        let mut state = self.state.lock().unwrap();
        state.cwd = path.as_ref().to_path_buf();
    }

    pub fn identity_of(&self, path: impl AsRef<Path>) -> Option<FileId> {
        self.lookup(path.as_ref()).map(|e| e.id)
    }

    fn insert(&self, path: &Path, kind: MockKind) {
        let mut state = self.state.lock().unwrap();
        let mut on_disk = PathBuf::from("/");
        let components: Vec<String> = normal_components(path);
        let last = components.len().saturating_sub(1);

        for (i, name) in components.iter().enumerate() {
            let candidate = on_disk.join(name);
            let k = key(&candidate);
            if let Some(existing) = state.entries.get(&k) {
                on_disk = existing.on_disk.clone();
                continue;
            }
            let ino = state.next_ino;
            state.next_ino += 1;
            let entry_kind = if i == last { kind } else { MockKind::Dir };
            state.entries.insert(
                k,
                MockEntry {
                    on_disk: candidate.clone(),
                    kind: entry_kind,
                    id: FileId { dev: 1, ino },
                },
            );
            on_disk = candidate;
        }
    }

    fn lookup(&self, path: &Path) -> Option<MockEntry> {
        let state = self.state.lock().unwrap();
        // `..` only resolves through a directory that exists.
        let mut walked = PathBuf::from("/");
        for component in path.components() {
            if component == Component::ParentDir {
                match state.entries.get(&key(&walked)) {
                    Some(entry) if entry.kind == MockKind::Dir => {}
                    _ => return None,
                }
            }
            walked.push(component);
        }
        state.entries.get(&key(path)).cloned()
    }
}

impl FileSystem for MockFileSystem {
    fn current_dir(&self) -> Result<PathBuf> {
        let state = self.state.lock().unwrap();
        Ok(state.cwd.clone())
    }

    fn is_reachable(&self, path: &Path) -> bool {
        self.lookup(path).is_some()
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        if self.lookup(path).is_none() {
            return Err(anyhow!("No such file or directory: {:?}", path));
        }
        let mut out = PathBuf::from("/");
        for name in normal_components(path) {
            out.push(name);
        }
        Ok(out)
    }

    fn identity(&self, path: &Path) -> Option<FileId> {
        self.lookup(path).map(|e| e.id)
    }

    fn symlink_identity(&self, path: &Path) -> Option<FileId> {
        self.lookup(path).map(|e| e.id)
    }

    fn open_identity(&self, path: &Path) -> Option<FileId> {
        let entry = self.lookup(path)?;
        let state = self.state.lock().unwrap();
        if state.unopenable.contains(&key(path)) {
            return None;
        }
        Some(entry.id)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        match self.lookup(path) {
            Some(entry) if entry.kind == MockKind::Dir => {
                let state = self.state.lock().unwrap();
                let mut children: Vec<PathBuf> = state
                    .entries
                    .values()
                    .filter(|e| e.on_disk.parent() == Some(entry.on_disk.as_path()))
                    .filter_map(|e| e.on_disk.file_name().map(|name| path.join(name)))
                    .collect();
                children.sort();
                Ok(children)
            }
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }
}

/// Lexically normalised, non-root components (`.` dropped, `..` popped).
fn normal_components(path: &Path) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(name) => out.push(name.to_string_lossy().into_owned()),
            Component::ParentDir => {
                out.pop();
            }
            Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
        }
    }
    out
}

fn key(path: &Path) -> String {
    format!("/{}", normal_components(path).join("/").to_lowercase())
}
