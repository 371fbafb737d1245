// src/source/notify_source.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::event::{CreateKind, MetadataKind, ModifyKind, RemoveKind};
use notify::{Config, Event, EventKind, PollWatcher, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::WatchRequest;
use crate::errors::{Result, WatchError};
use crate::flags::bits;
use crate::source::batch::{BatchPolicy, PendingBatch};
use crate::source::{BatchSender, Capabilities, EventSource, Subscription};
use crate::types::{Backend, Cursor};

/// Event source backed by the `notify` crate.
///
/// `notify` does not attribute changes to processes, so `ignore_self` and
/// `mark_self` are reported as unsupported and rejected during validation.
#[derive(Debug, Clone, Copy)]
pub struct NotifyEventSource {
    backend: Backend,
}

impl NotifyEventSource {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }
}

impl EventSource for NotifyEventSource {
    type Subscription = NotifySubscription;

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            name: match self.backend {
                Backend::Native => "native",
                Backend::Poll => "poll",
            },
            no_defer: true,
            watch_root: true,
            ignore_self: false,
            file_events: true,
            mark_self: false,
        }
    }

    fn subscribe(
        &mut self,
        request: &WatchRequest,
        on_batch: BatchSender,
    ) -> Result<NotifySubscription> {
        if let Cursor::Since(id) = request.cursor() {
            warn!(
                since = id,
                "history replay is not available from this event source; event ids resume after the cursor"
            );
        }

        let flags = request.flags();
        let pending = Arc::new(PendingBatch::new(
            on_batch,
            request.cursor(),
            BatchPolicy {
                latency: request.latency(),
                no_defer: flags.no_defer,
                collapse_repeats: !flags.file_events,
            },
        ));

        let roots: Vec<PathBuf> = request
            .paths()
            .iter()
            .map(|p| p.as_path().to_path_buf())
            .collect();
        let translation = Translation {
            file_events: flags.file_events,
            watch_root: flags.watch_root,
        };

        let handler = {
            let pending = Arc::clone(&pending);
            let roots = roots.clone();
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let items = translate(&event, &roots, translation);
                    if !items.is_empty() {
                        pending.push(items);
                    }
                }
                Err(err) => {
                    warn!(error = %err, paths = ?err.paths, "file watch error");
                    // Something was missed under these paths; tell the
                    // consumer to rescan them.
                    let items: Vec<(u32, PathBuf)> = err
                        .paths
                        .iter()
                        .map(|p| (bits::MUST_SCAN_SUB_DIRS, p.clone()))
                        .collect();
                    if !items.is_empty() {
                        pending.push(items);
                    }
                }
            }
        };

        let mut watcher: Box<dyn Watcher + Send> = match self.backend {
            Backend::Native => Box::new(RecommendedWatcher::new(handler, Config::default())?),
            Backend::Poll => Box::new(PollWatcher::new(
                handler,
                Config::default().with_poll_interval(request.poll_interval()),
            )?),
        };

        for (target, mode) in watch_targets(&roots, flags.watch_root) {
            watcher.watch(&target, mode).map_err(|err| {
                WatchError::Subscribe(format!("cannot watch {}: {err}", target.display()))
            })?;
            debug!(path = ?target, ?mode, "watching");
        }

        let ticker = spawn_ticker(Arc::clone(&pending), request.latency());

        info!(backend = %self.backend, paths = ?roots, "event source subscribed");

        Ok(NotifySubscription {
            watcher,
            pending,
            ticker,
        })
    }
}

/// Live `notify` registration. Dropping it also stops watching.
pub struct NotifySubscription {
    watcher: Box<dyn Watcher + Send>,
    pending: Arc<PendingBatch>,
    ticker: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for NotifySubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifySubscription")
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

impl Subscription for NotifySubscription {
    fn flush(&mut self) {
        let count = self.pending.flush();
        debug!(count, "flushed pending notifications");
    }

    fn stop(mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
        drop(self.watcher);
        debug!("event source stopped");
    }
}

/// Periodically deliver whatever has accumulated. A zero latency needs no
/// ticker: every push is delivered immediately.
fn spawn_ticker(pending: Arc<PendingBatch>, latency: Duration) -> Option<JoinHandle<()>> {
    if latency.is_zero() {
        return None;
    }
    Some(tokio::spawn(async move {
        let mut interval = tokio::time::interval(latency);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            pending.flush();
        }
    }))
}

/// What to watch for each root.
///
/// A root that does not exist yet is covered by recursively watching its
/// nearest existing ancestor; events are filtered back down to the root in
/// [`translate`]. With `watch_root`, the parent of an existing root is also
/// watched (non-recursively) so that moving the root itself is noticed.
pub fn watch_targets(roots: &[PathBuf], watch_root: bool) -> Vec<(PathBuf, RecursiveMode)> {
    let mut targets: Vec<(PathBuf, RecursiveMode)> = Vec::new();
    let mut add = |path: PathBuf, mode: RecursiveMode| {
        match targets.iter_mut().find(|(p, _)| *p == path) {
            Some(existing) => {
                if mode == RecursiveMode::Recursive {
                    existing.1 = RecursiveMode::Recursive;
                }
            }
            None => targets.push((path, mode)),
        }
    };

    for root in roots {
        let existing = nearest_existing(root);
        if watch_root && existing == *root {
            if let Some(parent) = root.parent() {
                add(parent.to_path_buf(), RecursiveMode::NonRecursive);
            }
        }
        add(existing, RecursiveMode::Recursive);
    }
    targets
}

fn nearest_existing(path: &Path) -> PathBuf {
    path.ancestors()
        .find(|p| p.exists())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("/"))
}

/// Options that shape how a `notify` event becomes raw notifications.
#[derive(Debug, Clone, Copy, Default)]
pub struct Translation {
    /// Report the changed item itself with item-level flags. Otherwise only
    /// its containing directory is reported.
    pub file_events: bool,
    /// Report removal or renaming of a root as `RootChanged`.
    pub watch_root: bool,
}

/// Turn one `notify` event into `(flags, path)` notifications, one per path
/// that falls under a watched root.
///
/// Access events have no FSEvents equivalent and produce nothing.
pub fn translate(event: &Event, roots: &[PathBuf], opts: Translation) -> Vec<(u32, PathBuf)> {
    if matches!(event.kind, EventKind::Access(_)) {
        return Vec::new();
    }

    let mut base = kind_bits(&event.kind);
    if event.need_rescan() {
        base |= bits::MUST_SCAN_SUB_DIRS;
    }

    let mut out = Vec::with_capacity(event.paths.len());
    for path in &event.paths {
        let is_root = roots.iter().any(|r| r == path);
        if !roots.iter().any(|r| path.starts_with(r)) {
            continue;
        }

        if is_root && opts.watch_root && base & (bits::ITEM_REMOVED | bits::ITEM_RENAMED) != 0 {
            out.push((bits::ROOT_CHANGED, path.clone()));
            continue;
        }

        if opts.file_events {
            out.push((base | type_bits(&event.kind, path), path.clone()));
        } else {
            let dir = if is_root {
                path.clone()
            } else {
                path.parent().map(Path::to_path_buf).unwrap_or_else(|| path.clone())
            };
            out.push((base & bits::MUST_SCAN_SUB_DIRS, dir));
        }
    }
    out
}

fn kind_bits(kind: &EventKind) -> u32 {
    match kind {
        EventKind::Create(_) => bits::ITEM_CREATED,
        EventKind::Remove(_) => bits::ITEM_REMOVED,
        EventKind::Modify(ModifyKind::Name(_)) => bits::ITEM_RENAMED,
        EventKind::Modify(ModifyKind::Metadata(MetadataKind::Ownership)) => bits::ITEM_CHANGE_OWNER,
        EventKind::Modify(ModifyKind::Metadata(MetadataKind::Extended)) => bits::ITEM_XATTR_MOD,
        EventKind::Modify(ModifyKind::Metadata(_)) => bits::ITEM_INODE_META_MOD,
        EventKind::Modify(_) => bits::ITEM_MODIFIED,
        _ => 0,
    }
}

fn type_bits(kind: &EventKind, path: &Path) -> u32 {
    match kind {
        EventKind::Create(CreateKind::File) | EventKind::Remove(RemoveKind::File) => {
            bits::ITEM_IS_FILE
        }
        EventKind::Create(CreateKind::Folder) | EventKind::Remove(RemoveKind::Folder) => {
            bits::ITEM_IS_DIR
        }
        _ => match std::fs::symlink_metadata(path) {
            Ok(meta) if meta.file_type().is_symlink() => bits::ITEM_IS_SYMLINK,
            Ok(meta) if meta.is_dir() => bits::ITEM_IS_DIR,
            Ok(_) => bits::ITEM_IS_FILE,
            Err(_) => 0,
        },
    }
}
