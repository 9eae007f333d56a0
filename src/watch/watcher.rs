// src/watch/watcher.rs

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind as NotifyKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::errors::Result;
use crate::fs::{walk, FileSystem};
use crate::types::{EventKind, FsEvent};
use crate::watch::cache::FileStateCache;
use crate::watch::queue::EventSender;

/// Registration capability of the underlying notifier.
///
/// Production code uses [`NotifyRegistry`]; tests can record calls instead.
pub trait WatchRegistry: Send {
    /// Start watching `dir` (non-recursively).
    fn watch(&mut self, dir: &Path) -> Result<()>;
    fn unwatch(&mut self, dir: &Path) -> Result<()>;
}

/// `notify`-backed registry feeding an [`EventSender`].
///
/// Dropping this stops all watching.
pub struct NotifyRegistry {
    inner: RecommendedWatcher,
}

impl std::fmt::Debug for NotifyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyRegistry").finish()
    }
}

impl NotifyRegistry {
    /// Create the platform watcher. Nothing is watched until
    /// [`WatchRegistry::watch`] is called.
    pub fn new(sender: EventSender) -> Result<Self> {
        // Called synchronously by notify on its own thread.
        let inner = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    for fs_event in translate(event) {
                        sender.push(fs_event);
                    }
                }
                Err(err) => {
                    warn!(error = %err, "file watch error");
                }
            },
            notify::Config::default(),
        )?;
        Ok(Self { inner })
    }
}

impl WatchRegistry for NotifyRegistry {
    fn watch(&mut self, dir: &Path) -> Result<()> {
        self.inner.watch(dir, RecursiveMode::NonRecursive)?;
        Ok(())
    }

    fn unwatch(&mut self, dir: &Path) -> Result<()> {
        self.inner.unwatch(dir)?;
        Ok(())
    }
}

/// Translate one `notify` event into zero or more [`FsEvent`]s.
///
/// - `Create` -> create
/// - rename "to" -> create (an entry appeared at this path)
/// - rename "from" -> rename
/// - rename "both" -> rename for the old path, create for the new one
/// - other `Modify` -> modify
/// - `Remove` -> delete
/// - access and unknown events are dropped
pub fn translate(event: Event) -> Vec<FsEvent> {
    let kind = match event.kind {
        NotifyKind::Create(_) => EventKind::Create,
        NotifyKind::Modify(ModifyKind::Name(RenameMode::To)) => EventKind::Create,
        NotifyKind::Modify(ModifyKind::Name(RenameMode::From)) => EventKind::Rename,
        NotifyKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            let mut paths = event.paths.into_iter();
            let mut out = Vec::new();
            if let Some(from) = paths.next() {
                out.push(FsEvent::new(from, EventKind::Rename));
            }
            if let Some(to) = paths.next() {
                out.push(FsEvent::new(to, EventKind::Create));
            }
            return out;
        }
        NotifyKind::Modify(_) => EventKind::Modify,
        NotifyKind::Remove(_) => EventKind::Delete,
        NotifyKind::Access(_) | NotifyKind::Any | NotifyKind::Other => return Vec::new(),
    };

    event
        .paths
        .into_iter()
        .map(|path| FsEvent::new(path, kind))
        .collect()
}

/// The live set of watched directories.
///
/// Grows on directory creation and shrinks on removal. Every directory
/// registered here also has a record in the [`FileStateCache`], so later
/// removals can be recognised as directories.
pub struct WatchSet<R: WatchRegistry> {
    registry: R,
    fs: Arc<dyn FileSystem>,
    watched: BTreeSet<PathBuf>,
}

impl<R: WatchRegistry> std::fmt::Debug for WatchSet<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchSet")
            .field("watched", &self.watched)
            .finish_non_exhaustive()
    }
}

impl<R: WatchRegistry> WatchSet<R> {
    pub fn new(registry: R, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            registry,
            fs,
            watched: BTreeSet::new(),
        }
    }

    /// Register every directory under `root`, plus any `IncludeDirs` not
    /// already nested under it, and seed `cache` with every directory and
    /// file found outside the excluded trees.
    ///
    /// Excluded directories are still watched; their events are filtered
    /// per event, before the cache is consulted, so they get no records.
    /// Any failure is returned and is fatal for startup.
    pub fn register_initial(
        &mut self,
        root: &Path,
        config: &Config,
        cache: &FileStateCache,
    ) -> Result<()> {
        let mut trees = vec![root.to_path_buf()];
        for dir in &config.include_dirs {
            if dir.starts_with(root) {
                debug!(dir = %dir.display(), "include dir already under root");
                continue;
            }
            trees.push(dir.clone());
        }

        for tree in trees {
            let listing = walk(self.fs.as_ref(), &tree)
                .with_context(|| format!("walking {}", tree.display()))?;

            for dir in &listing.dirs {
                self.register(dir)?;
            }
            let mut skipped = 0usize;
            for path in listing.dirs.iter().chain(listing.files.iter()) {
                let key = cache.key_for(path);
                if config.is_excluded_dir(&key) {
                    skipped += 1;
                    continue;
                }
                if let Err(err) = cache.add(&key) {
                    debug!(path = %key, error = %err, "could not record initial state");
                }
            }

            info!(
                tree = %tree.display(),
                dirs = listing.dirs.len(),
                files = listing.files.len(),
                skipped,
                "watching directory tree"
            );
        }

        Ok(())
    }

    /// Register a single directory. Already-watched directories are a no-op.
    pub fn register(&mut self, dir: &Path) -> Result<()> {
        if self.watched.contains(dir) {
            return Ok(());
        }
        self.registry.watch(dir)?;
        self.watched.insert(dir.to_path_buf());
        debug!(dir = %dir.display(), "watch added");
        Ok(())
    }

    /// Register a newly created directory and anything already inside it
    /// (e.g. `mkdir -p a/b/c` or a tree moved in). Failures are logged, never
    /// returned. Returns the number of directories registered.
    pub fn register_tree(&mut self, dir: &Path, cache: &FileStateCache) -> usize {
        let listing = match walk(self.fs.as_ref(), dir) {
            Ok(listing) => listing,
            Err(err) => {
                warn!(dir = %dir.display(), error = %err, "failed to walk new directory");
                return 0;
            }
        };

        let mut added = 0;
        for sub in &listing.dirs {
            match self.register(sub) {
                Ok(()) => {
                    added += 1;
                    let key = cache.key_for(sub);
                    if let Err(err) = cache.add(&key) {
                        debug!(path = %key, error = %err, "could not record directory state");
                    }
                }
                Err(err) => {
                    warn!(dir = %sub.display(), error = %err, "failed to add watch");
                }
            }
        }
        added
    }

    /// Deregister `dir` and every watched directory below it.
    ///
    /// Errors are logged: the kernel usually drops the watch on its own when
    /// a directory is deleted, so unwatch failing here is expected.
    pub fn deregister(&mut self, dir: &Path) -> usize {
        let nested: Vec<PathBuf> = self
            .watched
            .iter()
            .filter(|p| p.starts_with(dir))
            .cloned()
            .collect();

        for path in &nested {
            if let Err(err) = self.registry.unwatch(path) {
                debug!(dir = %path.display(), error = %err, "unwatch failed");
            }
            self.watched.remove(path);
        }
        if !nested.is_empty() {
            debug!(dir = %dir.display(), removed = nested.len(), "watch removed");
        }
        nested.len()
    }

    pub fn contains(&self, dir: &Path) -> bool {
        self.watched.contains(dir)
    }

    pub fn len(&self) -> usize {
        self.watched.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watched.is_empty()
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }
}
