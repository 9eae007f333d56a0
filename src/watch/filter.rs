// src/watch/filter.rs

//! Classification of raw filesystem events.
//!
//! [`ChangeFilter::classify`] maps one event to a [`Decision`]. The checks run
//! in a fixed order and the first one that discards the event wins:
//!
//! 1. excluded directory (prefix match on the root-relative key)
//! 2. the build artifact itself
//! 3. delete / rename, resolved through the [`FileStateCache`]
//! 4. create / modify: stat, directory handling, extension policy, and
//!    finally the cache's modified check
//!
//! The only cache mutations done here are removals for deleted entries;
//! recording new baselines is left to the caller.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::config::Config;
use crate::fs::FileSystem;
use crate::types::{EventKind, FsEvent};
use crate::watch::cache::FileStateCache;
use crate::watch::path_utils::watch_key;

/// Why an event was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The path is inside an `ExcludeDirs` entry.
    ExcludedDir,
    /// The path is the artifact produced by the build.
    BuildArtifact,
    /// The path was gone by the time it was stat'ed.
    Vanished,
    /// A directory changed without being created.
    DirectoryChanged,
    /// A source file listed in `ExcludeFiles`.
    ExcludedFile,
    /// A non-source file not listed in `IncludeFiles`.
    NotIncluded,
    /// `(mtime, size)` matches the recorded baseline.
    Unmodified,
}

/// A change that warrants a rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub path: PathBuf,
    pub key: String,
    pub kind: EventKind,
}

impl Change {
    /// True if the changed path still exists and its state should be
    /// recorded as the new baseline.
    pub fn records_baseline(&self) -> bool {
        !self.kind.is_removal()
    }
}

/// Outcome of classifying one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Ignore(IgnoreReason),
    Rebuild(Change),
    /// A directory appeared and should be watched.
    WatchAdd(PathBuf),
    /// A watched directory went away. Its cache records are already gone.
    WatchRemove(PathBuf),
}

/// Pure decision function over events, config and cache state.
#[derive(Debug, Clone)]
pub struct ChangeFilter {
    root: PathBuf,
    config: Arc<Config>,
    artifact_name: String,
    fs: Arc<dyn FileSystem>,
}

impl ChangeFilter {
    pub fn new(
        root: impl Into<PathBuf>,
        config: Arc<Config>,
        artifact_name: impl Into<String>,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            root: root.into(),
            config,
            artifact_name: artifact_name.into(),
            fs,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn classify(&self, event: &FsEvent, cache: &FileStateCache) -> Decision {
        let key = watch_key(&self.root, &event.path);
        trace!(path = %key, kind = %event.kind, "classifying event");

        if self.config.is_excluded_dir(&key) {
            return Decision::Ignore(IgnoreReason::ExcludedDir);
        }

        if key == self.artifact_name {
            return Decision::Ignore(IgnoreReason::BuildArtifact);
        }

        match event.kind {
            EventKind::Delete | EventKind::Rename => self.classify_removal(event, key, cache),
            EventKind::Create | EventKind::Modify => self.classify_update(event, key, cache),
        }
    }

    fn classify_removal(&self, event: &FsEvent, key: String, cache: &FileStateCache) -> Decision {
        match cache.get(&key) {
            None => {
                // Unknown entry: could have been a source file.
                debug!(path = %key, kind = %event.kind, "untracked path removed; rebuilding");
                Decision::Rebuild(Change {
                    path: event.path.clone(),
                    key,
                    kind: event.kind,
                })
            }
            Some(record) if record.is_dir => {
                cache.remove_tree(&key);
                Decision::WatchRemove(event.path.clone())
            }
            Some(_) => {
                cache.remove(&key);
                Decision::Rebuild(Change {
                    path: event.path.clone(),
                    key,
                    kind: event.kind,
                })
            }
        }
    }

    fn classify_update(&self, event: &FsEvent, key: String, cache: &FileStateCache) -> Decision {
        let stat = match self.fs.stat(&event.path) {
            Ok(stat) => stat,
            Err(err) => {
                debug!(path = %key, error = %err, "path vanished before stat");
                return Decision::Ignore(IgnoreReason::Vanished);
            }
        };

        if stat.is_dir {
            return match event.kind {
                EventKind::Create => Decision::WatchAdd(event.path.clone()),
                _ => Decision::Ignore(IgnoreReason::DirectoryChanged),
            };
        }

        if self.config.is_source_file(&key) {
            if self.config.is_excluded_file(&key) {
                return Decision::Ignore(IgnoreReason::ExcludedFile);
            }
        } else if !self.config.is_included_file(&key) {
            return Decision::Ignore(IgnoreReason::NotIncluded);
        }

        if !cache.is_modified(&key) {
            return Decision::Ignore(IgnoreReason::Unmodified);
        }

        Decision::Rebuild(Change {
            path: event.path.clone(),
            key,
            kind: event.kind,
        })
    }
}
