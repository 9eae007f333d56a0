// src/watch/cache.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use anyhow::Result;
use tracing::{debug, trace};

use crate::fs::FileSystem;
use crate::watch::path_utils::{is_under, key_to_path, watch_key};

/// Last observed state of one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Root-relative key (see [`watch_key`]).
    pub path: String,
    pub modified: SystemTime,
    pub size: u64,
    pub is_dir: bool,
}

/// In-memory cache of `(mtime, size)` per watched path.
///
/// Used to tell real content changes apart from redundant notifications.
/// A missing record means "never recorded", not "does not exist".
///
/// All operations take the same lock, so the cache can be shared freely
/// behind an `Arc`.
#[derive(Debug)]
pub struct FileStateCache {
    root: PathBuf,
    fs: Arc<dyn FileSystem>,
    records: Mutex<HashMap<String, FileRecord>>,
}

impl FileStateCache {
    pub fn new(root: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            root: root.into(),
            fs,
            records: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Cache key for an absolute (or root-relative) path.
    pub fn key_for(&self, path: &Path) -> String {
        watch_key(&self.root, path)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, FileRecord>> {
        // A panic while holding the lock cannot leave a half-written record.
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, key: &str) -> Option<FileRecord> {
        self.lock().get(key).cloned()
    }

    /// Stat `key` now and store (or overwrite) its record.
    pub fn add(&self, key: &str) -> Result<FileRecord> {
        let stat = self.fs.stat(&key_to_path(&self.root, key))?;
        let record = FileRecord {
            path: key.to_string(),
            modified: stat.modified,
            size: stat.len,
            is_dir: stat.is_dir,
        };
        trace!(path = %key, size = record.size, is_dir = record.is_dir, "recording file state");
        self.lock().insert(key.to_string(), record.clone());
        Ok(record)
    }

    /// True if `key` was never recorded or its `(mtime, size)` changed since
    /// the last [`add`](Self::add).
    ///
    /// Never refreshes the stored record; callers that want to stop
    /// re-triggering on the same state must call `add` themselves.
    pub fn is_modified(&self, key: &str) -> bool {
        let Some(record) = self.get(key) else {
            return true;
        };
        match self.fs.stat(&key_to_path(&self.root, key)) {
            Ok(stat) => stat.modified != record.modified || stat.len != record.size,
            Err(err) => {
                debug!(path = %key, error = %err, "stat failed for recorded path; treating as modified");
                true
            }
        }
    }

    /// Drop the record for `key`. Absent keys are fine.
    pub fn remove(&self, key: &str) -> Option<FileRecord> {
        let removed = self.lock().remove(key);
        if removed.is_some() {
            trace!(path = %key, "removed file state");
        }
        removed
    }

    /// Drop `key` and every record nested below it. Returns how many records
    /// were removed.
    pub fn remove_tree(&self, key: &str) -> usize {
        let mut records = self.lock();
        let before = records.len();
        records.retain(|k, _| k != key && !is_under(key, k));
        let removed = before - records.len();
        if removed > 0 {
            debug!(path = %key, removed, "removed file state for directory tree");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
