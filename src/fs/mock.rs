// src/fs/mock.rs

use super::{FileStat, FileSystem};
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File { len: u64, modified: SystemTime },
    Dir { children: Vec<String>, modified: SystemTime },
}

#[derive(Debug, Default)]
struct MockState {
    entries: HashMap<PathBuf, MockEntry>,
    unreadable: Vec<PathBuf>,
    clock: u64,
}

impl MockState {
    /// Monotonic fake mtime; every mutation gets a fresh second.
    fn tick(&mut self) -> SystemTime {
        self.clock += 1;
        SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000 + self.clock)
    }
}

/// In-memory filesystem for tests.
///
/// Paths are used verbatim as keys, so tests should stick to one spelling
/// (typically absolute paths like `/proj/main.go`).
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<MockState>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create or overwrite a file, bumping its mtime.
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl AsRef<[u8]>) {
        let path = path.as_ref().to_path_buf();
        let mut state = self.lock();
        let modified = state.tick();
        ensure_parent(&mut state, &path, modified);
        state.entries.insert(
            path,
            MockEntry::File {
                len: content.as_ref().len() as u64,
                modified,
            },
        );
    }

    /// Create a directory (and its parents).
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        let mut state = self.lock();
        let modified = state.tick();
        ensure_dir(&mut state, &path, modified);
    }

    /// Overwrite the mtime of an existing entry.
    pub fn set_modified(&self, path: impl AsRef<Path>, at: SystemTime) {
        let mut state = self.lock();
        match state.entries.get_mut(path.as_ref()) {
            Some(MockEntry::File { modified, .. }) | Some(MockEntry::Dir { modified, .. }) => {
                *modified = at;
            }
            None => {}
        }
    }

    /// Remove an entry and everything below it.
    pub fn remove(&self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        let mut state = self.lock();
        state.entries.retain(|p, _| !p.starts_with(&path));

        if let Some(parent) = path.parent() {
            let name = file_name(&path);
            if let Some(MockEntry::Dir { children, .. }) = state.entries.get_mut(parent) {
                children.retain(|c| Some(c) != name.as_ref());
            }
        }
    }

    /// Make `read_dir` fail for `path`.
    pub fn make_unreadable(&self, path: impl AsRef<Path>) {
        self.lock().unreadable.push(path.as_ref().to_path_buf());
    }
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().and_then(|n| n.to_str()).map(str::to_string)
}

fn ensure_parent(state: &mut MockState, path: &Path, modified: SystemTime) {
    let Some(parent) = path.parent() else {
        return;
    };
    if parent.as_os_str().is_empty() {
        return;
    }
    ensure_dir(state, parent, modified);
    if let (Some(name), Some(MockEntry::Dir { children, .. })) =
        (file_name(path), state.entries.get_mut(parent))
    {
        if !children.contains(&name) {
            children.push(name);
        }
    }
}

fn ensure_dir(state: &mut MockState, path: &Path, modified: SystemTime) {
    if state.entries.contains_key(path) {
        return;
    }
    state.entries.insert(
        path.to_path_buf(),
        MockEntry::Dir {
            children: Vec::new(),
            modified,
        },
    );
    ensure_parent(state, path, modified);
}

impl FileSystem for MockFileSystem {
    fn stat(&self, path: &Path) -> Result<FileStat> {
        let state = self.lock();
        match state.entries.get(path) {
            Some(MockEntry::File { len, modified }) => Ok(FileStat {
                modified: *modified,
                len: *len,
                is_dir: false,
            }),
            Some(MockEntry::Dir { children, modified }) => Ok(FileStat {
                modified: *modified,
                len: children.len() as u64,
                is_dir: true,
            }),
            None => Err(anyhow!("No such file or directory: {:?}", path)),
        }
    }

    fn is_symlink(&self, _path: &Path) -> bool {
        false
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let state = self.lock();
        if state.unreadable.iter().any(|p| p == path) {
            return Err(anyhow!("Permission denied: {:?}", path));
        }
        match state.entries.get(path) {
            Some(MockEntry::Dir { children, .. }) => {
                Ok(children.iter().map(|name| path.join(name)).collect())
            }
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }
}
