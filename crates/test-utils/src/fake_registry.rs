use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use xrun::errors::{Result, XrunError};
use xrun::watch::WatchRegistry;

#[derive(Debug, Default)]
struct Calls {
    watched: BTreeSet<PathBuf>,
    unwatched: Vec<PathBuf>,
    failing: BTreeSet<PathBuf>,
}

/// Records `watch` / `unwatch` calls instead of talking to the OS.
#[derive(Debug, Clone, Default)]
pub struct FakeRegistry {
    calls: Arc<Mutex<Calls>>,
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `watch(path)` fail.
    pub fn fail_on(&self, path: impl Into<PathBuf>) {
        self.calls.lock().unwrap().failing.insert(path.into());
    }

    pub fn watched(&self) -> BTreeSet<PathBuf> {
        self.calls.lock().unwrap().watched.clone()
    }

    pub fn is_watched(&self, path: impl AsRef<Path>) -> bool {
        self.calls.lock().unwrap().watched.contains(path.as_ref())
    }

    pub fn unwatched(&self) -> Vec<PathBuf> {
        self.calls.lock().unwrap().unwatched.clone()
    }
}

impl WatchRegistry for FakeRegistry {
    fn watch(&mut self, dir: &Path) -> Result<()> {
        let mut calls = self.calls.lock().unwrap();
        if calls.failing.contains(dir) {
            return Err(XrunError::IoError(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                format!("fake watch failure for {}", dir.display()),
            )));
        }
        calls.watched.insert(dir.to_path_buf());
        Ok(())
    }

    fn unwatch(&mut self, dir: &Path) -> Result<()> {
        let mut calls = self.calls.lock().unwrap();
        calls.watched.remove(dir);
        calls.unwatched.push(dir.to_path_buf());
        Ok(())
    }
}
