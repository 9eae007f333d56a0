// src/fs/mod.rs

use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};

pub mod mock;

/// Snapshot of the metadata the watcher cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub modified: SystemTime,
    pub len: u64,
    pub is_dir: bool,
}

/// Abstract filesystem interface.
pub trait FileSystem: Send + Sync + Debug {
    /// Stat `path`, following symlinks.
    fn stat(&self, path: &Path) -> Result<FileStat>;

    /// True if `path` itself is a symlink. Walks do not descend into those.
    fn is_symlink(&self, path: &Path) -> bool;

    /// Return a list of entries in a directory.
    /// Returns full paths.
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn stat(&self, path: &Path) -> Result<FileStat> {
        let meta = fs::metadata(path).with_context(|| format!("stat {:?}", path))?;
        let modified = meta
            .modified()
            .with_context(|| format!("reading mtime of {:?}", path))?;
        Ok(FileStat {
            modified,
            len: meta.len(),
            is_dir: meta.is_dir(),
        })
    }

    fn is_symlink(&self, path: &Path) -> bool {
        fs::symlink_metadata(path)
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false)
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

/// Result of walking a directory tree.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Walk {
    /// Every directory, including the walk root.
    pub dirs: Vec<PathBuf>,
    pub files: Vec<PathBuf>,
}

/// Walk `root` depth-first, collecting directories and files.
///
/// Symlinked directories are skipped.
/// Any unreadable directory aborts the walk.
pub fn walk(fs: &dyn FileSystem, root: &Path) -> Result<Walk> {
    let root_stat = fs.stat(root)?;
    if !root_stat.is_dir {
        anyhow::bail!("{:?} is not a directory", root);
    }

    let mut out = Walk::default();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let mut children = fs.read_dir(&dir)?;
        children.sort();
        out.dirs.push(dir);

        for path in children {
            // Entries can vanish mid-walk; that is not a walk failure.
            let Ok(stat) = fs.stat(&path) else {
                continue;
            };
            if stat.is_dir {
                if fs.is_symlink(&path) {
                    continue;
                }
                stack.push(path);
            } else {
                out.files.push(path);
            }
        }
    }

    Ok(out)
}
