use std::fmt;
use std::path::PathBuf;

/// Kind of a filesystem change, after translation from the raw notifier
/// event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Create,
    Modify,
    Delete,
    Rename,
}

impl EventKind {
    /// Delete and rename both mean "the entry at this path is gone".
    pub fn is_removal(self) -> bool {
        matches!(self, EventKind::Delete | EventKind::Rename)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventKind::Create => "create",
            EventKind::Modify => "modify",
            EventKind::Delete => "delete",
            EventKind::Rename => "rename",
        };
        f.write_str(s)
    }
}

/// A single filesystem event as consumed by the event loop.
///
/// `path` is whatever the notifier reported, usually absolute. Conversion to
/// a root-relative key happens in the change filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEvent {
    pub path: PathBuf,
    pub kind: EventKind,
}

impl FsEvent {
    pub fn new(path: impl Into<PathBuf>, kind: EventKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}
