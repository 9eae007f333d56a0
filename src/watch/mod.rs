// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Tracking `(mtime, size)` per path to suppress redundant events (`cache`).
//! - Classifying raw events against the config (`filter`).
//! - Wiring up a cross-platform filesystem watcher (`notify`) and keeping
//!   the set of watched directories in sync with the tree (`watcher`).
//! - Delivering events through a bounded, drop-on-overflow queue (`queue`).
//!
//! It does **not** run builds; it only decides which events matter.

pub mod cache;
pub mod filter;
pub mod path_utils;
pub mod queue;
pub mod watcher;

pub use cache::{FileRecord, FileStateCache};
pub use filter::{Change, ChangeFilter, Decision, IgnoreReason};
pub use queue::{event_queue, EventReceiver, EventSender, DEFAULT_QUEUE_CAPACITY};
pub use watcher::{translate, NotifyRegistry, WatchRegistry, WatchSet};
