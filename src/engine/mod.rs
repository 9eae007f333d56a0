// src/engine/mod.rs

//! Event loop tying the watcher to the build supervisor.
//!
//! Filesystem events flow from the notifier through the bounded
//! [`crate::watch::queue`] into a single [`EventLoop`] consumer, which
//! classifies each one and then maintains the watch set or triggers a
//! build/restart cycle.

pub mod event_loop;

pub use event_loop::{EventLoop, StepOutcome};
