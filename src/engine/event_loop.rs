// src/engine/event_loop.rs

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::errors::XrunError;
use crate::exec::BuildSupervisor;
use crate::types::FsEvent;
use crate::watch::cache::FileStateCache;
use crate::watch::filter::{ChangeFilter, Decision};
use crate::watch::queue::EventReceiver;
use crate::watch::watcher::{WatchRegistry, WatchSet};

/// What the loop did with one event. Returned for tests and logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Classified and dropped, or a watch-set change only.
    Handled(Decision),
    /// A rebuild ran; `ok` tells whether the application is up again.
    Rebuilt { decision: Decision, ok: bool },
}

/// Single consumer of filesystem events.
///
/// For each event, in delivery order: classify with the [`ChangeFilter`],
/// then either update the [`WatchSet`] or run a build cycle on the
/// [`BuildSupervisor`]. The build runs inline, so events that arrive during a
/// build wait in the queue.
pub struct EventLoop<R: WatchRegistry> {
    events: EventReceiver,
    filter: ChangeFilter,
    cache: Arc<FileStateCache>,
    watches: WatchSet<R>,
    supervisor: Arc<BuildSupervisor>,
}

impl<R: WatchRegistry> fmt::Debug for EventLoop<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLoop")
            .field("watches", &self.watches)
            .field("supervisor", &self.supervisor)
            .finish_non_exhaustive()
    }
}

impl<R: WatchRegistry> EventLoop<R> {
    pub fn new(
        events: EventReceiver,
        filter: ChangeFilter,
        cache: Arc<FileStateCache>,
        watches: WatchSet<R>,
        supervisor: Arc<BuildSupervisor>,
    ) -> Self {
        Self {
            events,
            filter,
            cache,
            watches,
            supervisor,
        }
    }

    pub fn watches(&self) -> &WatchSet<R> {
        &self.watches
    }

    /// Drain the queue until every sender is gone.
    ///
    /// Per-event failures are logged and never end the loop.
    pub async fn run(mut self) {
        info!("event loop started");

        while let Some(event) = self.events.recv().await {
            self.handle_event(event).await;
        }

        info!(dropped = self.events.dropped(), "event queue closed; event loop exiting");
    }

    /// Process every event currently queued, without waiting for more.
    pub async fn drain(&mut self) -> Vec<StepOutcome> {
        let mut outcomes = Vec::new();
        while let Some(event) = self.events.try_recv() {
            outcomes.push(self.handle_event(event).await);
        }
        outcomes
    }

    /// Handle one event end to end.
    pub async fn handle_event(&mut self, event: FsEvent) -> StepOutcome {
        let decision = self.filter.classify(&event, &self.cache);
        debug!(path = %event.path.display(), kind = %event.kind, ?decision, "event classified");

        match &decision {
            Decision::Ignore(_) => StepOutcome::Handled(decision),
            Decision::WatchAdd(dir) => {
                let added = self.watches.register_tree(dir, &self.cache);
                if added > 0 {
                    info!(dir = %dir.display(), added, "watching new directory");
                }
                StepOutcome::Handled(decision)
            }
            Decision::WatchRemove(dir) => {
                self.watches.deregister(dir);
                info!(dir = %dir.display(), "directory removed; watch dropped");
                StepOutcome::Handled(decision)
            }
            Decision::Rebuild(change) => {
                if change.records_baseline() {
                    // New baseline, so the same state does not rebuild twice.
                    if let Err(err) = self.cache.add(&change.key) {
                        debug!(path = %change.key, error = %err, "could not record baseline");
                    }
                }
                info!(path = %change.key, kind = %change.kind, "change detected; rebuilding");

                let ok = match self.supervisor.trigger().await {
                    Ok(()) => true,
                    Err(XrunError::BuildFailed { code }) => {
                        warn!(path = %change.key, ?code, "rebuild failed; waiting for the next change");
                        false
                    }
                    Err(err) => {
                        warn!(path = %change.key, error = %err, "rebuild cycle failed");
                        false
                    }
                };
                StepOutcome::Rebuilt { decision, ok }
            }
        }
    }
}
