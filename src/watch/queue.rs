// src/watch/queue.rs

//! Bounded delivery queue between the notifier and the event loop.
//!
//! The notifier callback runs on a thread we do not control and must never
//! block, so pushes use `try_send`. When the queue is full the event is
//! dropped and counted. The only coalescing downstream is the cache's
//! modified check.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use crate::types::FsEvent;

/// Default number of events buffered between notifier and event loop.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// Create a bounded event queue. `capacity` is clamped to at least 1.
pub fn event_queue(capacity: usize) -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let dropped = Arc::new(AtomicU64::new(0));
    (
        EventSender {
            tx,
            dropped: Arc::clone(&dropped),
        },
        EventReceiver { rx, dropped },
    )
}

/// Producer side; cheap to clone.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::Sender<FsEvent>,
    dropped: Arc<AtomicU64>,
}

impl EventSender {
    /// Enqueue without blocking. Returns `false` if the event was dropped.
    pub fn push(&self, event: FsEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(
                    path = %event.path.display(),
                    kind = %event.kind,
                    dropped_total = total,
                    "event queue full; dropping filesystem event"
                );
                false
            }
            Err(TrySendError::Closed(event)) => {
                debug!(path = %event.path.display(), "event queue closed; discarding event");
                false
            }
        }
    }

    /// Number of events dropped on overflow so far.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Consumer side, owned by the event loop.
#[derive(Debug)]
pub struct EventReceiver {
    rx: mpsc::Receiver<FsEvent>,
    dropped: Arc<AtomicU64>,
}

impl EventReceiver {
    /// Next event in delivery order; `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<FsEvent> {
        self.rx.recv().await
    }

    /// Non-blocking variant of [`recv`](Self::recv).
    pub fn try_recv(&mut self) -> Option<FsEvent> {
        self.rx.try_recv().ok()
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
