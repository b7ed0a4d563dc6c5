//! Bounded entry buffer between producers and the batch sender.
//!
//! Producers never block: once the queue holds `capacity` entries every new
//! entry is discarded and the drop is counted for a rate-limited warning.
//! Older entries are never evicted, so the queue always holds the oldest
//! unsent entries in arrival order.

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded, select};
use log::warn;

use crate::{
    log_entry::LogEntry, rate_limited_warner::RateLimitedWarner, shutdown::ShutdownListener,
};

/// Thread-safe FIFO of pending [`LogEntry`] values.
#[derive(Debug)]
pub struct EntryQueue {
    tx: Sender<LogEntry>,
    rx: Receiver<LogEntry>,
    capacity: usize,
    warner: RateLimitedWarner,
}

impl EntryQueue {
    /// Create a queue holding at most `capacity` entries.
    ///
    /// A `capacity` of zero is raised to one; a zero-capacity channel would
    /// turn every enqueue into a rendezvous with the consumer.
    pub fn new(capacity: usize, warner: RateLimitedWarner) -> Self {
        let capacity = capacity.max(1);
        let (tx, rx) = bounded(capacity);
        Self {
            tx,
            rx,
            capacity,
            warner,
        }
    }

    /// Append `entry` if there is room, otherwise discard it.
    ///
    /// The return value only reports whether the entry was kept; callers on
    /// the logging hot path are expected to ignore it.
    pub fn enqueue(&self, entry: LogEntry) -> bool {
        match self.tx.try_send(entry) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.warner.record_drop();
                self.warner.warn_if_due(|count| {
                    warn!("ScribeClient queue full; dropped {count} log entries");
                });
                false
            }
            // The queue owns its receiver, so this only happens mid-teardown.
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Wait for the next entry.
    ///
    /// Returns `None` once `shutdown` has been triggered, even if entries are
    /// still queued; callers drain the remainder with [`try_dequeue`].
    ///
    /// [`try_dequeue`]: EntryQueue::try_dequeue
    pub fn dequeue_blocking(&self, shutdown: &ShutdownListener) -> Option<LogEntry> {
        select! {
            recv(self.rx) -> entry => entry.ok(),
            recv(shutdown.receiver()) -> _ => None,
        }
    }

    /// Take the next entry if one is immediately available.
    pub fn try_dequeue(&self) -> Option<LogEntry> {
        self.rx.try_recv().ok()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Report any drops that have not been warned about yet.
    pub fn flush_drop_warnings(&self) {
        self.warner.flush(|count| {
            warn!("ScribeClient queue full; dropped {count} log entries");
        });
    }
}
