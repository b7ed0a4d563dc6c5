//! Worker that drains the entry queue into batches.
//!
//! Each iteration waits for a live connection (polling the slot), blocks for
//! the first entry, then greedily adds whatever is already queued up to
//! `max_batch_size` before shipping. A batch is never held back waiting for
//! more entries. Failed batches are dropped, never re-queued.

use std::{
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};

use log::{debug, warn};

use crate::{
    config::{ScribeConfig, SendFailurePolicy},
    connection::ConnectionSlot,
    log_entry::LogEntry,
    queue::EntryQueue,
    rate_limited_warner::RateLimitedWarner,
    shutdown::{Pause, ShutdownListener},
    transport::Connection,
};

pub struct BatchSender {
    queue: Arc<EntryQueue>,
    slot: Arc<ConnectionSlot>,
    max_batch_size: usize,
    poll_interval: Duration,
    policy: SendFailurePolicy,
    warner: RateLimitedWarner,
}

impl BatchSender {
    pub fn new(queue: Arc<EntryQueue>, slot: Arc<ConnectionSlot>, config: &ScribeConfig) -> Self {
        Self {
            queue,
            slot,
            max_batch_size: config.max_batch_size(),
            poll_interval: config.poll_interval(),
            policy: config.send_failure_policy(),
            warner: RateLimitedWarner::new(config.warn_interval()),
        }
    }

    /// Ship batches until `shutdown` is triggered, then drain what is left.
    pub fn run(&self, shutdown: &ShutdownListener) {
        loop {
            let Some(connection) = self.slot.current() else {
                if shutdown.pause(self.poll_interval).is_break() {
                    break;
                }
                continue;
            };
            let Some(first) = self.queue.dequeue_blocking(shutdown) else {
                break;
            };
            let batch = self.fill_batch(first);
            self.ship(&connection, &batch);
        }
        self.drain();
    }

    pub fn spawn(self, shutdown: ShutdownListener) -> JoinHandle<()> {
        thread::spawn(move || self.run(&shutdown))
    }

    /// Extend a batch started with `first` from entries already queued.
    fn fill_batch(&self, first: LogEntry) -> Vec<LogEntry> {
        let mut batch = Vec::with_capacity(self.max_batch_size.min(self.queue.len() + 1));
        batch.push(first);
        while batch.len() < self.max_batch_size {
            match self.queue.try_dequeue() {
                Some(entry) => batch.push(entry),
                None => break,
            }
        }
        batch
    }

    fn ship(&self, connection: &Arc<dyn Connection>, batch: &[LogEntry]) -> bool {
        match connection.send(batch) {
            Ok(()) => {
                debug!("ScribeClient sent {} log entries", batch.len());
                true
            }
            Err(err) => {
                self.warner.record_drops(batch.len() as u64);
                self.warner.warn_if_due(|count| {
                    warn!("ScribeClient send failed: {err}; dropped {count} log entries");
                });
                if self.policy == SendFailurePolicy::Reconnect {
                    self.slot.invalidate(connection);
                }
                false
            }
        }
    }

    /// Final best-effort pass after shutdown.
    fn drain(&self) {
        if let Some(connection) = self.slot.current() {
            while let Some(first) = self.queue.try_dequeue() {
                let batch = self.fill_batch(first);
                if !self.ship(&connection, &batch) && self.policy == SendFailurePolicy::Reconnect {
                    break;
                }
            }
        }
        let discarded = self.queue.len();
        if discarded > 0 {
            warn!("ScribeClient shut down with {discarded} unsent log entries");
        }
        self.queue.flush_drop_warnings();
        self.warner.flush(|count| {
            warn!("ScribeClient dropped {count} log entries after failed sends");
        });
    }
}
