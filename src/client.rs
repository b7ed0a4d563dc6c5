//! Public client facade.
//!
//! `ScribeClient` wires an [`EntryQueue`], a [`ConnectionManager`] and a
//! [`BatchSender`] together. Construction starts both workers and returns at
//! once; `log` never blocks and never reports failure.

use std::{fmt, sync::Arc, thread::JoinHandle};

use log::warn;
use parking_lot::Mutex;

use crate::{
    config::ScribeConfig,
    connection::{ConnectionManager, ConnectionSlot},
    log_entry::LogEntry,
    queue::EntryQueue,
    rate_limited_warner::RateLimitedWarner,
    sender::BatchSender,
    shutdown::ShutdownSignal,
    transport::{FramedTransport, Transport},
};

/// Fire-and-forget log shipping client.
pub struct ScribeClient {
    config: ScribeConfig,
    queue: Arc<EntryQueue>,
    slot: Arc<ConnectionSlot>,
    shutdown: ShutdownSignal,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl ScribeClient {
    /// Start a client shipping to `config.address()` over the bundled
    /// [`FramedTransport`].
    pub fn new(config: ScribeConfig) -> Self {
        let transport = FramedTransport::from_config(&config);
        Self::with_transport(config, transport)
    }

    /// Start a client shipping through `transport`.
    pub fn with_transport<T: Transport>(config: ScribeConfig, transport: T) -> Self {
        let queue = Arc::new(EntryQueue::new(
            config.queue_capacity(),
            RateLimitedWarner::new(config.warn_interval()),
        ));
        let slot = Arc::new(ConnectionSlot::new());
        let shutdown = ShutdownSignal::new();

        let manager = ConnectionManager::new(transport, Arc::clone(&slot), &config)
            .spawn(shutdown.listener());
        let sender = BatchSender::new(Arc::clone(&queue), Arc::clone(&slot), &config)
            .spawn(shutdown.listener());

        Self {
            config,
            queue,
            slot,
            shutdown,
            workers: Mutex::new(vec![manager, sender]),
        }
    }

    /// Whether a connection to the collector is currently published.
    pub fn is_open(&self) -> bool {
        self.slot.is_open()
    }

    /// Queue an entry for shipping.
    ///
    /// The entry is silently dropped when the queue is full or the client has
    /// been shut down.
    pub fn log(&self, category: &str, message: &str) {
        if self.shutdown.is_triggered() {
            return;
        }
        self.queue.enqueue(LogEntry::new(category, message));
    }

    /// Entries waiting to be shipped.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn config(&self) -> &ScribeConfig {
        &self.config
    }

    /// Stop both workers and wait for them to exit.
    ///
    /// Entries still queued are shipped first if a connection is live. Later
    /// `log` calls are ignored. Without a call to `shutdown` the workers run
    /// until the process exits; dropping the client does not stop them.
    /// Waiting may last up to the connect timeout when a connection attempt is
    /// in flight.
    pub fn shutdown(&self) {
        if !self.shutdown.trigger() {
            return;
        }
        let workers = std::mem::take(&mut *self.workers.lock());
        for worker in workers {
            if worker.join().is_err() {
                warn!("ScribeClient worker thread panicked");
            }
        }
    }
}

impl fmt::Debug for ScribeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScribeClient")
            .field("address", &self.config.address())
            .field("open", &self.is_open())
            .field("pending", &self.pending())
            .finish()
    }
}
