//! Cooperative shutdown signal shared by the background workers.
//!
//! The signal and its listeners share the only sender of a zero-capacity
//! channel that never carries a message. Triggering drops that sender, which
//! disconnects every [`ShutdownListener`] at once and wakes any worker parked
//! in [`Pause::pause`] or in a `select!` over the listener. Dropping the
//! signal without triggering it leaves the listeners running.

use std::{ops::ControlFlow, sync::Arc, time::Duration};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, bounded};
use parking_lot::Mutex;

/// Suspends a worker between iterations.
///
/// Returns [`ControlFlow::Break`] when the worker should stop instead of
/// carrying on. Production code pauses on a [`ShutdownListener`]; tests inject
/// implementations that record the requested delays without sleeping.
pub trait Pause {
    fn pause(&self, duration: Duration) -> ControlFlow<()>;
}

/// Owner side of the shutdown signal.
#[derive(Debug)]
pub struct ShutdownSignal {
    listener: ShutdownListener,
}

type Trigger = Arc<Mutex<Option<Sender<()>>>>;

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (tx, rx) = bounded(0);
        Self {
            listener: ShutdownListener {
                rx,
                trigger: Arc::new(Mutex::new(Some(tx))),
            },
        }
    }

    /// Hand out a listener for a worker.
    pub fn listener(&self) -> ShutdownListener {
        self.listener.clone()
    }

    /// Request shutdown. Returns `false` if it had already been requested.
    pub fn trigger(&self) -> bool {
        self.listener.trigger.lock().take().is_some()
    }

    pub fn is_triggered(&self) -> bool {
        self.listener.is_triggered()
    }
}

/// Worker side of the shutdown signal.
///
/// Holds the trigger alive so only [`ShutdownSignal::trigger`] disconnects it.
#[derive(Clone, Debug)]
pub struct ShutdownListener {
    rx: Receiver<()>,
    trigger: Trigger,
}

impl ShutdownListener {
    pub fn is_triggered(&self) -> bool {
        matches!(self.rx.try_recv(), Err(TryRecvError::Disconnected))
    }

    pub(crate) fn receiver(&self) -> &Receiver<()> {
        &self.rx
    }
}

impl Pause for ShutdownListener {
    fn pause(&self, duration: Duration) -> ControlFlow<()> {
        match self.rx.recv_timeout(duration) {
            Err(RecvTimeoutError::Timeout) => ControlFlow::Continue(()),
            Ok(()) | Err(RecvTimeoutError::Disconnected) => ControlFlow::Break(()),
        }
    }
}
