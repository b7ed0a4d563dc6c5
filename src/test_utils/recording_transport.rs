//! In-memory transport that records every batch it receives.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use parking_lot::Mutex;

use crate::{
    log_entry::LogEntry,
    transport::{Connection, ConnectError, SendError, Transport},
};

#[derive(Default)]
struct State {
    offline: AtomicBool,
    connect_failures: AtomicUsize,
    send_failures: AtomicUsize,
    attempts: AtomicUsize,
    connections: AtomicUsize,
    batches: Mutex<Vec<Vec<LogEntry>>>,
    failed: Mutex<Vec<Vec<LogEntry>>>,
}

fn take_one(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

/// Transport double with scriptable connect and send failures.
///
/// Clones share state, so a test can hand one clone to the client and keep
/// another for assertions.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    state: Arc<State>,
}

impl RecordingTransport {
    /// Accept every connection attempt.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the first `failures` connection attempts.
    pub fn failing_first(failures: usize) -> Self {
        let transport = Self::new();
        transport
            .state
            .connect_failures
            .store(failures, Ordering::SeqCst);
        transport
    }

    /// Refuse connections until [`go_online`](Self::go_online) is called.
    pub fn offline() -> Self {
        let transport = Self::new();
        transport.state.offline.store(true, Ordering::SeqCst);
        transport
    }

    pub fn go_online(&self) {
        self.state.offline.store(false, Ordering::SeqCst);
    }

    /// Reject the next `count` batches.
    pub fn fail_next_sends(&self, count: usize) {
        self.state.send_failures.store(count, Ordering::SeqCst);
    }

    /// Connection attempts made so far, successful or not.
    pub fn attempts(&self) -> usize {
        self.state.attempts.load(Ordering::SeqCst)
    }

    /// Successful connection attempts.
    pub fn connections(&self) -> usize {
        self.state.connections.load(Ordering::SeqCst)
    }

    /// Accepted batches in arrival order.
    pub fn batches(&self) -> Vec<Vec<LogEntry>> {
        self.state.batches.lock().clone()
    }

    /// Rejected batches in arrival order.
    pub fn failed_batches(&self) -> Vec<Vec<LogEntry>> {
        self.state.failed.lock().clone()
    }

    /// Messages of every accepted entry, flattened across batches.
    pub fn delivered_messages(&self) -> Vec<String> {
        self.state
            .batches
            .lock()
            .iter()
            .flatten()
            .map(|entry| entry.message().to_owned())
            .collect()
    }

    /// Wait until at least `count` entries have been accepted.
    pub fn wait_for_delivered(&self, count: usize, timeout: Duration) -> bool {
        wait_until(timeout, || {
            self.state.batches.lock().iter().map(Vec::len).sum::<usize>() >= count
        })
    }

    /// Wait until at least `count` batches have been rejected.
    pub fn wait_for_failed(&self, count: usize, timeout: Duration) -> bool {
        wait_until(timeout, || self.state.failed.lock().len() >= count)
    }

    /// Wait until at least `count` connection attempts have been made.
    pub fn wait_for_attempts(&self, count: usize, timeout: Duration) -> bool {
        wait_until(timeout, || self.attempts() >= count)
    }
}

/// Poll `condition` every few milliseconds until it holds or `timeout` ends.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(5));
    }
}

impl Transport for RecordingTransport {
    fn connect(&self) -> Result<Arc<dyn Connection>, ConnectError> {
        self.state.attempts.fetch_add(1, Ordering::SeqCst);
        if self.state.offline.load(Ordering::SeqCst) {
            return Err(ConnectError::Unavailable("collector offline".into()));
        }
        if take_one(&self.state.connect_failures) {
            return Err(ConnectError::Unavailable("injected connect failure".into()));
        }
        self.state.connections.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(RecordingConnection {
            state: Arc::clone(&self.state),
        }))
    }
}

struct RecordingConnection {
    state: Arc<State>,
}

impl Connection for RecordingConnection {
    fn send(&self, entries: &[LogEntry]) -> Result<(), SendError> {
        if take_one(&self.state.send_failures) {
            self.state.failed.lock().push(entries.to_vec());
            return Err(SendError::Rejected("injected send failure".into()));
        }
        self.state.batches.lock().push(entries.to_vec());
        Ok(())
    }
}
