//! [`Pause`] implementation that records delays instead of sleeping.

use std::{ops::ControlFlow, time::Duration};

use parking_lot::Mutex;

use crate::shutdown::Pause;

/// Records every requested delay and returns immediately.
///
/// With a limit set, the pause that would exceed the limit breaks the
/// caller's loop instead of being recorded.
#[derive(Debug, Default)]
pub struct RecordingPause {
    pauses: Mutex<Vec<Duration>>,
    limit: Option<usize>,
}

impl RecordingPause {
    /// Never asks the caller to stop.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop the caller once `limit` pauses have been recorded.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            pauses: Mutex::new(Vec::new()),
            limit: Some(limit),
        }
    }

    /// Delays requested so far.
    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses.lock().clone()
    }
}

impl Pause for RecordingPause {
    fn pause(&self, duration: Duration) -> ControlFlow<()> {
        let mut pauses = self.pauses.lock();
        if self.limit.is_some_and(|limit| pauses.len() >= limit) {
            return ControlFlow::Break(());
        }
        pauses.push(duration);
        ControlFlow::Continue(())
    }
}
