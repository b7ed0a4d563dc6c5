//! Atomically published connection reference.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::transport::Connection;

/// Holds at most one live connection.
///
/// Writers replace the whole `Arc`; readers clone it and use the snapshot
/// without holding the lock, so a send never blocks publication.
#[derive(Default)]
pub struct ConnectionSlot {
    current: RwLock<Option<Arc<dyn Connection>>>,
}

impl ConnectionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `connection`, replacing any previous one.
    pub fn publish(&self, connection: Arc<dyn Connection>) {
        *self.current.write() = Some(connection);
    }

    /// Snapshot of the live connection, if any.
    pub fn current(&self) -> Option<Arc<dyn Connection>> {
        self.current.read().clone()
    }

    pub fn is_open(&self) -> bool {
        self.current.read().is_some()
    }

    /// Clear the slot if it still holds `connection`.
    ///
    /// Returns `false` when another connection has been published since the
    /// caller took its snapshot, leaving the newer one in place.
    pub fn invalidate(&self, connection: &Arc<dyn Connection>) -> bool {
        let mut current = self.current.write();
        match current.as_ref() {
            Some(live) if Arc::ptr_eq(live, connection) => {
                *current = None;
                true
            }
            _ => false,
        }
    }
}

impl std::fmt::Debug for ConnectionSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSlot")
            .field("open", &self.is_open())
            .finish()
    }
}
