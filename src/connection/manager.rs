//! Connection state machine and its retry loop.

use std::{
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};

use log::{info, warn};

use crate::{
    config::{ScribeConfig, SendFailurePolicy},
    shutdown::{Pause, ShutdownListener},
    transport::{ConnectError, Transport},
};

use super::ConnectionSlot;

/// States of the connection lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

/// Establishes the client's connection and publishes it to the shared slot.
pub struct ConnectionManager<T> {
    transport: T,
    slot: Arc<ConnectionSlot>,
    address: String,
    reconnect_timeout: Duration,
    poll_interval: Duration,
    policy: SendFailurePolicy,
}

impl<T: Transport> ConnectionManager<T> {
    pub fn new(transport: T, slot: Arc<ConnectionSlot>, config: &ScribeConfig) -> Self {
        Self {
            transport,
            slot,
            address: config.address().to_owned(),
            reconnect_timeout: config.reconnect_timeout(),
            poll_interval: config.poll_interval(),
            policy: config.send_failure_policy(),
        }
    }

    /// Make one connection attempt, publishing the connection on success.
    pub fn connect(&self) -> Result<(), ConnectError> {
        let connection = self.transport.connect()?;
        self.slot.publish(connection);
        Ok(())
    }

    /// Drive the state machine until it has nothing left to do or `pause`
    /// asks it to stop.
    ///
    /// Failed attempts are retried after `reconnect_timeout`, indefinitely.
    /// Under [`SendFailurePolicy::Drop`] the loop ends at the first success.
    /// Under [`SendFailurePolicy::Reconnect`] it keeps watching the slot and
    /// reconnects whenever the sender invalidates the connection.
    pub fn run(&self, pause: &impl Pause) {
        let mut state = ConnectionState::Disconnected;
        loop {
            state = match state {
                ConnectionState::Disconnected => match self.connect() {
                    Ok(()) => {
                        info!("ScribeClient connected to {}", self.address);
                        ConnectionState::Connected
                    }
                    Err(err) => {
                        warn!(
                            "ScribeClient failed to connect to {}: {err}; retrying in {:?}",
                            self.address, self.reconnect_timeout
                        );
                        if pause.pause(self.reconnect_timeout).is_break() {
                            return;
                        }
                        ConnectionState::Disconnected
                    }
                },
                ConnectionState::Connected => {
                    if self.policy == SendFailurePolicy::Drop {
                        return;
                    }
                    if pause.pause(self.poll_interval).is_break() {
                        return;
                    }
                    if self.slot.is_open() {
                        ConnectionState::Connected
                    } else {
                        info!("ScribeClient lost connection to {}; reconnecting", self.address);
                        ConnectionState::Disconnected
                    }
                }
            };
        }
    }

    /// Run the state machine on a dedicated thread until it finishes or
    /// `shutdown` is triggered.
    pub fn spawn(self, shutdown: ShutdownListener) -> JoinHandle<()> {
        thread::spawn(move || self.run(&shutdown))
    }
}
