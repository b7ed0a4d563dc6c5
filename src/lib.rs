//! Best-effort, non-blocking log shipping to a remote collector.
//!
//! [`ScribeClient`] buffers entries in a bounded queue and ships them in
//! batches from a background worker, while a second worker keeps trying to
//! connect until the collector answers. Nothing on the logging path blocks or
//! fails: entries are dropped when the queue is full or a send fails.

pub mod client;
pub mod config;
pub mod connection;
pub mod file_config;
pub mod log_entry;
pub mod queue;
pub mod rate_limited_warner;
pub mod sender;
pub mod shutdown;
pub mod transport;

#[cfg(any(test, feature = "test-util"))]
pub mod test_utils;

pub use client::ScribeClient;
pub use config::{ConfigError, ScribeConfig, ScribeConfigBuilder, SendFailurePolicy};
pub use file_config::load_config;
pub use log_entry::LogEntry;
pub use queue::EntryQueue;
pub use transport::{
    Connection, ConnectError, Endpoint, FramedTransport, SendError, TlsOptions, Transport,
};
