//! Transport seam between the client and the remote collector.
//!
//! The client only relies on [`Transport`] and [`Connection`]: a transport
//! opens sessions, a connection ships batches. Both error types are treated
//! opaquely by the pipeline, which only distinguishes success from failure.
//! [`FramedTransport`] is the bundled implementation, writing length-prefixed
//! MessagePack frames over TCP (optionally TLS) or a Unix domain socket.

use std::{io, sync::Arc};

use thiserror::Error;

use crate::log_entry::LogEntry;

mod framed;
mod serialise;


pub use framed::{Endpoint, FramedTransport, TlsOptions};
pub use serialise::{frame_payload, serialise_batch};

/// Errors raised while opening a session with the collector.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// The address could not be resolved.
    #[error("cannot resolve {address}: {source}")]
    Resolve {
        address: String,
        #[source]
        source: io::Error,
    },
    /// No resolved address accepted the connection.
    #[error("unable to connect to {address}: {source}")]
    Io {
        address: String,
        #[source]
        source: io::Error,
    },
    /// The socket opened but the session handshake failed.
    #[error("handshake with {peer} failed: {reason}")]
    Handshake { peer: String, reason: String },
    /// The transport refused to open a session for another reason.
    #[error("transport unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised while shipping a batch.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("failed to encode batch: {0}")]
    Encode(String),
    #[error("frame of {size} bytes exceeds the {max} byte limit")]
    FrameTooLarge { size: usize, max: usize },
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The collector answered but did not accept the batch.
    #[error("collector rejected batch: {0}")]
    Rejected(String),
}

/// An established session with the collector.
///
/// Connections are shared read-only between the connection manager and the
/// batch sender, so `send` takes `&self`; implementations synchronise their
/// own I/O.
pub trait Connection: Send + Sync {
    /// Ship one batch, preserving the order of `entries`.
    fn send(&self, entries: &[LogEntry]) -> Result<(), SendError>;
}

/// Opens sessions with the collector.
pub trait Transport: Send + Sync + 'static {
    fn connect(&self) -> Result<Arc<dyn Connection>, ConnectError>;
}

impl<T: Transport> Transport for Arc<T> {
    fn connect(&self) -> Result<Arc<dyn Connection>, ConnectError> {
        (**self).connect()
    }
}
