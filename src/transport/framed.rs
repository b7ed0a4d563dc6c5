//! Length-prefixed MessagePack transport over TCP, TLS or Unix sockets.

use std::{
    io::{self, Write},
    net::{TcpStream, ToSocketAddrs},
    path::PathBuf,
    sync::Arc,
    time::Duration,
};

use native_tls::{TlsConnector, TlsStream};
use parking_lot::Mutex;

#[cfg(unix)]
use std::os::unix::net::UnixStream;

use crate::{
    config::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_MAX_FRAME_SIZE, DEFAULT_WRITE_TIMEOUT, ScribeConfig},
    log_entry::LogEntry,
};

use super::{
    Connection, ConnectError, SendError, Transport,
    serialise::{frame_payload, serialise_batch},
};

/// Prefix selecting a Unix domain socket in an address string.
const UNIX_PREFIX: &str = "unix:";

/// Where the collector listens.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Endpoint {
    /// `host:port` pair, resolved on every connection attempt.
    Tcp(String),
    /// Unix domain socket path.
    Unix(PathBuf),
}

impl Endpoint {
    /// Parse a collector address. `unix:<path>` selects a Unix domain socket,
    /// anything else is treated as `host:port`.
    pub fn parse(address: &str) -> Self {
        match address.strip_prefix(UNIX_PREFIX) {
            Some(path) => Endpoint::Unix(PathBuf::from(path)),
            None => Endpoint::Tcp(address.to_owned()),
        }
    }

    fn describe(&self) -> String {
        match self {
            Endpoint::Tcp(address) => address.clone(),
            Endpoint::Unix(path) => format!("{UNIX_PREFIX}{}", path.display()),
        }
    }
}

/// TLS connection options.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TlsOptions {
    /// Domain name presented during the TLS handshake.
    pub domain: String,
    /// Skip certificate validation when true (intended for tests).
    pub insecure_skip_verify: bool,
}

impl TlsOptions {
    fn connector(&self) -> io::Result<TlsConnector> {
        let mut builder = TlsConnector::builder();
        if self.insecure_skip_verify {
            builder.danger_accept_invalid_certs(true);
            builder.danger_accept_invalid_hostnames(true);
        }
        builder.build().map_err(io::Error::other)
    }
}

enum ActiveStream {
    PlainTcp(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl ActiveStream {
    fn set_write_timeout(&self, timeout: Duration) -> io::Result<()> {
        match self {
            ActiveStream::PlainTcp(stream) => stream.set_write_timeout(Some(timeout)),
            ActiveStream::Tls(stream) => stream.get_ref().set_write_timeout(Some(timeout)),
            #[cfg(unix)]
            ActiveStream::Unix(stream) => stream.set_write_timeout(Some(timeout)),
        }
    }

    fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        match self {
            ActiveStream::PlainTcp(stream) => {
                stream.write_all(frame)?;
                stream.flush()
            }
            ActiveStream::Tls(stream) => {
                stream.write_all(frame)?;
                stream.flush()
            }
            #[cfg(unix)]
            ActiveStream::Unix(stream) => {
                stream.write_all(frame)?;
                stream.flush()
            }
        }
    }
}

/// Bundled [`Transport`] writing one framed MessagePack array per batch.
#[derive(Clone, Debug)]
pub struct FramedTransport {
    endpoint: Endpoint,
    tls: Option<TlsOptions>,
    connect_timeout: Duration,
    write_timeout: Duration,
    max_frame_size: usize,
}

impl FramedTransport {
    /// Target `endpoint` with default timeouts, frame limit and no TLS.
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            tls: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Build the transport described by a client configuration.
    pub fn from_config(config: &ScribeConfig) -> Self {
        Self {
            endpoint: Endpoint::parse(config.address()),
            tls: config.tls().cloned(),
            connect_timeout: config.connect_timeout(),
            write_timeout: config.write_timeout(),
            max_frame_size: config.max_frame_size(),
        }
    }

    pub fn with_tls(mut self, tls: TlsOptions) -> Self {
        self.tls = Some(tls);
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    pub fn with_max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }

    fn open_stream(&self) -> Result<ActiveStream, ConnectError> {
        match &self.endpoint {
            Endpoint::Tcp(address) => {
                let stream = connect_tcp(address, self.connect_timeout)?;
                match &self.tls {
                    Some(tls) => wrap_tls(stream, tls, self.connect_timeout),
                    None => Ok(ActiveStream::PlainTcp(stream)),
                }
            }
            Endpoint::Unix(path) => connect_unix(path),
        }
    }
}

impl Transport for FramedTransport {
    fn connect(&self) -> Result<Arc<dyn Connection>, ConnectError> {
        let stream = self.open_stream()?;
        stream
            .set_write_timeout(self.write_timeout)
            .map_err(|source| ConnectError::Io {
                address: self.endpoint.describe(),
                source,
            })?;
        Ok(Arc::new(FramedConnection {
            stream: Mutex::new(stream),
            max_frame_size: self.max_frame_size,
        }))
    }
}

struct FramedConnection {
    stream: Mutex<ActiveStream>,
    max_frame_size: usize,
}

impl Connection for FramedConnection {
    fn send(&self, entries: &[LogEntry]) -> Result<(), SendError> {
        let payload = serialise_batch(entries)?;
        let frame = frame_payload(&payload, self.max_frame_size)?;
        self.stream.lock().write_frame(&frame)?;
        Ok(())
    }
}

fn connect_tcp(address: &str, timeout: Duration) -> Result<TcpStream, ConnectError> {
    let addrs = address
        .to_socket_addrs()
        .map_err(|source| ConnectError::Resolve {
            address: address.to_owned(),
            source,
        })?;
    let mut last_err = None;
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(err) => last_err = Some(err),
        }
    }
    Err(ConnectError::Io {
        address: address.to_owned(),
        source: last_err.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "address resolved to no sockets")
        }),
    })
}

fn wrap_tls(
    stream: TcpStream,
    tls: &TlsOptions,
    timeout: Duration,
) -> Result<ActiveStream, ConnectError> {
    let handshake_err = |reason: String| ConnectError::Handshake {
        peer: tls.domain.clone(),
        reason,
    };
    let connector = tls.connector().map_err(|err| handshake_err(err.to_string()))?;
    stream
        .set_read_timeout(Some(timeout))
        .and_then(|()| stream.set_write_timeout(Some(timeout)))
        .map_err(|err| handshake_err(err.to_string()))?;
    let stream = connector
        .connect(&tls.domain, stream)
        .map_err(|err| handshake_err(err.to_string()))?;
    stream
        .get_ref()
        .set_read_timeout(None)
        .map_err(|err| handshake_err(err.to_string()))?;
    Ok(ActiveStream::Tls(Box::new(stream)))
}

#[cfg(unix)]
fn connect_unix(path: &std::path::Path) -> Result<ActiveStream, ConnectError> {
    UnixStream::connect(path)
        .map(ActiveStream::Unix)
        .map_err(|source| ConnectError::Io {
            address: format!("{UNIX_PREFIX}{}", path.display()),
            source,
        })
}

#[cfg(not(unix))]
fn connect_unix(_path: &std::path::Path) -> Result<ActiveStream, ConnectError> {
    Err(ConnectError::Unavailable(
        "unix domain sockets are not supported on this platform".into(),
    ))
}
