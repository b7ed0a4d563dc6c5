//! Client configuration and its validating builder.
//!
//! [`ScribeConfigBuilder`] collects the required collector address, reconnect
//! delay, batch size and queue capacity plus optional transport tunables, and
//! produces an immutable [`ScribeConfig`] consumed by
//! [`ScribeClient`](crate::client::ScribeClient).

use std::time::Duration;

use thiserror::Error;

use crate::{rate_limited_warner::DEFAULT_WARN_INTERVAL, transport::TlsOptions};

/// Default connection timeout applied when establishing sockets.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default write timeout applied to socket writes.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(1);
/// Default maximum frame size (in bytes) accepted by the bundled transport.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 1 << 20; // 1 MiB
/// How long the sender waits before re-checking for a live connection.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Errors raised while building or loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid user supplied configuration.
    #[error("invalid scribe configuration: {0}")]
    InvalidConfig(String),
    /// The configuration file could not be read or parsed.
    #[error("failed to load {path}: {reason}")]
    Load { path: String, reason: String },
}

/// What the sender does with the connection after a failed batch send.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SendFailurePolicy {
    /// Discard the batch and keep using the connection.
    #[default]
    Drop,
    /// Discard the batch and hand the connection back to the connection
    /// manager, which reconnects using the usual retry delay.
    Reconnect,
}

impl std::str::FromStr for SendFailurePolicy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "drop" => Ok(Self::Drop),
            "reconnect" => Ok(Self::Reconnect),
            other => Err(ConfigError::InvalidConfig(format!(
                "send_failure_policy must be 'drop' or 'reconnect', got '{other}'"
            ))),
        }
    }
}

/// Immutable client configuration.
#[derive(Clone, Debug)]
pub struct ScribeConfig {
    address: String,
    reconnect_timeout: Duration,
    max_batch_size: usize,
    queue_capacity: usize,
    connect_timeout: Duration,
    write_timeout: Duration,
    max_frame_size: usize,
    poll_interval: Duration,
    warn_interval: Duration,
    send_failure_policy: SendFailurePolicy,
    tls: Option<TlsOptions>,
}

impl ScribeConfig {
    /// Start building a configuration for the collector at `address`.
    pub fn builder(address: impl Into<String>) -> ScribeConfigBuilder {
        ScribeConfigBuilder::new(address)
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn reconnect_timeout(&self) -> Duration {
        self.reconnect_timeout
    }

    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn write_timeout(&self) -> Duration {
        self.write_timeout
    }

    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn warn_interval(&self) -> Duration {
        self.warn_interval
    }

    pub fn send_failure_policy(&self) -> SendFailurePolicy {
        self.send_failure_policy
    }

    pub fn tls(&self) -> Option<&TlsOptions> {
        self.tls.as_ref()
    }
}

macro_rules! ensure_positive {
    ($value:expr, $field:expr) => {{
        if $value == 0 {
            Err(ConfigError::InvalidConfig(format!(
                "{} must be greater than zero",
                $field
            )))
        } else {
            Ok($value)
        }
    }};
}

macro_rules! option_setter {
    ($(#[$meta:meta])* $fn_name:ident, $field:ident, $ty:ty) => {
        $(#[$meta])*
        pub fn $fn_name(mut self, value: $ty) -> Self {
            self.$field = Some(value);
            self
        }
    };
}

#[derive(Clone, Debug, Default)]
struct TlsConfig {
    domain: Option<String>,
    insecure: bool,
}

/// Builder for [`ScribeConfig`].
///
/// The address, reconnect timeout, batch size and queue capacity have no
/// defaults; [`build`](Self::build) fails if any of them is missing.
#[derive(Clone, Debug, Default)]
pub struct ScribeConfigBuilder {
    address: String,
    reconnect_timeout: Option<Duration>,
    max_batch_size: Option<usize>,
    queue_capacity: Option<usize>,
    connect_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
    max_frame_size: Option<usize>,
    poll_interval: Option<Duration>,
    warn_interval: Option<Duration>,
    send_failure_policy: SendFailurePolicy,
    tls: Option<TlsConfig>,
}

impl ScribeConfigBuilder {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    /// Delay between failed connection attempts, in whole seconds.
    pub fn with_reconnect_timeout_secs(self, secs: u64) -> Self {
        self.with_reconnect_timeout(Duration::from_secs(secs))
    }

    option_setter!(
        #[doc = "Delay between failed connection attempts."]
        with_reconnect_timeout,
        reconnect_timeout,
        Duration
    );
    option_setter!(
        #[doc = "Largest number of entries shipped in one batch."]
        with_max_batch_size,
        max_batch_size,
        usize
    );
    option_setter!(
        #[doc = "Number of entries buffered before new ones are dropped."]
        with_queue_capacity,
        queue_capacity,
        usize
    );
    option_setter!(with_connect_timeout, connect_timeout, Duration);
    option_setter!(with_write_timeout, write_timeout, Duration);
    option_setter!(with_max_frame_size, max_frame_size, usize);
    option_setter!(with_poll_interval, poll_interval, Duration);
    option_setter!(with_warn_interval, warn_interval, Duration);

    pub fn with_send_failure_policy(mut self, policy: SendFailurePolicy) -> Self {
        self.send_failure_policy = policy;
        self
    }

    /// Configure TLS. Without a domain the host part of the address is used.
    pub fn with_tls(mut self, domain: Option<String>, insecure: bool) -> Self {
        self.tls = Some(TlsConfig { domain, insecure });
        self
    }

    /// Validate the collected options and produce a [`ScribeConfig`].
    pub fn build(&self) -> Result<ScribeConfig, ConfigError> {
        let address = self.address.trim();
        if address.is_empty() {
            return Err(ConfigError::InvalidConfig("address must not be empty".into()));
        }
        let reconnect_timeout = self.reconnect_timeout.ok_or_else(|| missing("reconnect_timeout"))?;
        let max_batch_size = self.max_batch_size.ok_or_else(|| missing("max_batch_size"))?;
        let queue_capacity = self.queue_capacity.ok_or_else(|| missing("queue_capacity"))?;
        ensure_positive!(max_batch_size, "max_batch_size")?;
        ensure_positive!(queue_capacity, "queue_capacity")?;
        if let Some(frame) = self.max_frame_size {
            ensure_positive!(frame, "max_frame_size")?;
        }
        for (value, field) in [
            (self.connect_timeout, "connect_timeout"),
            (self.write_timeout, "write_timeout"),
            (self.poll_interval, "poll_interval"),
        ] {
            if value.is_some_and(|dur| dur.is_zero()) {
                return Err(ConfigError::InvalidConfig(format!(
                    "{field} must be greater than zero"
                )));
            }
        }

        Ok(ScribeConfig {
            address: address.to_owned(),
            reconnect_timeout,
            max_batch_size,
            queue_capacity,
            connect_timeout: self.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT),
            write_timeout: self.write_timeout.unwrap_or(DEFAULT_WRITE_TIMEOUT),
            max_frame_size: self.max_frame_size.unwrap_or(DEFAULT_MAX_FRAME_SIZE),
            poll_interval: self.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL),
            warn_interval: self.warn_interval.unwrap_or(DEFAULT_WARN_INTERVAL),
            send_failure_policy: self.send_failure_policy,
            tls: self.build_tls(address)?,
        })
    }

    fn build_tls(&self, address: &str) -> Result<Option<TlsOptions>, ConfigError> {
        let Some(tls) = &self.tls else {
            return Ok(None);
        };
        if address.starts_with("unix:") {
            return Err(ConfigError::InvalidConfig(
                "tls is not supported for unix domain sockets".into(),
            ));
        }
        let domain = match &tls.domain {
            Some(domain) if !domain.trim().is_empty() => domain.trim().to_owned(),
            _ => host_of(address).ok_or_else(|| {
                ConfigError::InvalidConfig(format!(
                    "tls domain could not be derived from address '{address}'"
                ))
            })?,
        };
        Ok(Some(TlsOptions {
            domain,
            insecure_skip_verify: tls.insecure,
        }))
    }
}

fn missing(field: &str) -> ConfigError {
    ConfigError::InvalidConfig(format!("{field} is required"))
}

/// Host part of a `host:port` address, without IPv6 brackets.
fn host_of(address: &str) -> Option<String> {
    let (host, _port) = address.rsplit_once(':')?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    (!host.is_empty()).then(|| host.to_owned())
}
