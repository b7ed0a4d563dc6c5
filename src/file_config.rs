//! INI configuration loading.
//!
//! Reads a `[scribe]` section with `rust-ini` and feeds it through
//! [`ScribeConfigBuilder`] so file-based and programmatic configuration share
//! the same validation.
//!
//! ```ini
//! [scribe]
//! address = 10.242.232.111:1463
//! reconnect_timeout_secs = 20
//! max_batch_size = 50
//! queue_capacity = 1000
//! ```

use std::{fs, path::Path, str::FromStr, time::Duration};

use ini::{Ini, Properties};

use crate::config::{ConfigError, ScribeConfig, ScribeConfigBuilder};

/// Section holding the client settings.
pub const SECTION: &str = "scribe";

/// Load a configuration from the INI file at `path`.
pub fn load_config(path: impl AsRef<Path>) -> Result<ScribeConfig, ConfigError> {
    let path = path.as_ref();
    let load_err = |reason: String| ConfigError::Load {
        path: path.display().to_string(),
        reason,
    };
    let text = fs::read_to_string(path).map_err(|err| load_err(err.to_string()))?;
    if text.trim().is_empty() {
        return Err(load_err("file is empty".into()));
    }
    parse_config(&text).map_err(|err| match err {
        ConfigError::Load { reason, .. } => load_err(reason),
        other => other,
    })
}

/// Parse a configuration from INI text.
pub fn parse_config(text: &str) -> Result<ScribeConfig, ConfigError> {
    let ini = Ini::load_from_str(text).map_err(|err| ConfigError::Load {
        path: "<string>".into(),
        reason: err.to_string(),
    })?;
    let props = ini.section(Some(SECTION)).ok_or_else(|| {
        ConfigError::InvalidConfig(format!("missing [{SECTION}] section"))
    })?;
    builder_from(props)?.build()
}

fn builder_from(props: &Properties) -> Result<ScribeConfigBuilder, ConfigError> {
    let address = props
        .get("address")
        .ok_or_else(|| ConfigError::InvalidConfig("address is required".into()))?;
    let mut builder = ScribeConfigBuilder::new(address);

    if let Some(secs) = parse_key::<u64>(props, "reconnect_timeout_secs")? {
        builder = builder.with_reconnect_timeout_secs(secs);
    }
    if let Some(size) = parse_key::<usize>(props, "max_batch_size")? {
        builder = builder.with_max_batch_size(size);
    }
    if let Some(capacity) = parse_key::<usize>(props, "queue_capacity")? {
        builder = builder.with_queue_capacity(capacity);
    }
    if let Some(ms) = parse_key::<u64>(props, "connect_timeout_ms")? {
        builder = builder.with_connect_timeout(Duration::from_millis(ms));
    }
    if let Some(ms) = parse_key::<u64>(props, "write_timeout_ms")? {
        builder = builder.with_write_timeout(Duration::from_millis(ms));
    }
    if let Some(size) = parse_key::<usize>(props, "max_frame_size")? {
        builder = builder.with_max_frame_size(size);
    }
    if let Some(ms) = parse_key::<u64>(props, "poll_interval_ms")? {
        builder = builder.with_poll_interval(Duration::from_millis(ms));
    }
    if let Some(secs) = parse_key::<u64>(props, "warn_interval_secs")? {
        builder = builder.with_warn_interval(Duration::from_secs(secs));
    }
    if let Some(policy) = props.get("send_failure_policy") {
        builder = builder.with_send_failure_policy(policy.parse()?);
    }
    let tls_domain = props.get("tls_domain").map(str::to_owned);
    let tls_insecure = parse_key::<bool>(props, "tls_insecure")?;
    if tls_domain.is_some() || tls_insecure.is_some() {
        builder = builder.with_tls(tls_domain, tls_insecure.unwrap_or(false));
    }
    Ok(builder)
}

fn parse_key<T: FromStr>(props: &Properties, key: &str) -> Result<Option<T>, ConfigError> {
    props
        .get(key)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|_| {
                ConfigError::InvalidConfig(format!("{key} has invalid value '{raw}'"))
            })
        })
        .transpose()
}
