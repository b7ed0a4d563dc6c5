//! rstest fixtures producing client configurations with test-friendly timings.
//!
//! Reconnect delays and poll intervals are shortened to milliseconds so
//! scenarios that involve several connection attempts finish quickly.

use std::time::Duration;

use rstest::fixture;
use scribe_rs::{ScribeConfig, ScribeConfigBuilder};

/// Reconnect delay used by the fast fixtures.
pub const FAST_RECONNECT: Duration = Duration::from_millis(10);

/// Upper bound for waiting on background workers.
pub const WAIT: Duration = Duration::from_secs(3);

/// Builder targeting `address` with millisecond reconnect and poll timings.
///
/// # Arguments
/// * `max_batch_size` – largest batch the sender may ship.
/// * `queue_capacity` – number of entries buffered before drops start.
#[fixture]
pub fn fast_builder(
    #[default("collector.internal:1463")] address: &str,
    #[default(2)] max_batch_size: usize,
    #[default(16)] queue_capacity: usize,
) -> ScribeConfigBuilder {
    ScribeConfig::builder(address)
        .with_reconnect_timeout(FAST_RECONNECT)
        .with_max_batch_size(max_batch_size)
        .with_queue_capacity(queue_capacity)
        .with_poll_interval(Duration::from_millis(5))
}
