//! Test helpers shared by unit tests and, through the `test-util` feature,
//! the integration tests.
//!
//! [`RecordingTransport`] stands in for the collector and [`RecordingPause`]
//! replaces real sleeping in the connection manager.

mod recording_pause;
mod recording_transport;

pub use recording_pause::RecordingPause;
pub use recording_transport::{RecordingTransport, wait_until};
