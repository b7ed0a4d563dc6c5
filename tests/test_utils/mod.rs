pub mod fixtures;

#[allow(unused_imports)]
pub use fixtures::{FAST_RECONNECT, WAIT, fast_builder};
