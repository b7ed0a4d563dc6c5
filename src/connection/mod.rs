//! Connection lifecycle for the client.
//!
//! [`ConnectionSlot`] is the single place a live [`Connection`] is published.
//! [`ConnectionManager`] fills it: it runs a `Disconnected -> Connected` state
//! machine on its own worker, retrying failed attempts after a fixed delay
//! until one succeeds.
//!
//! [`Connection`]: crate::transport::Connection

mod manager;
mod slot;


pub use manager::{ConnectionManager, ConnectionState};
pub use slot::ConnectionSlot;
