//! Log entry representation shipped to the collector.
//!
//! A `LogEntry` is the unit buffered by [`EntryQueue`](crate::queue::EntryQueue)
//! and grouped into batches by the sender. Entries are immutable once built;
//! the fields are only exposed through accessors.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single log message tagged with the category the collector files it under.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    category: String,
    message: String,
}

impl LogEntry {
    /// Construct a new entry from `category` and `message`.
    pub fn new(category: &str, message: &str) -> Self {
        Self {
            category: category.to_owned(),
            message: message.to_owned(),
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.category, self.message)
    }
}
