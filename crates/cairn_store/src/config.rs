//! Store configuration.

use cairn_bits::Charset;
use std::time::Duration;

/// Configuration for opening a record store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Whether to create the database file if it doesn't exist.
    pub create_if_missing: bool,

    /// How long a statement waits on a locked database before failing.
    pub busy_timeout: Duration,

    /// Charset used when serializing text inside blob-backed columns.
    pub blob_charset: Charset,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            busy_timeout: Duration::from_secs(5),
            blob_charset: Charset::Utf8,
        }
    }
}

impl StoreConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to create the database file if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets the busy timeout.
    #[must_use]
    pub const fn busy_timeout(mut self, value: Duration) -> Self {
        self.busy_timeout = value;
        self
    }

    /// Sets the charset for text inside blob-backed columns.
    #[must_use]
    pub const fn blob_charset(mut self, value: Charset) -> Self {
        self.blob_charset = value;
        self
    }
}
