//! Client configuration

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for one POS terminal client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Gate server base URL (e.g. "http://localhost:3000")
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout: u64,

    /// Issuance-time persistence deadline in milliseconds. Printing is
    /// never delayed past this; on expiry the batch rides the offline
    /// queue instead.
    pub persist_timeout_ms: u64,

    /// Offline queue database path
    pub queue_path: PathBuf,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, queue_path: impl Into<PathBuf>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: 30,
            persist_timeout_ms: 3_000,
            queue_path: queue_path.into(),
        }
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    pub fn with_persist_timeout_ms(mut self, millis: u64) -> Self {
        self.persist_timeout_ms = millis;
        self
    }

    pub fn persist_timeout(&self) -> Duration {
        Duration::from_millis(self.persist_timeout_ms)
    }
}
