//! Client error types

use thiserror::Error;

/// Store access error, split by how the caller must react: transport and
/// server failures are retryable (queued batches stay queued), a
/// rejection means replaying the same payload can never succeed.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Network-level failure (timeout, refused connection, DNS)
    #[error("transport error: {0}")]
    Transport(String),

    /// The store rejected the request as malformed (4xx)
    #[error("rejected by store ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Server-side failure (5xx), treated like a transport error
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// True when retrying the same payload later could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Transport(_) | StoreError::Server { .. })
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        StoreError::Transport(e.to_string())
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
