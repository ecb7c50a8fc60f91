//! Result sink trait and error types
//!
//! A sink is the transport the Records of a session are published to. It
//! only sees opaque, already serialized messages; chunking is done by
//! [`publish_records`](super::publish_records).

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while publishing results
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Failed to serialize records: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Sink rejected message: {0}")]
    Rejected(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for publish operations
pub type PublishResult<T> = Result<T, PublishError>;

/// A destination for serialized result messages
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Sends one message
    ///
    /// `payload` is a JSON array of Records.
    async fn send(&self, payload: &str) -> PublishResult<()>;
}

/// Outcome of publishing one session's Records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Messages accepted by the sink
    pub sent: usize,
    /// Messages the sink rejected
    pub failed: usize,
}

impl PublishReport {
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}
