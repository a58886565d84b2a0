//! Transport error types

use thiserror::Error;

/// Errors raised by the batch transport
#[derive(Debug, Error)]
pub enum TransportError {
    /// `Batch::spawn` was called outside a tokio runtime
    #[error("No tokio runtime available to run the batch worker")]
    NoRuntime,

    /// The batch worker has stopped
    #[error("Batch worker is no longer running")]
    Closed,

    /// The serialized record exceeds the configured maximum
    #[error("Record of {size} bytes exceeds the {limit} byte limit")]
    RecordTooLarge { size: usize, limit: usize },

    /// The record could not be serialized
    #[error("Failed to serialize record: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The endpoint rejected or never received the batch
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}
