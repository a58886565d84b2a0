//! HTTP sender for flushed batches
//!
//! ## Usage
//!
//! ```rust,no_run
//! use selfwatch_transport::{HttpRequest, IRequestSender};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let request = HttpRequest::new("https://intake.example.com/internal", 16 * 1024)?;
//! request.send("{\"message\":\"boom\"}".to_string()).await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use reqwest::{header::CONTENT_TYPE, Client};
use tracing::debug;

use crate::error::TransportError;

/// Per-request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Port trait for delivering one flushed batch body
///
/// The batch worker awaits each send before flushing again. Failures are
/// logged by the caller and the batch is dropped; there is no retry.
#[async_trait::async_trait]
pub trait IRequestSender: Send + Sync + 'static {
    async fn send(&self, body: String) -> anyhow::Result<()>;
}

/// Posts batch bodies to the monitoring endpoint
pub struct HttpRequest {
    client: Client,
    endpoint: String,
    bytes_limit: usize,
}

impl HttpRequest {
    /// Creates a sender for `endpoint`.
    ///
    /// # Arguments
    /// * `endpoint` - Destination URL
    /// * `bytes_limit` - Expected upper bound for a body; larger bodies are
    ///   still sent but logged
    ///
    /// # Errors
    /// Returns [`TransportError::Http`] if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, bytes_limit: usize) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            bytes_limit,
        })
    }
}

#[async_trait::async_trait]
impl IRequestSender for HttpRequest {
    async fn send(&self, body: String) -> anyhow::Result<()> {
        if body.len() > self.bytes_limit {
            debug!(
                size = body.len(),
                limit = self.bytes_limit,
                "Batch body exceeds bytes limit"
            );
        }

        self.client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "text/plain;charset=UTF-8")
            .body(body)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(TransportError::from)?;

        Ok(())
    }
}
