//! selfwatch Transport - Batching and delivery of diagnostic records
//!
//! Provides:
//! - `Batch`: an `ITransport` that groups records on a background tokio task
//!   and flushes by count, byte size, interval, or shutdown
//! - `HttpRequest`: posts a flushed batch body to the monitoring endpoint
//! - `IRequestSender`: the seam between the two, for alternative senders

pub mod batch;
pub mod error;
pub mod http;

pub use batch::Batch;
pub use error::TransportError;
pub use http::{HttpRequest, IRequestSender};
