//! Transport port (driven/secondary port)
//!
//! ## Design Notes
//!
//! - `add` is fire-and-forget: it must not block on delivery. Batching,
//!   flush cadence and retries belong to the implementation.
//! - Uses `anyhow::Result` because failures are adapter-specific. An `Err`
//!   only means the record was not accepted; the caller drops it.

use crate::domain::record::ErrorRecord;

/// Port trait for the batching/delivery layer
pub trait ITransport: Send + Sync {
    /// Hands one record over for eventual delivery.
    fn add(&self, record: ErrorRecord) -> anyhow::Result<()>;
}
