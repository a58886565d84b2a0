//! Port definitions (collaborator interfaces)
//!
//! The monitoring core depends on these traits; implementations live in
//! adapter crates or are supplied by the host.
//!
//! ## Ports Overview
//!
//! - [`ITransport`] - Accepts diagnostic records for batching and delivery
//! - [`ITraceComputer`] - Turns a fault into a normalized stack trace
//! - [`IContextProvider`] - Supplies ambient fields merged into each record
//! - [`IDebugSink`] - Local surface for faults while debug mode is on

pub mod context;
pub mod debug_sink;
pub mod trace;
pub mod transport;

pub use context::IContextProvider;
pub use debug_sink::IDebugSink;
pub use trace::ITraceComputer;
pub use transport::ITransport;
