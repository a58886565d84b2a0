//! Domain types for internal monitoring
//!
//! - `Fault`: a panic or error intercepted by a guard
//! - `ErrorRecord`: the diagnostic record handed to a transport
//! - `StackTrace` / `Frame`: normalized trace data
//! - Error types for lifecycle operations

pub mod errors;
pub mod fault;
pub mod record;

// Re-export commonly used types
pub use errors::MonitorError;
pub use fault::{Fault, FaultKind};
pub use record::{EntryType, ErrorDetails, ErrorRecord, Frame, Severity, StackTrace};
