//! Debug sink port
//!
//! A local surface for intercepted faults while debug mode is enabled.
//! Whatever it writes to must never be routed back into the monitored
//! transport.

use crate::domain::fault::Fault;

/// Port trait for surfacing faults locally
pub trait IDebugSink: Send + Sync {
    fn log_fault(&self, fault: &Fault);
}

impl<F> IDebugSink for F
where
    F: Fn(&Fault) + Send + Sync,
{
    fn log_fault(&self, fault: &Fault) {
        self(fault)
    }
}
