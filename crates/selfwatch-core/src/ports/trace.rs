//! Stack trace computation port

use crate::domain::{fault::Fault, record::StackTrace};

/// Port trait for computing a normalized trace from a fault
///
/// Implementations may fail (or even panic); callers must fall back to the
/// fault's raw message with no frames.
pub trait ITraceComputer: Send + Sync {
    fn compute(&self, fault: &Fault) -> anyhow::Result<StackTrace>;
}

impl<F> ITraceComputer for F
where
    F: Fn(&Fault) -> anyhow::Result<StackTrace> + Send + Sync,
{
    fn compute(&self, fault: &Fault) -> anyhow::Result<StackTrace> {
        self(fault)
    }
}
