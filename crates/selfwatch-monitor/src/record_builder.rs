//! ErrorRecord construction
//!
//! Folds a fault, its computed trace and the ambient context into an
//! [`ErrorRecord`]. A failing or panicking trace computer never prevents
//! the record from being built: the fault's raw message with no frames is
//! used instead.

use std::panic::{self, AssertUnwindSafe};

use selfwatch_core::{
    domain::{ErrorRecord, Fault, StackTrace},
    ports::{IContextProvider, ITraceComputer},
};
use tracing::debug;

/// Builds records from faults using the configured collaborators
pub struct RecordBuilder<'a> {
    trace_computer: &'a dyn ITraceComputer,
    context_provider: &'a dyn IContextProvider,
}

impl<'a> RecordBuilder<'a> {
    pub fn new(
        trace_computer: &'a dyn ITraceComputer,
        context_provider: &'a dyn IContextProvider,
    ) -> Self {
        Self {
            trace_computer,
            context_provider,
        }
    }

    /// Builds the record for `fault`. Context is read at call time.
    pub fn build(&self, fault: &Fault) -> ErrorRecord {
        let trace = self.compute_trace(fault);
        let context = self.context_provider.context();
        ErrorRecord::new(fault.kind(), trace, context)
    }

    fn compute_trace(&self, fault: &Fault) -> StackTrace {
        let computed =
            panic::catch_unwind(AssertUnwindSafe(|| self.trace_computer.compute(fault)));
        match computed {
            Ok(Ok(trace)) => trace,
            Ok(Err(e)) => {
                debug!(error = %e, "Trace computation failed, using raw message");
                StackTrace::new(fault.message())
            }
            Err(_) => {
                debug!("Trace computation panicked, using raw message");
                StackTrace::new(fault.message())
            }
        }
    }
}
