//! Tracing-backed debug sink
//!
//! Faults are emitted as warnings on the `selfwatch::internal` target so a
//! host subscriber can filter them. Nothing logged here is forwarded to the
//! monitoring transport.

use selfwatch_core::{domain::Fault, ports::IDebugSink};
use tracing::warn;

/// Target used for debug-mode fault output
pub const DEBUG_TARGET: &str = "selfwatch::internal";

/// Debug sink writing to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDebugSink;

impl IDebugSink for TracingDebugSink {
    fn log_fault(&self, fault: &Fault) {
        warn!(
            target: DEBUG_TARGET,
            kind = %fault.kind(),
            location = fault.location().unwrap_or_default(),
            "[INTERNAL ERROR] {}",
            fault
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tracing::{
        span::{Attributes, Id, Record},
        Event, Level, Metadata, Subscriber,
    };

    use super::*;

    /// Records the target and level of every event
    #[derive(Clone, Default)]
    struct EventRecorder {
        events: Arc<Mutex<Vec<(String, Level)>>>,
    }

    impl Subscriber for EventRecorder {
        fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
            true
        }

        fn new_span(&self, _span: &Attributes<'_>) -> Id {
            Id::from_u64(1)
        }

        fn record(&self, _span: &Id, _values: &Record<'_>) {}

        fn record_follows_from(&self, _span: &Id, _follows: &Id) {}

        fn event(&self, event: &Event<'_>) {
            let metadata = event.metadata();
            let entry = (metadata.target().to_string(), *metadata.level());
            self.events.lock().unwrap().push(entry);
        }

        fn enter(&self, _span: &Id) {}

        fn exit(&self, _span: &Id) {}
    }

    #[test]
    fn test_log_fault_without_subscriber() {
        TracingDebugSink.log_fault(&Fault::panic("boom").with_location("src/lib.rs:1:1"));
        TracingDebugSink.log_fault(&Fault::error("bad state"));
    }

    #[test]
    fn test_log_fault_uses_debug_target() {
        let recorder = EventRecorder::default();
        let events = Arc::clone(&recorder.events);

        tracing::subscriber::with_default(recorder, || {
            TracingDebugSink.log_fault(&Fault::error("bad state"));
        });

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0], (DEBUG_TARGET.to_string(), Level::WARN));
    }
}
