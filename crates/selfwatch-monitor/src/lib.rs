//! Selfwatch Monitor - Fault guards for telemetry SDK internals
//!
//! Provides:
//! - `Monitor`: intercepts panics and errors raised by wrapped SDK code
//!   and reports them, rate-limited, through a dedicated transport
//! - `MonitoringState` / `RateLimiter`: activation lifecycle and the
//!   per-activation record budget
//! - `RecordBuilder`: folds a fault, its stack trace and ambient context
//!   into an `ErrorRecord`
//! - `monitored!`: declares guarded methods at definition time
//! - Default collaborators: `BacktraceComputer`, `CommonContextProvider`,
//!   `TracingDebugSink`
//! - `MonitorMetrics`: Prometheus counters for the monitor itself
//!
//! Interception relies on unwinding. With `panic = "abort"` a panic inside
//! guarded code still terminates the process; only `Err` results are
//! intercepted.

pub mod context;
pub mod debug;
mod macros;
pub mod metrics;
pub mod monitor;
pub mod panic_capture;
pub mod rate_limit;
pub mod record_builder;
pub mod state;
pub mod trace;

pub use context::{CommonContextProvider, OsInfo};
pub use debug::{TracingDebugSink, DEBUG_TARGET};
pub use metrics::{FaultOutcome, MonitorMetrics};
pub use monitor::{
    activate, activate_with, deactivate, guard, guard_method, guard_result, is_active, run,
    run_result, set_debug, Monitor, MonitorBuilder,
};
pub use panic_capture::install_panic_capture;
pub use rate_limit::{may_send, RateLimiter};
pub use record_builder::RecordBuilder;
pub use state::{MonitoringState, Reservation};
pub use trace::BacktraceComputer;

pub use selfwatch_core::{
    config::MonitoringConfig,
    domain::{ErrorRecord, Fault, MonitorError},
};
