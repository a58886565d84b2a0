//! The guard: fault interception and reporting
//!
//! A [`Monitor`] owns the [`MonitoringState`] and the collaborators used to
//! turn faults into records. Wrapping an operation with [`Monitor::guard`]
//! (or running it with [`Monitor::run`]) gives two nested boundaries:
//!
//! 1. the operation runs under `catch_unwind`; a panic (or, for the
//!    `*_result` variants, an `Err`) is intercepted and the caller gets
//!    `None` instead;
//! 2. the reporting path (debug sink, budget check, record building,
//!    transport hand-off) runs under its own `catch_unwind`, and whatever
//!    fails there is at most surfaced on the debug sink.
//!
//! Nothing crosses either boundary. The process-wide monitor is reached
//! through [`Monitor::global`]; the free functions in the crate root
//! delegate to it.

use std::{
    panic::{self, AssertUnwindSafe},
    sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError},
};

use selfwatch_core::{
    config::{MonitoringConfig, TransportSettings},
    domain::{Fault, MonitorError},
    ports::{IContextProvider, IDebugSink, ITraceComputer, ITransport},
};
use selfwatch_transport::Batch;
use tracing::{debug, info, warn};

use crate::{
    context::CommonContextProvider,
    debug::TracingDebugSink,
    metrics::{FaultOutcome, MonitorMetrics},
    panic_capture::{fault_from_panic, install_panic_capture, GuardScope},
    record_builder::RecordBuilder,
    state::{MonitoringState, Reservation},
    trace::BacktraceComputer,
};

static GLOBAL: OnceLock<Monitor> = OnceLock::new();

/// Fault interceptor with its own lifecycle state and collaborators
pub struct Monitor {
    state: Mutex<MonitoringState>,
    trace_computer: Arc<dyn ITraceComputer>,
    context_provider: Arc<dyn IContextProvider>,
    debug_sink: Arc<dyn IDebugSink>,
    metrics: Option<MonitorMetrics>,
}

impl Monitor {
    /// Creates an inactive monitor with the default collaborators.
    pub fn new() -> Self {
        MonitorBuilder::new().build()
    }

    pub fn builder() -> MonitorBuilder {
        MonitorBuilder::new()
    }

    /// The process-wide monitor, created with defaults on first use unless
    /// [`Monitor::install_global`] ran first.
    pub fn global() -> &'static Monitor {
        GLOBAL.get_or_init(Monitor::new)
    }

    /// Makes `monitor` the process-wide monitor.
    ///
    /// Fails (handing the monitor back) if the global one already exists.
    pub fn install_global(monitor: Monitor) -> Result<(), Monitor> {
        GLOBAL.set(monitor)
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Activates monitoring with the default HTTP batch transport.
    ///
    /// Must be called from within a tokio runtime; otherwise the transport
    /// cannot start and activation is refused.
    pub fn activate(&self, config: &MonitoringConfig) -> Result<(), MonitorError> {
        self.activate_with(config, |settings| {
            let batch = Batch::http(settings)?;
            Ok(Arc::new(batch) as Arc<dyn ITransport>)
        })
    }

    /// Activates monitoring with a transport built by `factory`.
    ///
    /// On any error the current state is left untouched.
    pub fn activate_with<F>(
        &self,
        config: &MonitoringConfig,
        factory: F,
    ) -> Result<(), MonitorError>
    where
        F: FnOnce(&TransportSettings) -> anyhow::Result<Arc<dyn ITransport>>,
    {
        install_panic_capture();

        let Some(settings) = config.transport_settings() else {
            debug!("No monitoring endpoint configured, internal monitoring stays off");
            return Err(MonitorError::MissingEndpoint);
        };

        let errors = config.validate();
        if !errors.is_empty() {
            warn!(count = errors.len(), "Invalid monitoring configuration");
            return Err(MonitorError::InvalidConfig(errors));
        }

        let transport = factory(&settings).map_err(|e| {
            warn!(error = %e, "Failed to create internal monitoring transport");
            MonitorError::Transport(format!("{e:#}"))
        })?;

        let previous = self
            .lock_state()
            .activate(transport, config.max_records_per_activation);
        drop(previous);

        if let Some(metrics) = &self.metrics {
            metrics.record_activation();
        }
        info!(
            endpoint = %settings.endpoint,
            max_records = config.max_records_per_activation,
            "Internal monitoring activated"
        );
        Ok(())
    }

    /// Drops the transport handle. A no-op when already inactive.
    pub fn deactivate(&self) {
        let previous = self.lock_state().deactivate();
        if previous.is_some() {
            debug!("Internal monitoring deactivated");
        }
    }

    /// Turns local surfacing of faults on or off. Survives re-activation.
    pub fn set_debug(&self, enabled: bool) {
        self.lock_state().set_debug(enabled);
    }

    pub fn is_active(&self) -> bool {
        self.lock_state().is_active()
    }

    pub fn is_debug(&self) -> bool {
        self.lock_state().debug_enabled()
    }

    /// Records handed to the transport since the last activation.
    pub fn sent_count(&self) -> u32 {
        self.lock_state().sent_count()
    }

    pub fn metrics(&self) -> Option<&MonitorMetrics> {
        self.metrics.as_ref()
    }

    // ========================================================================
    // Guards
    // ========================================================================

    /// Runs `operation` once, intercepting any panic.
    ///
    /// Returns `Some` with the operation's value, or `None` if it panicked.
    pub fn run<T, F>(&self, operation: F) -> Option<T>
    where
        F: FnOnce() -> T,
    {
        install_panic_capture();

        let outcome = {
            let _scope = GuardScope::enter();
            panic::catch_unwind(AssertUnwindSafe(operation))
        };

        match outcome {
            Ok(value) => Some(value),
            Err(payload) => {
                self.handle_fault(move || fault_from_panic(payload));
                None
            }
        }
    }

    /// Runs a fallible `operation` once, intercepting panics and `Err`s.
    pub fn run_result<T, E, F>(&self, operation: F) -> Option<T>
    where
        F: FnOnce() -> Result<T, E>,
        E: Into<anyhow::Error>,
    {
        match self.run(operation)? {
            Ok(value) => Some(value),
            Err(err) => {
                self.handle_fault(move || Fault::from_anyhow(&err.into()));
                None
            }
        }
    }

    /// Wraps `operation` so that every call runs under [`Monitor::run`].
    ///
    /// Several arguments are passed as a tuple.
    pub fn guard<'m, A, T, F>(&'m self, operation: F) -> impl Fn(A) -> Option<T> + 'm
    where
        F: Fn(A) -> T + 'm,
    {
        move |args| self.run(|| operation(args))
    }

    /// Wraps a fallible `operation`; an `Err` counts as a fault.
    pub fn guard_result<'m, A, T, E, F>(
        &'m self,
        operation: F,
    ) -> impl Fn(A) -> Option<T> + 'm
    where
        F: Fn(A) -> Result<T, E> + 'm,
        E: Into<anyhow::Error>,
    {
        move |args| self.run_result(|| operation(args))
    }

    /// Calls `method` on `receiver` under the guard.
    ///
    /// `receiver` may be a trait object, in which case the call inside
    /// `method` dispatches dynamically as usual.
    pub fn guard_method<R, A, T, M>(&self, receiver: &R, method: M, args: A) -> Option<T>
    where
        R: ?Sized,
        M: FnOnce(&R, A) -> T,
    {
        self.run(|| method(receiver, args))
    }

    /// Like [`Monitor::guard_method`] for methods taking `&mut self`.
    pub fn guard_method_mut<R, A, T, M>(
        &self,
        receiver: &mut R,
        method: M,
        args: A,
    ) -> Option<T>
    where
        R: ?Sized,
        M: FnOnce(&mut R, A) -> T,
    {
        self.run(|| method(receiver, args))
    }

    // ========================================================================
    // Reporting path
    // ========================================================================

    fn handle_fault<M>(&self, make_fault: M)
    where
        M: FnOnce() -> Fault,
    {
        let _scope = GuardScope::enter();

        let reported = panic::catch_unwind(AssertUnwindSafe(|| self.report(make_fault())));
        if let Err(payload) = reported {
            self.record_outcome(FaultOutcome::ReportFailed);
            let fault = fault_from_panic(payload);
            self.log_if_debug(&fault);
        }
    }

    fn report(&self, fault: Fault) {
        self.log_if_debug(&fault);

        let reservation = self.lock_state().reserve();
        match reservation {
            Reservation::Inactive => self.record_outcome(FaultOutcome::Inactive),
            Reservation::RateLimited => self.record_outcome(FaultOutcome::RateLimited),
            Reservation::Granted(transport) => {
                let record = RecordBuilder::new(
                    self.trace_computer.as_ref(),
                    self.context_provider.as_ref(),
                )
                .build(&fault);

                match transport.add(record) {
                    Ok(()) => self.record_outcome(FaultOutcome::Sent),
                    Err(e) => {
                        self.record_outcome(FaultOutcome::ReportFailed);
                        self.log_if_debug(&Fault::from_anyhow(&e));
                    }
                }
            }
        }
    }

    /// Surfaces `fault` on the debug sink when debug mode is on. Never panics.
    fn log_if_debug(&self, fault: &Fault) {
        if !self.lock_state().debug_enabled() {
            return;
        }
        let _ = panic::catch_unwind(AssertUnwindSafe(|| self.debug_sink.log_fault(fault)));
    }

    fn record_outcome(&self, outcome: FaultOutcome) {
        if let Some(metrics) = &self.metrics {
            metrics.record_fault(outcome);
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, MonitoringState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Monitor {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// MonitorBuilder
// ============================================================================

/// Builder for a [`Monitor`] with custom collaborators.
///
/// Unset collaborators default to [`BacktraceComputer`],
/// [`CommonContextProvider`] and [`TracingDebugSink`].
pub struct MonitorBuilder {
    trace_computer: Option<Arc<dyn ITraceComputer>>,
    context_provider: Option<Arc<dyn IContextProvider>>,
    debug_sink: Option<Arc<dyn IDebugSink>>,
}

impl MonitorBuilder {
    pub fn new() -> Self {
        Self {
            trace_computer: None,
            context_provider: None,
            debug_sink: None,
        }
    }

    pub fn trace_computer(mut self, computer: impl ITraceComputer + 'static) -> Self {
        self.trace_computer = Some(Arc::new(computer));
        self
    }

    pub fn context_provider(mut self, provider: impl IContextProvider + 'static) -> Self {
        self.context_provider = Some(Arc::new(provider));
        self
    }

    pub fn debug_sink(mut self, sink: impl IDebugSink + 'static) -> Self {
        self.debug_sink = Some(Arc::new(sink));
        self
    }

    pub fn build(self) -> Monitor {
        install_panic_capture();

        let metrics = match MonitorMetrics::new() {
            Ok(metrics) => Some(metrics),
            Err(e) => {
                warn!(error = %e, "Failed to create monitor metrics");
                None
            }
        };

        Monitor {
            state: Mutex::new(MonitoringState::new()),
            trace_computer: self
                .trace_computer
                .unwrap_or_else(|| Arc::new(BacktraceComputer::new())),
            context_provider: self
                .context_provider
                .unwrap_or_else(|| Arc::new(CommonContextProvider::new())),
            debug_sink: self.debug_sink.unwrap_or_else(|| Arc::new(TracingDebugSink)),
            metrics,
        }
    }
}

impl Default for MonitorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Global monitor
// ============================================================================

/// Activates the global monitor with the default HTTP batch transport.
pub fn activate(config: &MonitoringConfig) -> Result<(), MonitorError> {
    Monitor::global().activate(config)
}

/// Activates the global monitor with a transport built by `factory`.
pub fn activate_with<F>(config: &MonitoringConfig, factory: F) -> Result<(), MonitorError>
where
    F: FnOnce(&TransportSettings) -> anyhow::Result<Arc<dyn ITransport>>,
{
    Monitor::global().activate_with(config, factory)
}

pub fn deactivate() {
    Monitor::global().deactivate();
}

pub fn set_debug(enabled: bool) {
    Monitor::global().set_debug(enabled);
}

pub fn is_active() -> bool {
    Monitor::global().is_active()
}

/// Runs `operation` once under the global guard.
pub fn run<T, F>(operation: F) -> Option<T>
where
    F: FnOnce() -> T,
{
    Monitor::global().run(operation)
}

/// Runs a fallible `operation` once under the global guard.
pub fn run_result<T, E, F>(operation: F) -> Option<T>
where
    F: FnOnce() -> Result<T, E>,
    E: Into<anyhow::Error>,
{
    Monitor::global().run_result(operation)
}

/// Wraps `operation` with the global guard.
pub fn guard<A, T, F>(operation: F) -> impl Fn(A) -> Option<T>
where
    F: Fn(A) -> T + 'static,
{
    Monitor::global().guard(operation)
}

/// Wraps a fallible `operation` with the global guard.
pub fn guard_result<A, T, E, F>(operation: F) -> impl Fn(A) -> Option<T>
where
    F: Fn(A) -> Result<T, E> + 'static,
    E: Into<anyhow::Error>,
{
    Monitor::global().guard_result(operation)
}

/// Calls `method` on `receiver` under the global guard.
pub fn guard_method<R, A, T, M>(receiver: &R, method: M, args: A) -> Option<T>
where
    R: ?Sized,
    M: FnOnce(&R, A) -> T,
{
    Monitor::global().guard_method(receiver, method, args)
}
