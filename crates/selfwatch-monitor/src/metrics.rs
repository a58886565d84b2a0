//! Prometheus counters for the monitor itself
//!
//! Tracks what happened to each intercepted fault and how often monitoring
//! was activated. Counters are observational only; they never influence
//! send decisions.

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// What the guard did with an intercepted fault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultOutcome {
    /// A record was handed to the transport
    Sent,
    /// The activation budget was exhausted
    RateLimited,
    /// Monitoring was not active
    Inactive,
    /// Building or handing off the record failed
    ReportFailed,
}

impl FaultOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultOutcome::Sent => "sent",
            FaultOutcome::RateLimited => "rate_limited",
            FaultOutcome::Inactive => "inactive",
            FaultOutcome::ReportFailed => "report_failed",
        }
    }
}

impl std::fmt::Display for FaultOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-monitor metrics registry.
pub struct MonitorMetrics {
    registry: Registry,
    /// Counter: intercepted faults by outcome
    pub faults_total: IntCounterVec,
    /// Counter: successful activations
    pub activations_total: IntCounter,
}

impl MonitorMetrics {
    /// Creates a new `MonitorMetrics` with all metrics registered.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new_custom(Some("selfwatch".to_string()), None)?;

        let faults_total = IntCounterVec::new(
            Opts::new("faults_total", "Intercepted internal faults by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(faults_total.clone()))?;

        let activations_total = IntCounter::new(
            "activations_total",
            "Times internal monitoring was activated",
        )?;
        registry.register(Box::new(activations_total.clone()))?;

        Ok(Self {
            registry,
            faults_total,
            activations_total,
        })
    }

    /// Record the outcome of one intercepted fault.
    pub fn record_fault(&self, outcome: FaultOutcome) {
        self.faults_total
            .with_label_values(&[outcome.as_str()])
            .inc();
    }

    /// Record an activation.
    pub fn record_activation(&self) {
        self.activations_total.inc();
    }

    /// Current count for one outcome.
    pub fn fault_count(&self, outcome: FaultOutcome) -> u64 {
        self.faults_total
            .with_label_values(&[outcome.as_str()])
            .get()
    }

    /// Encode all metrics in Prometheus text exposition format.
    pub fn encode(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = MonitorMetrics::new().expect("create registry");
        let output = metrics.encode().expect("encode");
        assert!(output.contains("selfwatch_activations_total"));
    }

    #[test]
    fn test_record_fault_outcomes() {
        let metrics = MonitorMetrics::new().unwrap();
        metrics.record_fault(FaultOutcome::Sent);
        metrics.record_fault(FaultOutcome::Sent);
        metrics.record_fault(FaultOutcome::RateLimited);

        assert_eq!(metrics.fault_count(FaultOutcome::Sent), 2);
        assert_eq!(metrics.fault_count(FaultOutcome::RateLimited), 1);
        assert_eq!(metrics.fault_count(FaultOutcome::Inactive), 0);

        let output = metrics.encode().unwrap();
        assert!(output.contains("selfwatch_faults_total"));
        assert!(output.contains("outcome=\"sent\""));
    }

    #[test]
    fn test_record_activation() {
        let metrics = MonitorMetrics::new().unwrap();
        metrics.record_activation();
        assert_eq!(metrics.activations_total.get(), 1);
    }
}
