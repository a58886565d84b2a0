//! Domain error types
//!
//! Errors returned by lifecycle operations (activation). Guarded call sites
//! never see these; they are reported to whoever activates monitoring.

use thiserror::Error;

use crate::config::ValidationError;

/// Errors that can occur while changing the monitoring lifecycle
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MonitorError {
    /// No endpoint configured; monitoring stays off
    #[error("Monitoring endpoint is not configured")]
    MissingEndpoint,

    /// Configuration failed validation
    #[error("Invalid monitoring configuration: {}", join_errors(.0))]
    InvalidConfig(Vec<ValidationError>),

    /// The transport could not be constructed
    #[error("Failed to create transport: {0}")]
    Transport(String),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
