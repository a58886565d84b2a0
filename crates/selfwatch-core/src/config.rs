//! Configuration module for selfwatch.
//!
//! Provides the typed activation configuration for internal monitoring,
//! with defaults, validation, and a builder pattern for programmatic use.
//! Hosts embed [`MonitoringConfig`] in their own configuration files; this
//! crate never reads files itself.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// MonitoringConfig
// ---------------------------------------------------------------------------

/// Activation settings for internal monitoring.
///
/// An absent `endpoint` disables monitoring entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    /// Destination URL for diagnostic records.
    pub endpoint: Option<String>,
    /// Maximum number of records grouped in a single batch.
    pub max_batch_size: usize,
    /// Maximum size (in bytes) of a single batch body.
    pub batch_bytes_limit: usize,
    /// Records whose serialized size exceeds this (in bytes) are dropped.
    pub max_record_size: usize,
    /// Milliseconds between periodic flushes of a partial batch.
    pub flush_interval_ms: u64,
    /// Ceiling on records forwarded per activation.
    pub max_records_per_activation: u32,
}

/// One KiB, used for the size defaults.
const ONE_KIB: usize = 1024;

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            max_batch_size: 50,
            batch_bytes_limit: 16 * ONE_KIB,
            max_record_size: 256 * ONE_KIB,
            flush_interval_ms: 30_000,
            max_records_per_activation: 15,
        }
    }
}

/// Parameters handed to a transport constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportSettings {
    pub endpoint: String,
    pub max_batch_size: usize,
    pub batch_bytes_limit: usize,
    pub max_record_size: usize,
    pub flush_interval: Duration,
}

impl MonitoringConfig {
    /// Returns the flush interval as a [`Duration`].
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    /// Derives transport parameters, or `None` when no endpoint is set.
    pub fn transport_settings(&self) -> Option<TransportSettings> {
        let endpoint = self.endpoint.as_ref()?;
        Some(TransportSettings {
            endpoint: endpoint.clone(),
            max_batch_size: self.max_batch_size,
            batch_bytes_limit: self.batch_bytes_limit,
            max_record_size: self.max_record_size,
            flush_interval: self.flush_interval(),
        })
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Name of the offending field, e.g. `"max_batch_size"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// URL schemes accepted for `endpoint`.
const VALID_SCHEMES: &[&str] = &["http://", "https://"];

impl MonitoringConfig {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid. A missing endpoint
    /// is not an error here: it simply means monitoring stays off.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if let Some(endpoint) = &self.endpoint {
            if !VALID_SCHEMES.iter().any(|s| endpoint.starts_with(s)) {
                errors.push(ValidationError {
                    field: "endpoint".into(),
                    message: format!(
                        "invalid endpoint '{}'; must start with {}",
                        endpoint,
                        VALID_SCHEMES.join(" or ")
                    ),
                });
            }
        }

        if self.max_batch_size == 0 {
            errors.push(ValidationError {
                field: "max_batch_size".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.batch_bytes_limit == 0 {
            errors.push(ValidationError {
                field: "batch_bytes_limit".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.max_record_size == 0 {
            errors.push(ValidationError {
                field: "max_record_size".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.flush_interval_ms == 0 {
            errors.push(ValidationError {
                field: "flush_interval_ms".into(),
                message: "must be greater than 0".into(),
            });
        }

        // max_records_per_activation == 0 is valid: monitoring is on but fully capped.

        errors
    }
}

// ---------------------------------------------------------------------------
// MonitoringConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`MonitoringConfig`] programmatically.
///
/// Starts from [`MonitoringConfig::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust
/// use selfwatch_core::config::MonitoringConfigBuilder;
///
/// let config = MonitoringConfigBuilder::new()
///     .endpoint("https://intake.example.com/internal")
///     .max_records_per_activation(5)
///     .build();
/// assert_eq!(config.max_records_per_activation, 5);
/// ```
#[derive(Debug, Clone)]
pub struct MonitoringConfigBuilder {
    config: MonitoringConfig,
}

impl MonitoringConfigBuilder {
    /// Create a new builder initialised with [`MonitoringConfig::default`] values.
    pub fn new() -> Self {
        Self {
            config: MonitoringConfig::default(),
        }
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = Some(endpoint.into());
        self
    }

    pub fn max_batch_size(mut self, n: usize) -> Self {
        self.config.max_batch_size = n;
        self
    }

    pub fn batch_bytes_limit(mut self, bytes: usize) -> Self {
        self.config.batch_bytes_limit = bytes;
        self
    }

    pub fn max_record_size(mut self, bytes: usize) -> Self {
        self.config.max_record_size = bytes;
        self
    }

    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.config.flush_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn max_records_per_activation(mut self, n: u32) -> Self {
        self.config.max_records_per_activation = n;
        self
    }

    /// Consume the builder and return the finished [`MonitoringConfig`].
    pub fn build(self) -> MonitoringConfig {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<MonitoringConfig, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for MonitoringConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- Defaults --

    #[test]
    fn default_config_has_sensible_values() {
        let cfg = MonitoringConfig::default();
        assert!(cfg.endpoint.is_none());
        assert_eq!(cfg.max_batch_size, 50);
        assert_eq!(cfg.batch_bytes_limit, 16 * 1024);
        assert_eq!(cfg.max_record_size, 256 * 1024);
        assert_eq!(cfg.flush_interval_ms, 30_000);
        assert_eq!(cfg.max_records_per_activation, 15);
    }

    #[test]
    fn default_config_passes_validation() {
        assert!(MonitoringConfig::default().validate().is_empty());
    }

    // -- Deserialization --

    #[test]
    fn deserializes_from_yaml() {
        let yaml = r#"
endpoint: "https://intake.example.com/monitoring"
max_batch_size: 1
batch_bytes_limit: 100
max_record_size: 2048
flush_interval_ms: 60000
max_records_per_activation: 7
"#;
        let cfg: MonitoringConfig = serde_yaml::from_str(yaml).expect("parse config");
        assert_eq!(
            cfg.endpoint.as_deref(),
            Some("https://intake.example.com/monitoring")
        );
        assert_eq!(cfg.max_batch_size, 1);
        assert_eq!(cfg.batch_bytes_limit, 100);
        assert_eq!(cfg.max_record_size, 2048);
        assert_eq!(cfg.flush_interval_ms, 60_000);
        assert_eq!(cfg.max_records_per_activation, 7);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let cfg: MonitoringConfig =
            serde_yaml::from_str("max_records_per_activation: 3\n").expect("parse config");
        assert!(cfg.endpoint.is_none());
        assert_eq!(cfg.max_records_per_activation, 3);
        assert_eq!(cfg.max_batch_size, 50);
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let result: Result<MonitoringConfig, _> = serde_yaml::from_str("not: [valid: yaml: {{{");
        assert!(result.is_err());
    }

    // -- Transport settings --

    #[test]
    fn transport_settings_absent_without_endpoint() {
        assert!(MonitoringConfig::default().transport_settings().is_none());
    }

    #[test]
    fn transport_settings_carry_size_parameters() {
        let cfg = MonitoringConfigBuilder::new()
            .endpoint("http://localhost/monitoring")
            .max_batch_size(3)
            .batch_bytes_limit(500)
            .max_record_size(200)
            .flush_interval(Duration::from_secs(2))
            .build();

        let settings = cfg.transport_settings().expect("settings");
        assert_eq!(settings.endpoint, "http://localhost/monitoring");
        assert_eq!(settings.max_batch_size, 3);
        assert_eq!(settings.batch_bytes_limit, 500);
        assert_eq!(settings.max_record_size, 200);
        assert_eq!(settings.flush_interval, Duration::from_secs(2));
    }

    // -- Validation --

    #[test]
    fn validate_catches_bad_endpoint_scheme() {
        let mut cfg = MonitoringConfig::default();
        cfg.endpoint = Some("ftp://example.com".into());
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "endpoint"));
    }

    #[test]
    fn validate_catches_zero_sizes() {
        let mut cfg = MonitoringConfig::default();
        cfg.max_batch_size = 0;
        cfg.batch_bytes_limit = 0;
        cfg.max_record_size = 0;
        cfg.flush_interval_ms = 0;
        let fields: Vec<String> = cfg.validate().into_iter().map(|e| e.field).collect();
        assert!(fields.contains(&"max_batch_size".to_string()));
        assert!(fields.contains(&"batch_bytes_limit".to_string()));
        assert!(fields.contains(&"max_record_size".to_string()));
        assert!(fields.contains(&"flush_interval_ms".to_string()));
    }

    #[test]
    fn validate_accepts_zero_ceiling() {
        let cfg = MonitoringConfigBuilder::new()
            .endpoint("https://example.com")
            .max_records_per_activation(0)
            .build();
        assert!(cfg.validate().is_empty());
    }

    // -- Builder --

    #[test]
    fn builder_starts_from_defaults() {
        let cfg = MonitoringConfigBuilder::new().build();
        assert_eq!(cfg, MonitoringConfig::default());
    }

    #[test]
    fn builder_build_validated_fails_for_invalid_config() {
        let result = MonitoringConfigBuilder::new()
            .max_batch_size(0)
            .build_validated();
        let errors = result.unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "max_batch_size");
    }

    #[test]
    fn validation_error_display() {
        let err = ValidationError {
            field: "max_batch_size".into(),
            message: "must be greater than 0".into(),
        };
        assert_eq!(err.to_string(), "max_batch_size: must be greater than 0");
    }
}
