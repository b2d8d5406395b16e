//! Observability configuration

use serde::Deserialize;

/// `[observability]` section
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ObservabilityConfig {
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Prometheus exporter settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    /// Route the exporter is mounted on
    pub path: String,
    /// Reported on the `pcp_assist_info` gauge
    pub service_name: String,
    /// Histogram buckets (seconds) for whole conversation turns
    pub turn_duration_buckets: Vec<f64>,
    /// Histogram buckets (seconds) for every `*_request_duration_seconds` metric
    pub request_duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/metrics".to_string(),
            service_name: "pcp-assist".to_string(),
            turn_duration_buckets: vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0],
            request_duration_buckets: vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 15.0],
        }
    }
}
