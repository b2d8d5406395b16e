//! Observability infrastructure - Prometheus metrics

mod config;
mod metrics;

pub use self::config::{MetricsConfig, ObservabilityConfig};
pub use self::metrics::{
    create_metrics_router, init_metrics, record_directory_request, record_http_request,
    record_llm_request, record_turn, record_workflow_steps, LlmRequestMetricParams,
    PrometheusMetrics,
};
