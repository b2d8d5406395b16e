//! Prometheus metrics infrastructure

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, response::IntoResponse, routing::get, Router};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;
use regex::Regex;

use super::config::MetricsConfig;

static UUID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}").unwrap()
});

static NUMERIC_SEGMENT_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\d+(/|$)").unwrap());

/// Prometheus metrics handle for serving metrics endpoint
#[derive(Clone)]
pub struct PrometheusMetrics {
    handle: Arc<PrometheusHandle>,
}

impl PrometheusMetrics {
    /// Get the metrics as a string for the /metrics endpoint
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Initialize Prometheus metrics
pub fn init_metrics(config: &MetricsConfig) -> Option<PrometheusMetrics> {
    if !config.enabled {
        tracing::info!("Prometheus metrics disabled");
        return None;
    }

    let recorder = build_exporter(config).and_then(|builder| builder.install_recorder());

    match recorder {
        Ok(handle) => {
            gauge!(
                "pcp_assist_info",
                "version" => env!("CARGO_PKG_VERSION"),
                "service" => config.service_name.clone()
            )
            .set(1.0);

            tracing::info!(path = %config.path, "Prometheus metrics initialized");

            Some(PrometheusMetrics {
                handle: Arc::new(handle),
            })
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize Prometheus metrics");
            None
        }
    }
}

fn build_exporter(config: &MetricsConfig) -> Result<PrometheusBuilder, BuildError> {
    let mut builder = PrometheusBuilder::new();

    if !config.turn_duration_buckets.is_empty() {
        builder = builder.set_buckets_for_metric(
            Matcher::Full("conversation_turn_duration_seconds".to_string()),
            &config.turn_duration_buckets,
        )?;
    }

    if !config.request_duration_buckets.is_empty() {
        builder = builder.set_buckets_for_metric(
            Matcher::Suffix("request_duration_seconds".to_string()),
            &config.request_duration_buckets,
        )?;
    }

    Ok(builder)
}

/// Create the metrics router
pub fn create_metrics_router(metrics: PrometheusMetrics, path: &str) -> Router {
    Router::new()
        .route(path, get(metrics_handler))
        .with_state(metrics)
}

async fn metrics_handler(State(metrics): State<PrometheusMetrics>) -> impl IntoResponse {
    metrics.render()
}

/// Record an HTTP request metric
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());

    if status >= 500 {
        counter!("http_server_errors_total", &labels).increment(1);
    }
}

/// Parameters for LLM request metrics
pub struct LlmRequestMetricParams<'a> {
    pub provider: &'a str,
    pub model: &'a str,
    pub duration: Duration,
    pub success: bool,
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
}

/// Record an LLM request metric
pub fn record_llm_request(params: LlmRequestMetricParams) {
    let labels = [
        ("provider", params.provider.to_string()),
        ("model", params.model.to_string()),
        ("status", status_label(params.success).to_string()),
    ];

    counter!("llm_requests_total", &labels).increment(1);
    histogram!("llm_request_duration_seconds", &labels).record(params.duration.as_secs_f64());

    if let Some(tokens) = params.input_tokens {
        counter!("llm_input_tokens_total", &labels).increment(tokens);
    }

    if let Some(tokens) = params.output_tokens {
        counter!("llm_output_tokens_total", &labels).increment(tokens);
    }
}

/// Record a call to a provider or member directory operation
pub fn record_directory_request(operation: &str, success: bool, duration: Duration) {
    let labels = [
        ("operation", operation.to_string()),
        ("status", status_label(success).to_string()),
    ];

    counter!("directory_requests_total", &labels).increment(1);
    histogram!("directory_request_duration_seconds", &labels).record(duration.as_secs_f64());
}

/// Record one conversation turn and the stage it ended on
pub fn record_turn(stage: &str, success: bool, duration: Duration) {
    let labels = [
        ("stage", stage.to_string()),
        ("status", status_label(success).to_string()),
    ];

    counter!("conversation_turns_total", &labels).increment(1);
    histogram!("conversation_turn_duration_seconds", &labels).record(duration.as_secs_f64());
}

/// Record the steps a turn executed
pub fn record_workflow_steps(steps: &[&str]) {
    for step in steps {
        counter!("workflow_steps_total", "step" => step.to_string()).increment(1);
    }
}

fn status_label(success: bool) -> &'static str {
    if success { "success" } else { "error" }
}

/// Sanitize URL path for metric labels (remove IDs, limit cardinality)
fn sanitize_path(path: &str) -> String {
    let path = UUID_PATTERN.replace_all(path, "{id}");
    let path = NUMERIC_SEGMENT_PATTERN.replace_all(&path, "/{id}$1");

    path.chars().take(50).collect()
}
