//! Probe endpoints

use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use super::state::AppState;
use crate::api::types::Json;

const SERVICE_NAME: &str = "pcp-assist";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub service: &'static str,
    pub status: HealthStatus,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<Vec<HealthCheck>>,
    /// Threads currently parked in the state store
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_threads: Option<usize>,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Serialize)]
pub struct HealthCheck {
    pub name: &'static str,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub latency_ms: u64,
}

impl HealthResponse {
    fn healthy() -> Self {
        Self {
            service: SERVICE_NAME,
            status: HealthStatus::Healthy,
            version: env!("CARGO_PKG_VERSION"),
            checks: None,
            active_threads: None,
        }
    }
}

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse::healthy()))
}

/// GET /ready - answers 503 until the state store responds
pub async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();
    let result = state.conversation_service.thread_count().await;
    let latency_ms = start.elapsed().as_millis() as u64;

    let (check, active_threads) = match result {
        Ok(count) => (
            HealthCheck {
                name: "state_store",
                status: HealthStatus::Healthy,
                message: None,
                latency_ms,
            },
            Some(count),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            (
                HealthCheck {
                    name: "state_store",
                    status: HealthStatus::Unhealthy,
                    message: Some(e.to_string()),
                    latency_ms,
                },
                None,
            )
        }
    };

    let status = check.status;
    let response = HealthResponse {
        status,
        checks: Some(vec![check]),
        active_threads,
        ..HealthResponse::healthy()
    };

    let code = match status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (code, Json(response))
}

/// GET /live
pub async fn live_check() -> impl IntoResponse {
    StatusCode::OK
}
