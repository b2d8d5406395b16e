//! Per-route HTTP metrics

use std::time::Instant;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::infrastructure::observability::record_http_request;

/// Kubernetes probes hit these every few seconds
const UNRECORDED_PATHS: [&str; 3] = ["/health", "/ready", "/live"];

/// Record count and latency for every API call except probes
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let path = route_label(&request);
    if UNRECORDED_PATHS.contains(&path.as_str()) {
        return next.run(request).await;
    }

    let start = Instant::now();
    let method = request.method().clone();
    let response = next.run(request).await;

    record_http_request(
        method.as_str(),
        &path,
        response.status().as_u16(),
        start.elapsed(),
    );

    response
}

/// Route template when routing matched, so thread ids stay out of labels
fn route_label(request: &Request<Body>) -> String {
    match request.extensions().get::<MatchedPath>() {
        Some(matched) => matched.as_str().to_string(),
        None => request.uri().path().to_string(),
    }
}
