use axum::{middleware, routing::get, Router};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use super::health;
use super::middleware::{logging_middleware, metrics_middleware};
use super::state::AppState;
use super::v1;
use crate::infrastructure::observability::{create_metrics_router, PrometheusMetrics};

/// Create the full router with application state.
///
/// The metrics endpoint is mounted at `metrics_path` when a recorder is given.
pub fn create_router(
    state: AppState,
    metrics: Option<PrometheusMetrics>,
    metrics_path: &str,
) -> Router {
    let mut router = Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        .nest("/v1", v1::create_v1_router())
        .with_state(state)
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    if let Some(m) = metrics {
        router = router.merge(create_metrics_router(m, metrics_path));
    }

    router
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use chrono::Local;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::api::state::ConversationServiceTrait;
    use crate::domain::conversation::ConversationState;
    use crate::domain::{DomainError, ResponseMapper, TurnReply};
    use crate::infrastructure::services::{ThreadStats, ThreadView, TurnRequest};

    /// Service answering every turn with an error record and knowing one thread
    #[derive(Default)]
    struct StubConversationService {
        requests: Mutex<Vec<TurnRequest>>,
    }

    #[async_trait::async_trait]
    impl ConversationServiceTrait for StubConversationService {
        async fn handle_turn(&self, request: TurnRequest) -> Result<TurnReply, DomainError> {
            if request.thread_id.is_empty() {
                return Err(DomainError::validation("thread_id is required"));
            }
            let reply = ResponseMapper::error(&request.thread_id, &request.message, "stub", Local::now());
            self.requests.lock().unwrap().push(request);
            Ok(reply)
        }

        async fn get_thread(&self, thread_id: &str) -> Result<Option<ThreadView>, DomainError> {
            Ok((thread_id == "known").then(|| ThreadView {
                thread_id: thread_id.to_string(),
                resume_position: Some("start".to_string()),
                state: ConversationState::new(thread_id),
                stats: ThreadStats::default(),
            }))
        }

        async fn remove_thread(&self, thread_id: &str) -> Result<bool, DomainError> {
            Ok(thread_id == "known")
        }

        async fn thread_count(&self) -> Result<usize, DomainError> {
            Ok(1)
        }
    }

    fn app() -> Router {
        let service = std::sync::Arc::new(StubConversationService::default());
        create_router(AppState::new(service), None, "/metrics")
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_turn(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/v1/conversations/turn")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_post_turn_returns_record() {
        let response = app()
            .oneshot(post_turn(json!({"thread_id": "t1", "message": "Assign PCP"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        let body = body_json(response).await;
        assert_eq!(body["APISessionId"], "t1");
        assert_eq!(body["CSRQuery"], "Assign PCP");
        assert_eq!(body["CurrentStage"], "ERROR");
    }

    #[tokio::test]
    async fn test_post_turn_validation_error() {
        let response = app()
            .oneshot(post_turn(json!({"thread_id": "", "message": "hi"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["type"], "invalid_request_error");
        assert_eq!(body["error"]["param"], "thread_id");
    }

    #[tokio::test]
    async fn test_get_thread() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/v1/conversations/known")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["resume_position"], "start");
        assert_eq!(body["stats"]["turns"], 0);
    }

    #[tokio::test]
    async fn test_unknown_thread_is_not_found() {
        for method in ["GET", "DELETE"] {
            let response = app()
                .oneshot(
                    Request::builder()
                        .method(method)
                        .uri("/v1/conversations/missing")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::NOT_FOUND);
        }
    }

    #[tokio::test]
    async fn test_delete_thread() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/v1/conversations/known")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["deleted"], true);
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        for uri in ["/health", "/ready", "/live"] {
            let response = app()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK, "{}", uri);
        }
    }
}
