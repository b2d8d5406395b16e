//! Versioned API endpoints

pub mod conversations;

use axum::{
    routing::{get, post},
    Router,
};

use super::state::AppState;

/// Create v1 API router
pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/conversations/turn", post(conversations::post_turn))
        .route(
            "/conversations/{thread_id}",
            get(conversations::get_thread).delete(conversations::delete_thread),
        )
}
