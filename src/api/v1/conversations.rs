//! Conversation endpoints

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, ThreadDeletedResponse, TurnRequestBody};
use crate::domain::DomainError;

/// POST /v1/conversations/turn
///
/// Every turn that reaches the engine answers 200 with the response record;
/// failures inside the flow are reported through `APIStatus`.
pub async fn post_turn(
    State(state): State<AppState>,
    Json(body): Json<TurnRequestBody>,
) -> Result<Response, ApiError> {
    debug!(
        thread_id = %body.thread_id,
        message_len = body.message.len(),
        has_member = body.member_id.is_some(),
        "Received turn"
    );

    let reply = state
        .conversation_service
        .handle_turn(body.into())
        .await
        .map_err(|e| match e {
            DomainError::Validation { .. } => ApiError::from(e).with_param("thread_id"),
            other => ApiError::from(other),
        })?;

    Ok(Json(reply).into_response())
}

/// GET /v1/conversations/{thread_id}
pub async fn get_thread(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
) -> Result<Response, ApiError> {
    let view = state
        .conversation_service
        .get_thread(&thread_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Thread '{}' not found", thread_id)))?;

    Ok(Json(view).into_response())
}

/// DELETE /v1/conversations/{thread_id}
pub async fn delete_thread(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
) -> Result<Response, ApiError> {
    let deleted = state.conversation_service.remove_thread(&thread_id).await?;

    if !deleted {
        return Err(ApiError::not_found(format!(
            "Thread '{}' not found",
            thread_id
        )));
    }

    Ok(Json(ThreadDeletedResponse { thread_id, deleted }).into_response())
}
