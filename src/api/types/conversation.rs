//! Conversation endpoint payloads

use serde::{Deserialize, Serialize};

use crate::infrastructure::services::TurnRequest;

/// Body of `POST /v1/conversations/turn`
#[derive(Debug, Clone, Deserialize)]
pub struct TurnRequestBody {
    pub thread_id: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub member_id: Option<String>,
    #[serde(default)]
    pub interaction_id: Option<String>,
}

impl From<TurnRequestBody> for TurnRequest {
    fn from(body: TurnRequestBody) -> Self {
        Self {
            thread_id: body.thread_id,
            message: body.message,
            member_id: body.member_id,
            interaction_id: body.interaction_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadDeletedResponse {
    pub thread_id: String,
    pub deleted: bool,
}
