//! Turn result to response record mapping

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::stages;
use crate::domain::conversation::{ConversationState, ResponseType};
use crate::domain::directory::render_provider_list;
use crate::domain::workflow::EngineOutcome;

const DATE_TIME_FORMAT: &str = "%m/%d/%Y %I:%M %p";

pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_ERROR: &str = "error";

/// Response record returned for every turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnReply {
    #[serde(rename = "APIStatus")]
    pub api_status: String,
    #[serde(rename = "APISessionId")]
    pub api_session_id: String,
    #[serde(rename = "CSRQuery")]
    pub csr_query: String,
    #[serde(rename = "AIResponse")]
    pub ai_response: String,
    #[serde(rename = "AIResponseType")]
    pub ai_response_type: ResponseType,
    #[serde(rename = "AIResponseCode")]
    pub ai_response_code: u16,
    #[serde(rename = "AIResponseDateTime")]
    pub ai_response_date_time: String,
    #[serde(rename = "CurrentStage")]
    pub current_stage: String,
    #[serde(rename = "PromptTitle")]
    pub prompt_title: String,
    #[serde(rename = "Prompts")]
    pub prompts: Vec<String>,
    #[serde(rename = "CallSource")]
    pub call_source: String,
}

impl TurnReply {
    pub fn is_error(&self) -> bool {
        self.api_status == STATUS_ERROR
    }
}

/// Builds [`TurnReply`] records
pub struct ResponseMapper;

impl ResponseMapper {
    /// Map an engine outcome and the saved state to the response record.
    ///
    /// A suspension is reported from its interrupt; a completed traversal
    /// from the turn output fields the last step left on the state.
    pub fn map(
        outcome: &EngineOutcome,
        state: &ConversationState,
        csr_query: &str,
        now: DateTime<Local>,
    ) -> TurnReply {
        let (stage, mut message, mut code, response_type, prompt_title, prompts) = match outcome {
            EngineOutcome::Suspended { interrupt, .. } => (
                interrupt.stage.clone(),
                interrupt.message.clone(),
                interrupt.code,
                interrupt.response_type,
                interrupt.prompt_title.clone(),
                interrupt.prompts.clone(),
            ),
            EngineOutcome::Completed { .. } => (
                state
                    .stage
                    .clone()
                    .unwrap_or_else(|| stages::END.to_string()),
                state.ai_response.clone().unwrap_or_default(),
                state.ai_response_code.unwrap_or(200),
                state.ai_response_type.unwrap_or_default(),
                state.prompt_title.clone(),
                state.prompts.clone(),
            ),
        };

        match stage.as_str() {
            stages::SHOW_PROVIDER_LIST => {
                if let Some(ref results) = state.providers_result {
                    message = render_provider_list(results);
                }
            }
            stages::ERROR => code = 500,
            _ => {}
        }

        let api_status = if stage == stages::ERROR {
            STATUS_ERROR
        } else {
            STATUS_SUCCESS
        };

        TurnReply {
            api_status: api_status.to_string(),
            api_session_id: state.thread_id.clone(),
            csr_query: csr_query.to_string(),
            ai_response: message,
            ai_response_type: response_type,
            ai_response_code: code,
            ai_response_date_time: now.format(DATE_TIME_FORMAT).to_string(),
            current_stage: stage,
            prompt_title: prompt_title.unwrap_or_default(),
            prompts,
            call_source: state.call_source(),
        }
    }

    /// Record for a turn the engine could not run at all
    pub fn error(
        thread_id: &str,
        csr_query: &str,
        message: impl Into<String>,
        now: DateTime<Local>,
    ) -> TurnReply {
        TurnReply {
            api_status: STATUS_ERROR.to_string(),
            api_session_id: thread_id.to_string(),
            csr_query: csr_query.to_string(),
            ai_response: message.into(),
            ai_response_type: ResponseType::Aura,
            ai_response_code: 500,
            ai_response_date_time: now.format(DATE_TIME_FORMAT).to_string(),
            current_stage: stages::ERROR.to_string(),
            prompt_title: String::new(),
            prompts: Vec::new(),
            call_source: String::new(),
        }
    }
}
