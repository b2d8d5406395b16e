//! Per-thread conversation state

use serde::{Deserialize, Serialize};

use crate::domain::directory::{ProviderAddress, ProviderQuery, ProviderRecord};
use crate::domain::intent::{FollowupKind, MenuIntent};

/// Which flow the conversation is currently in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flow {
    Pcp,
    Specialist,
    Other,
}

/// Whether the caller already knows the provider they want.
///
/// `Unknown` means the question has not been answered yet and must never be
/// read as `No`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KnowsProvider {
    #[default]
    Unknown,
    Yes,
    No,
}

/// Rendering hint for the UI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseType {
    #[default]
    #[serde(rename = "AURA")]
    Aura,
    #[serde(rename = "Dialog")]
    Dialog,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aura => "AURA",
            Self::Dialog => "Dialog",
        }
    }
}

/// Kind of collaborator that produced the last outward-facing message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallType {
    Llm,
    Api,
}

/// Mutable record of one conversation thread
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    // Identity
    pub thread_id: String,
    pub member_id: Option<String>,
    pub interaction_id: Option<String>,

    // Control
    pub stage: Option<String>,
    pub flow: Option<Flow>,
    pub menu_intent: Option<MenuIntent>,
    /// Owned by the engine; steps must not write it
    pub resume_position: Option<String>,

    // Turn I/O
    pub last_user_input: Option<String>,
    pub ai_response: Option<String>,
    pub ai_response_code: Option<u16>,
    pub ai_response_type: Option<ResponseType>,
    pub prompt_title: Option<String>,
    pub prompts: Vec<String>,
    /// Message a step queued for its own next suspension
    pub pending_notice: Option<String>,

    // Captured facts
    pub raw_termination_input: Option<String>,
    pub termination_reason: Option<String>,
    pub knows_provider: KnowsProvider,
    pub raw_provider_input: Option<String>,
    pub raw_filter_input: Option<String>,
    pub specialist_service: Option<String>,
    pub provider_query: ProviderQuery,
    pub group_id: Option<String>,
    pub subscriber_id: Option<String>,
    pub member_suffix: Option<String>,
    pub member_key: Option<String>,
    pub active_provider_id: Option<String>,
    pub active_effective_date: Option<String>,

    // Results
    pub providers_result: Option<Vec<ProviderRecord>>,
    pub last_selected_provider_id: Option<String>,
    pub selected_provider_snapshot: Option<ProviderRecord>,
    pub provider_addresses: Option<Vec<ProviderAddress>>,

    // Loop control
    pub last_followup_action: Option<FollowupKind>,
    pub wants_more_help: Option<bool>,

    // Diagnostics
    pub call_type: Option<CallType>,
    pub call_name: Option<String>,
}

impl ConversationState {
    /// Fresh state for a thread, empty except identity
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            ..Default::default()
        }
    }

    /// Take the pending user input, leaving `None` behind.
    ///
    /// Blank input counts as no input.
    pub fn take_input(&mut self) -> Option<String> {
        self.last_user_input
            .take()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    pub fn has_input(&self) -> bool {
        self.last_user_input
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty())
    }

    /// Start over after a finished traversal.
    ///
    /// Identity and member fields survive; everything captured for the
    /// previous PCP or specialist request is dropped.
    pub fn restart(&mut self) {
        let retained = Self {
            thread_id: std::mem::take(&mut self.thread_id),
            member_id: self.member_id.take(),
            interaction_id: self.interaction_id.take(),
            group_id: self.group_id.take(),
            subscriber_id: self.subscriber_id.take(),
            member_suffix: self.member_suffix.take(),
            member_key: self.member_key.take(),
            active_provider_id: self.active_provider_id.take(),
            active_effective_date: self.active_effective_date.take(),
            last_user_input: self.last_user_input.take(),
            ..Default::default()
        };

        *self = retained;
    }

    /// Drop member-derived fields, used when the caller switches member
    pub fn clear_member(&mut self) {
        self.group_id = None;
        self.subscriber_id = None;
        self.member_suffix = None;
        self.member_key = None;
        self.active_provider_id = None;
        self.active_effective_date = None;
    }

    /// Whether the member case has been loaded
    pub fn has_member_case(&self) -> bool {
        self.group_id.is_some() && self.subscriber_id.is_some()
    }

    /// Whether a search returned at least one provider
    pub fn has_search_results(&self) -> bool {
        self.providers_result
            .as_ref()
            .is_some_and(|results| !results.is_empty())
    }

    /// Look up a provider in the current search results
    pub fn find_provider(&self, provider_id: &str) -> Option<&ProviderRecord> {
        self.providers_result
            .as_ref()?
            .iter()
            .find(|p| p.provider_id == provider_id)
    }

    pub fn record_llm_call(&mut self, name: impl Into<String>) {
        self.call_type = Some(CallType::Llm);
        self.call_name = Some(name.into());
    }

    pub fn record_api_call(&mut self, name: impl Into<String>) {
        self.call_type = Some(CallType::Api);
        self.call_name = Some(name.into());
    }

    /// Diagnostic label for the last collaborator call
    pub fn call_source(&self) -> String {
        match (self.call_type, self.call_name.as_deref()) {
            (Some(CallType::Llm), Some(name)) => format!("LLM:{}", name),
            (Some(CallType::Llm), None) => "LLM".to_string(),
            (Some(CallType::Api), Some(name)) => format!("API:{}", name),
            (Some(CallType::Api), None) => "API".to_string(),
            (None, _) => String::new(),
        }
    }
}
