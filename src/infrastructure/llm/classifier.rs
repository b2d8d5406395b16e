//! [`Classifier`] backed by a chat model

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::prompts;
use crate::domain::directory::ProviderQuery;
use crate::domain::intent::{Classifier, FollowupAction, FollowupKind, MenuIntent, YesNo};
use crate::domain::{DomainError, LlmProvider, LlmRequest};

const SOURCE: &str = "llm-classifier";

#[derive(Debug, Deserialize)]
struct MenuReply {
    intent: MenuIntent,
}

#[derive(Debug, Deserialize)]
struct YesNoReply {
    answer: YesNo,
}

#[derive(Debug, Deserialize)]
struct ReasonReply {
    reason: String,
}

#[derive(Debug, Deserialize)]
struct FollowupReply {
    action: FollowupKind,
    #[serde(default)]
    provider_id: Option<String>,
}

/// Interprets free text by prompting a chat model for JSON answers.
///
/// Replies that do not contain the expected object fail with
/// [`DomainError::Unparseable`]; steps then fall back to rule-based parsing.
#[derive(Debug)]
pub struct LlmClassifier {
    provider: Arc<dyn LlmProvider>,
    model: String,
}

impl LlmClassifier {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    async fn complete(&self, system: &str, user: &str) -> Result<String, DomainError> {
        let request = LlmRequest::builder()
            .system(system)
            .user(user)
            .build();

        let response = self.provider.chat(&self.model, request).await?;

        response
            .content()
            .map(str::to_string)
            .ok_or_else(|| DomainError::unparseable(SOURCE, "Empty model reply"))
    }

    async fn ask<T: DeserializeOwned>(&self, system: &str, user: &str) -> Result<T, DomainError> {
        let reply = self.complete(system, user).await?;
        let json = extract_json_object(&reply).ok_or_else(|| {
            DomainError::unparseable(SOURCE, format!("No JSON object in reply: {}", reply))
        })?;

        serde_json::from_str(json).map_err(|e| {
            tracing::debug!(reply = %reply, error = %e, "Model reply did not match schema");
            DomainError::unparseable(SOURCE, format!("Unexpected reply shape: {}", e))
        })
    }
}

#[async_trait]
impl Classifier for LlmClassifier {
    async fn classify_menu(&self, message: &str) -> Result<MenuIntent, DomainError> {
        let reply: MenuReply = self.ask(prompts::MENU_INTENT, message).await?;
        Ok(reply.intent)
    }

    async fn classify_yes_no(&self, question: &str, answer: &str) -> Result<YesNo, DomainError> {
        let reply: YesNoReply = self
            .ask(prompts::YES_NO, &prompts::yes_no_message(question, answer))
            .await?;
        Ok(reply.answer)
    }

    async fn normalize_termination_reason(&self, message: &str) -> Result<String, DomainError> {
        let reply: ReasonReply = self.ask(prompts::TERMINATION_REASON, message).await?;
        let reason = reply.reason.trim();

        if reason.is_empty() {
            return Err(DomainError::unparseable(SOURCE, "Blank termination reason"));
        }

        Ok(reason.to_string())
    }

    async fn parse_provider_query(&self, message: &str) -> Result<ProviderQuery, DomainError> {
        self.ask(prompts::PROVIDER_QUERY, message).await
    }

    async fn parse_search_filters(&self, message: &str) -> Result<ProviderQuery, DomainError> {
        self.ask(prompts::SEARCH_FILTERS, message).await
    }

    async fn classify_followup(
        &self,
        message: &str,
        provider_ids: &[String],
    ) -> Result<FollowupAction, DomainError> {
        let reply: FollowupReply = self
            .ask(
                prompts::FOLLOWUP,
                &prompts::followup_message(message, provider_ids),
            )
            .await?;

        let provider_id = reply
            .provider_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());

        match reply.action {
            FollowupKind::AssignPcp => Ok(FollowupAction::AssignPcp { provider_id }),
            FollowupKind::AddressInquiry => Ok(FollowupAction::AddressInquiry { provider_id }),
            FollowupKind::Question => Ok(FollowupAction::Question),
            FollowupKind::ProviderIdOnly => provider_id
                .map(|provider_id| FollowupAction::ProviderIdOnly { provider_id })
                .ok_or_else(|| {
                    DomainError::unparseable(SOURCE, "provider_id_only without a provider id")
                }),
        }
    }

    async fn phrase_prompt(&self, template: &str) -> Result<String, DomainError> {
        self.complete(prompts::PHRASE_PROMPT, template).await
    }
}

/// First balanced `{...}` block in `text`, skipping braces inside strings
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}
