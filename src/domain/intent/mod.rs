//! Intent classification capability
//!
//! Steps ask a [`Classifier`] to interpret free text. Every answer is a typed
//! value; when the classifier fails or answers outside the expected set, the
//! step falls back to the rules in [`heuristics`].

pub mod heuristics;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::domain::directory::ProviderQuery;
use crate::domain::DomainError;

/// Top-level menu choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuIntent {
    AssignPcp,
    Specialist,
    Unsupported,
}

/// Answer to a yes/no question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YesNo {
    Yes,
    No,
    Unclear,
}

/// What the user wants to do with a provider list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowupAction {
    AssignPcp { provider_id: Option<String> },
    ProviderIdOnly { provider_id: String },
    AddressInquiry { provider_id: Option<String> },
    Question,
}

impl FollowupAction {
    pub fn kind(&self) -> FollowupKind {
        match self {
            Self::AssignPcp { .. } => FollowupKind::AssignPcp,
            Self::ProviderIdOnly { .. } => FollowupKind::ProviderIdOnly,
            Self::AddressInquiry { .. } => FollowupKind::AddressInquiry,
            Self::Question => FollowupKind::Question,
        }
    }

    pub fn provider_id(&self) -> Option<&str> {
        match self {
            Self::AssignPcp { provider_id } | Self::AddressInquiry { provider_id } => {
                provider_id.as_deref()
            }
            Self::ProviderIdOnly { provider_id } => Some(provider_id),
            Self::Question => None,
        }
    }
}

/// Follow-up classification as stored on the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowupKind {
    AssignPcp,
    ProviderIdOnly,
    AddressInquiry,
    Question,
}

impl FollowupKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AssignPcp => "assign_pcp",
            Self::ProviderIdOnly => "provider_id_only",
            Self::AddressInquiry => "address_inquiry",
            Self::Question => "question",
        }
    }
}

/// Free-text interpretation backed by a language model
#[async_trait]
pub trait Classifier: Send + Sync + Debug {
    async fn classify_menu(&self, message: &str) -> Result<MenuIntent, DomainError>;

    async fn classify_yes_no(&self, question: &str, answer: &str) -> Result<YesNo, DomainError>;

    /// Short normalized reason for ending the current PCP
    async fn normalize_termination_reason(&self, message: &str) -> Result<String, DomainError>;

    /// Provider id or name/city/state from a "I know the provider" answer
    async fn parse_provider_query(&self, message: &str) -> Result<ProviderQuery, DomainError>;

    /// ZIP, radius, language and gender from a filter answer
    async fn parse_search_filters(&self, message: &str) -> Result<ProviderQuery, DomainError>;

    async fn classify_followup(
        &self,
        message: &str,
        provider_ids: &[String],
    ) -> Result<FollowupAction, DomainError>;

    /// Conversational phrasing of a fixed prompt
    async fn phrase_prompt(&self, template: &str) -> Result<String, DomainError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;

    /// Classifier with scripted answers; unscripted calls fail as unparseable
    #[derive(Debug, Default, Clone)]
    pub struct MockClassifier {
        menu: Option<MenuIntent>,
        yes_no: Option<YesNo>,
        termination_reason: Option<String>,
        provider_query: Option<ProviderQuery>,
        search_filters: Option<ProviderQuery>,
        followup: Option<FollowupAction>,
        phrase: Option<String>,
    }

    impl MockClassifier {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_menu(mut self, intent: MenuIntent) -> Self {
            self.menu = Some(intent);
            self
        }

        pub fn with_yes_no(mut self, answer: YesNo) -> Self {
            self.yes_no = Some(answer);
            self
        }

        pub fn with_termination_reason(mut self, reason: impl Into<String>) -> Self {
            self.termination_reason = Some(reason.into());
            self
        }

        pub fn with_provider_query(mut self, query: ProviderQuery) -> Self {
            self.provider_query = Some(query);
            self
        }

        pub fn with_search_filters(mut self, filters: ProviderQuery) -> Self {
            self.search_filters = Some(filters);
            self
        }

        pub fn with_followup(mut self, action: FollowupAction) -> Self {
            self.followup = Some(action);
            self
        }

        pub fn with_phrase(mut self, phrase: impl Into<String>) -> Self {
            self.phrase = Some(phrase.into());
            self
        }

        fn scripted<T: Clone>(value: &Option<T>) -> Result<T, DomainError> {
            value
                .clone()
                .ok_or_else(|| DomainError::unparseable("mock-classifier", "no scripted answer"))
        }
    }

    #[async_trait]
    impl Classifier for MockClassifier {
        async fn classify_menu(&self, _message: &str) -> Result<MenuIntent, DomainError> {
            Self::scripted(&self.menu)
        }

        async fn classify_yes_no(
            &self,
            _question: &str,
            _answer: &str,
        ) -> Result<YesNo, DomainError> {
            Self::scripted(&self.yes_no)
        }

        async fn normalize_termination_reason(
            &self,
            _message: &str,
        ) -> Result<String, DomainError> {
            Self::scripted(&self.termination_reason)
        }

        async fn parse_provider_query(&self, _message: &str) -> Result<ProviderQuery, DomainError> {
            Self::scripted(&self.provider_query)
        }

        async fn parse_search_filters(&self, _message: &str) -> Result<ProviderQuery, DomainError> {
            Self::scripted(&self.search_filters)
        }

        async fn classify_followup(
            &self,
            _message: &str,
            _provider_ids: &[String],
        ) -> Result<FollowupAction, DomainError> {
            Self::scripted(&self.followup)
        }

        async fn phrase_prompt(&self, _template: &str) -> Result<String, DomainError> {
            Self::scripted(&self.phrase)
        }
    }
}
