//! Application state for shared services

use std::sync::Arc;

use crate::domain::{DomainError, TurnReply};
use crate::infrastructure::services::{ConversationService, ThreadView, TurnRequest};

/// Application state containing shared services using dynamic dispatch
#[derive(Clone)]
pub struct AppState {
    pub conversation_service: Arc<dyn ConversationServiceTrait>,
}

impl AppState {
    pub fn new(conversation_service: Arc<dyn ConversationServiceTrait>) -> Self {
        Self {
            conversation_service,
        }
    }
}

/// Trait for conversation service operations
#[async_trait::async_trait]
pub trait ConversationServiceTrait: Send + Sync {
    async fn handle_turn(&self, request: TurnRequest) -> Result<TurnReply, DomainError>;
    async fn get_thread(&self, thread_id: &str) -> Result<Option<ThreadView>, DomainError>;
    async fn remove_thread(&self, thread_id: &str) -> Result<bool, DomainError>;
    async fn thread_count(&self) -> Result<usize, DomainError>;
}

#[async_trait::async_trait]
impl ConversationServiceTrait for ConversationService {
    async fn handle_turn(&self, request: TurnRequest) -> Result<TurnReply, DomainError> {
        ConversationService::handle_turn(self, request).await
    }

    async fn get_thread(&self, thread_id: &str) -> Result<Option<ThreadView>, DomainError> {
        ConversationService::get_thread(self, thread_id).await
    }

    async fn remove_thread(&self, thread_id: &str) -> Result<bool, DomainError> {
        ConversationService::remove_thread(self, thread_id).await
    }

    async fn thread_count(&self) -> Result<usize, DomainError> {
        ConversationService::thread_count(self).await
    }
}
