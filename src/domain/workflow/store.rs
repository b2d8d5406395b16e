//! Per-thread persistence of conversation state and resume position

use async_trait::async_trait;
use serde::Serialize;
use std::fmt::Debug;

use super::error::WorkflowError;
use crate::domain::conversation::ConversationState;

/// Everything stored for one thread
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreadRecord {
    pub state: ConversationState,
    /// Step awaiting the next message, `None` when no traversal is in flight
    pub resume_position: Option<String>,
}

impl ThreadRecord {
    pub fn fresh(thread_id: &str) -> Self {
        Self {
            state: ConversationState::new(thread_id),
            resume_position: None,
        }
    }
}

/// Keyed store for thread records
#[async_trait]
pub trait StateStore: Send + Sync + Debug {
    /// Record for the thread, created empty on first contact
    async fn load(&self, thread_id: &str) -> Result<ThreadRecord, WorkflowError>;

    /// Replace the record of a thread previously returned by `load`
    async fn save(
        &self,
        thread_id: &str,
        state: &ConversationState,
        resume_position: Option<&str>,
    ) -> Result<(), WorkflowError>;

    /// Record for the thread without creating one
    async fn get(&self, thread_id: &str) -> Result<Option<ThreadRecord>, WorkflowError>;

    /// Forget a thread; returns whether it existed
    async fn remove(&self, thread_id: &str) -> Result<bool, WorkflowError>;

    async fn thread_count(&self) -> Result<usize, WorkflowError>;
}
