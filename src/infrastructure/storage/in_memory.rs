//! In-memory thread state store

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::conversation::ConversationState;
use crate::domain::workflow::{StateStore, ThreadRecord, WorkflowError};

/// Thread-safe in-memory state store.
///
/// Parked threads live until removed or the process exits.
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    threads: RwLock<HashMap<String, ThreadRecord>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn load(&self, thread_id: &str) -> Result<ThreadRecord, WorkflowError> {
        let mut threads = self.threads.write().map_err(|e| {
            WorkflowError::store(format!("Failed to acquire write lock: {}", e))
        })?;

        Ok(threads
            .entry(thread_id.to_string())
            .or_insert_with(|| ThreadRecord::fresh(thread_id))
            .clone())
    }

    async fn save(
        &self,
        thread_id: &str,
        state: &ConversationState,
        resume_position: Option<&str>,
    ) -> Result<(), WorkflowError> {
        let mut threads = self.threads.write().map_err(|e| {
            WorkflowError::store(format!("Failed to acquire write lock: {}", e))
        })?;

        let record = threads
            .get_mut(thread_id)
            .ok_or_else(|| WorkflowError::unknown_thread(thread_id))?;

        record.state = state.clone();
        record.resume_position = resume_position.map(str::to_string);
        Ok(())
    }

    async fn get(&self, thread_id: &str) -> Result<Option<ThreadRecord>, WorkflowError> {
        let threads = self.threads.read().map_err(|e| {
            WorkflowError::store(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(threads.get(thread_id).cloned())
    }

    async fn remove(&self, thread_id: &str) -> Result<bool, WorkflowError> {
        let mut threads = self.threads.write().map_err(|e| {
            WorkflowError::store(format!("Failed to acquire write lock: {}", e))
        })?;

        Ok(threads.remove(thread_id).is_some())
    }

    async fn thread_count(&self) -> Result<usize, WorkflowError> {
        let threads = self.threads.read().map_err(|e| {
            WorkflowError::store(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(threads.len())
    }
}
