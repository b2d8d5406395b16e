//! Conversation service - runs turns and keeps per-thread totals

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{error, info};

use crate::domain::conversation::ConversationState;
use crate::domain::workflow::{Engine, TurnInput, WorkflowError};
use crate::domain::{DomainError, ResponseMapper, TurnReply};
use crate::infrastructure::observability::{record_turn, record_workflow_steps};

const TURN_FAILED: &str = "Sorry, something went wrong while processing your request.";

/// One inbound turn
#[derive(Debug, Clone, Default)]
pub struct TurnRequest {
    pub thread_id: String,
    pub message: String,
    pub member_id: Option<String>,
    pub interaction_id: Option<String>,
}

/// Running totals for one thread
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ThreadStats {
    pub turns: u64,
    pub errors: u64,
    pub total_latency_ms: u64,
    pub last_stage: Option<String>,
}

/// Saved state of a thread with its resume position
#[derive(Debug, Clone, Serialize)]
pub struct ThreadView {
    pub thread_id: String,
    pub resume_position: Option<String>,
    pub state: ConversationState,
    pub stats: ThreadStats,
}

/// Runs engine turns one at a time per thread
#[derive(Debug)]
pub struct ConversationService {
    engine: Engine,
    thread_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    stats: Mutex<HashMap<String, ThreadStats>>,
}

impl ConversationService {
    pub fn new(engine: Engine) -> Self {
        Self {
            engine,
            thread_locks: Mutex::new(HashMap::new()),
            stats: Mutex::new(HashMap::new()),
        }
    }

    fn thread_lock(&self, thread_id: &str) -> Result<Arc<tokio::sync::Mutex<()>>, DomainError> {
        let mut locks = self
            .thread_locks
            .lock()
            .map_err(|e| DomainError::internal(format!("Failed to acquire lock: {}", e)))?;

        Ok(locks
            .entry(thread_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone())
    }

    /// Drop the thread's lock entry once nobody else holds or waits on it.
    ///
    /// Clones are only handed out under the map lock, so a count of one seen
    /// under that lock means the map owns the last reference.
    fn release_thread_lock(&self, thread_id: &str, lock: Arc<tokio::sync::Mutex<()>>) {
        drop(lock);

        match self.thread_locks.lock() {
            Ok(mut locks) => {
                if locks
                    .get(thread_id)
                    .is_some_and(|entry| Arc::strong_count(entry) == 1)
                {
                    locks.remove(thread_id);
                }
            }
            Err(e) => error!(error = %e, "Failed to prune thread lock"),
        }
    }

    fn record_stats(&self, thread_id: &str, stage: &str, is_error: bool, latency: Duration) {
        match self.stats.lock() {
            Ok(mut stats) => {
                let entry = stats.entry(thread_id.to_string()).or_default();
                entry.turns += 1;
                entry.total_latency_ms += latency.as_millis() as u64;
                entry.last_stage = Some(stage.to_string());
                if is_error {
                    entry.errors += 1;
                }
            }
            Err(e) => error!(error = %e, "Failed to record thread stats"),
        }
    }

    fn stats_for(&self, thread_id: &str) -> ThreadStats {
        self.stats
            .lock()
            .ok()
            .and_then(|stats| stats.get(thread_id).cloned())
            .unwrap_or_default()
    }

    /// Deliver one message and map the outcome to a reply.
    ///
    /// Calls for the same thread are serialized; an engine failure is
    /// reported as an error reply and leaves the saved position untouched.
    pub async fn handle_turn(&self, request: TurnRequest) -> Result<TurnReply, DomainError> {
        let thread_id = normalize_thread_id(&request.thread_id)?;

        let lock = self.thread_lock(&thread_id)?;
        let reply = {
            let _guard = lock.lock().await;
            self.run_turn(&thread_id, request).await
        };
        self.release_thread_lock(&thread_id, lock);

        Ok(reply)
    }

    async fn run_turn(&self, thread_id: &str, request: TurnRequest) -> TurnReply {
        let start = Instant::now();
        let mut input = TurnInput::new(request.message.clone());
        input.member_id = request.member_id;
        input.interaction_id = request.interaction_id;

        let reply = match self.engine.run_turn(thread_id, input).await {
            Ok(result) => {
                record_workflow_steps(&result.steps);
                ResponseMapper::map(
                    &result.outcome,
                    &result.state,
                    &request.message,
                    chrono::Local::now(),
                )
            }
            Err(e) => {
                error!(thread_id = %thread_id, error = %e, "Turn failed");
                ResponseMapper::error(thread_id, &request.message, TURN_FAILED, chrono::Local::now())
            }
        };

        let latency = start.elapsed();
        self.record_stats(thread_id, &reply.current_stage, reply.is_error(), latency);
        record_turn(&reply.current_stage, !reply.is_error(), latency);

        info!(
            thread_id = %thread_id,
            stage = %reply.current_stage,
            code = reply.ai_response_code,
            latency_ms = latency.as_millis() as u64,
            "Turn handled"
        );

        reply
    }

    pub async fn get_thread(&self, thread_id: &str) -> Result<Option<ThreadView>, DomainError> {
        let thread_id = normalize_thread_id(thread_id)?;
        let record = self
            .engine
            .store()
            .get(&thread_id)
            .await
            .map_err(store_error)?;

        Ok(record.map(|record| ThreadView {
            stats: self.stats_for(&thread_id),
            thread_id,
            resume_position: record.resume_position,
            state: record.state,
        }))
    }

    /// Evict a thread; returns whether it existed.
    ///
    /// Waits for a running turn on the thread to finish first.
    pub async fn remove_thread(&self, thread_id: &str) -> Result<bool, DomainError> {
        let thread_id = normalize_thread_id(thread_id)?;

        let lock = self.thread_lock(&thread_id)?;
        let removed = {
            let _guard = lock.lock().await;
            let removed = self.engine.store().remove(&thread_id).await;
            if let Ok(mut stats) = self.stats.lock() {
                stats.remove(&thread_id);
            }
            removed
        };
        self.release_thread_lock(&thread_id, lock);

        let removed = removed.map_err(store_error)?;
        info!(thread_id = %thread_id, removed, "Thread evicted");
        Ok(removed)
    }

    pub async fn thread_count(&self) -> Result<usize, DomainError> {
        self.engine.store().thread_count().await.map_err(store_error)
    }
}

fn normalize_thread_id(thread_id: &str) -> Result<String, DomainError> {
    let thread_id = thread_id.trim();
    if thread_id.is_empty() {
        return Err(DomainError::validation("thread_id is required"));
    }

    Ok(thread_id.to_string())
}

fn store_error(e: WorkflowError) -> DomainError {
    DomainError::internal(e.to_string())
}
