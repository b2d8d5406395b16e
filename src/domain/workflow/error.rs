//! Workflow error types

use thiserror::Error;

/// Errors raised by the graph, the engine or the state store.
///
/// Collaborator failures never show up here; steps turn those into an
/// `ERROR` stage themselves.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum WorkflowError {
    #[error("Step not found: {0}")]
    StepNotFound(String),

    #[error("Graph configuration error: {0}")]
    Configuration(String),

    #[error("Router '{router}' returned unmapped branch '{branch}'")]
    UnmappedBranch { router: String, branch: String },

    #[error("Step limit of {limit} exceeded for thread '{thread_id}'")]
    StepLimitExceeded { thread_id: String, limit: usize },

    #[error("Unknown thread: {0}")]
    UnknownThread(String),

    #[error("State store error: {0}")]
    Store(String),
}

impl WorkflowError {
    pub fn step_not_found(name: impl Into<String>) -> Self {
        Self::StepNotFound(name.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn unmapped_branch(router: impl Into<String>, branch: impl Into<String>) -> Self {
        Self::UnmappedBranch {
            router: router.into(),
            branch: branch.into(),
        }
    }

    pub fn step_limit_exceeded(thread_id: impl Into<String>, limit: usize) -> Self {
        Self::StepLimitExceeded {
            thread_id: thread_id.into(),
            limit,
        }
    }

    pub fn unknown_thread(thread_id: impl Into<String>) -> Self {
        Self::UnknownThread(thread_id.into())
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }
}
