//! Resumable graph execution

use std::sync::Arc;

use tracing::{debug, info};

use super::error::WorkflowError;
use super::graph::{FlowGraph, END};
use super::step::{Interrupt, StepOutcome};
use super::store::StateStore;
use crate::domain::conversation::ConversationState;

/// Configuration for the engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum number of steps run for a single message (guards router loops)
    pub max_steps_per_turn: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_steps_per_turn: 50,
        }
    }
}

/// One inbound user message
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnInput {
    pub message: String,
    pub member_id: Option<String>,
    pub interaction_id: Option<String>,
}

impl TurnInput {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_member_id(mut self, member_id: impl Into<String>) -> Self {
        self.member_id = Some(member_id.into());
        self
    }

    pub fn with_interaction_id(mut self, interaction_id: impl Into<String>) -> Self {
        self.interaction_id = Some(interaction_id.into());
        self
    }
}

/// How a turn ended
#[derive(Debug, Clone, PartialEq)]
pub enum EngineOutcome {
    /// A step is waiting for the next message
    Suspended {
        step: &'static str,
        interrupt: Interrupt,
    },
    /// The traversal reached the end of the graph
    Completed { last_step: &'static str },
}

impl EngineOutcome {
    pub fn is_suspended(&self) -> bool {
        matches!(self, Self::Suspended { .. })
    }
}

/// Result of running one turn
#[derive(Debug, Clone)]
pub struct TurnResult {
    pub outcome: EngineOutcome,
    /// State as persisted at the end of the turn
    pub state: ConversationState,
    /// Steps run during this turn, in order
    pub steps: Vec<&'static str>,
}

/// Runs a flow graph for one thread at a time
#[derive(Debug)]
pub struct Engine {
    graph: Arc<FlowGraph>,
    store: Arc<dyn StateStore>,
    config: EngineConfig,
}

impl Engine {
    pub fn new(graph: Arc<FlowGraph>, store: Arc<dyn StateStore>) -> Self {
        Self {
            graph,
            store,
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(
        graph: Arc<FlowGraph>,
        store: Arc<dyn StateStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            graph,
            store,
            config,
        }
    }

    pub fn graph(&self) -> &FlowGraph {
        &self.graph
    }

    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }

    /// Deliver one message to a thread.
    ///
    /// Execution starts at the thread's resume position (or the graph entry)
    /// and stops at the first suspension or at `END`. State is saved only
    /// when the turn finishes cleanly, so a failed turn leaves the previous
    /// position in place.
    pub async fn run_turn(
        &self,
        thread_id: &str,
        input: TurnInput,
    ) -> Result<TurnResult, WorkflowError> {
        let record = self.store.load(thread_id).await?;
        let mut state = record.state;

        state.thread_id = thread_id.to_string();
        apply_identity(&mut state, &input);
        state.last_user_input = Some(input.message);

        let mut current = match record.resume_position.as_deref() {
            Some(name) => self
                .graph
                .step(name)
                .map(|step| step.name())
                .ok_or_else(|| WorkflowError::step_not_found(name))?,
            None => self.graph.entry(),
        };

        debug!(
            thread_id = %thread_id,
            step = current,
            resumed = record.resume_position.is_some(),
            "Starting turn"
        );

        let mut steps = Vec::new();

        loop {
            if steps.len() >= self.config.max_steps_per_turn {
                return Err(WorkflowError::step_limit_exceeded(
                    thread_id,
                    self.config.max_steps_per_turn,
                ));
            }

            let step = self
                .graph
                .step(current)
                .ok_or_else(|| WorkflowError::step_not_found(current))?;

            steps.push(current);
            debug!(thread_id = %thread_id, step = current, "Running step");

            match step.run(&mut state).await {
                StepOutcome::Suspend(interrupt) => {
                    interrupt.apply_to(&mut state);
                    state.resume_position = Some(current.to_string());

                    self.store.save(thread_id, &state, Some(current)).await?;

                    info!(
                        thread_id = %thread_id,
                        step = current,
                        stage = %interrupt.stage,
                        steps = steps.len(),
                        "Turn suspended"
                    );

                    return Ok(TurnResult {
                        outcome: EngineOutcome::Suspended {
                            step: current,
                            interrupt,
                        },
                        state,
                        steps,
                    });
                }
                StepOutcome::Finish => break,
                StepOutcome::Advance => {
                    let next = self.graph.next(current, &state)?;
                    if next == END {
                        break;
                    }
                    current = next;
                }
            }
        }

        state.resume_position = None;
        state.last_user_input = None;
        self.store.save(thread_id, &state, None).await?;

        info!(
            thread_id = %thread_id,
            last_step = current,
            stage = state.stage.as_deref().unwrap_or(END),
            steps = steps.len(),
            "Traversal completed"
        );

        Ok(TurnResult {
            outcome: EngineOutcome::Completed { last_step: current },
            state,
            steps,
        })
    }
}

fn apply_identity(state: &mut ConversationState, input: &TurnInput) {
    if let Some(member_id) = input.member_id.as_deref().map(str::trim) {
        if !member_id.is_empty() && state.member_id.as_deref() != Some(member_id) {
            state.member_id = Some(member_id.to_string());
            state.clear_member();
        }
    }

    if let Some(interaction_id) = &input.interaction_id {
        state.interaction_id = Some(interaction_id.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::workflow::router::Router;
    use crate::domain::workflow::step::mock::{AskOnceStep, PassStep};
    use crate::domain::workflow::step::Step;
    use crate::infrastructure::storage::InMemoryStateStore;
    use async_trait::async_trait;

    #[derive(Debug)]
    struct LoopRouter;

    impl Router for LoopRouter {
        fn name(&self) -> &'static str {
            "loop"
        }

        fn branches(&self) -> &'static [&'static str] {
            &["again"]
        }

        fn decide(&self, _state: &ConversationState) -> &'static str {
            "again"
        }
    }

    struct FinishStep;

    #[async_trait]
    impl Step for FinishStep {
        fn name(&self) -> &'static str {
            "finish"
        }

        async fn run(&self, state: &mut ConversationState) -> StepOutcome {
            Interrupt::new("COMPLETED", "done")
                .with_code(110)
                .apply_to(state);
            StepOutcome::Finish
        }
    }

    fn two_question_graph() -> Arc<FlowGraph> {
        Arc::new(
            FlowGraph::builder("load")
                .step(PassStep::new("load"))
                .step(AskOnceStep::new("ask_reason", |s| &mut s.raw_termination_input))
                .step(AskOnceStep::new("ask_provider", |s| &mut s.raw_provider_input))
                .step(FinishStep)
                .edge("load", "ask_reason")
                .edge("ask_reason", "ask_provider")
                .edge("ask_provider", "finish")
                .edge("finish", END)
                .build()
                .unwrap(),
        )
    }

    fn engine(graph: Arc<FlowGraph>) -> (Engine, Arc<InMemoryStateStore>) {
        let store = Arc::new(InMemoryStateStore::new());
        (Engine::new(graph, store.clone()), store)
    }

    #[tokio::test]
    async fn test_first_message_consumed_then_suspends() {
        let (engine, store) = engine(two_question_graph());

        let result = engine.run_turn("t1", TurnInput::new("new PCP")).await.unwrap();

        match &result.outcome {
            EngineOutcome::Suspended { step, interrupt } => {
                assert_eq!(*step, "ask_provider");
                assert_eq!(interrupt.stage, "ASK_PROVIDER");
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(result.steps, vec!["load", "ask_reason", "ask_provider"]);
        assert_eq!(result.state.raw_termination_input.as_deref(), Some("new PCP"));

        let record = store.get("t1").await.unwrap().unwrap();
        assert_eq!(record.resume_position.as_deref(), Some("ask_provider"));
        assert_eq!(record.state.stage.as_deref(), Some("ASK_PROVIDER"));
    }

    #[tokio::test]
    async fn test_resume_reenters_suspended_step() {
        let (engine, store) = engine(two_question_graph());

        engine.run_turn("t1", TurnInput::new("new PCP")).await.unwrap();
        let result = engine.run_turn("t1", TurnInput::new("12345678")).await.unwrap();

        assert_eq!(result.steps, vec!["ask_provider", "finish"]);
        assert_eq!(
            result.outcome,
            EngineOutcome::Completed {
                last_step: "finish"
            }
        );
        assert_eq!(result.state.raw_provider_input.as_deref(), Some("12345678"));
        assert_eq!(result.state.stage.as_deref(), Some("COMPLETED"));

        let record = store.get("t1").await.unwrap().unwrap();
        assert!(record.resume_position.is_none());
        assert!(record.state.last_user_input.is_none());
    }

    #[tokio::test]
    async fn test_threads_are_independent() {
        let (engine, _store) = engine(two_question_graph());

        engine.run_turn("t1", TurnInput::new("reason one")).await.unwrap();
        let other = engine.run_turn("t2", TurnInput::new("reason two")).await.unwrap();

        assert_eq!(other.steps, vec!["load", "ask_reason", "ask_provider"]);
        assert_eq!(other.state.raw_termination_input.as_deref(), Some("reason two"));
    }

    #[tokio::test]
    async fn test_step_limit_leaves_previous_position() {
        let graph = Arc::new(
            FlowGraph::builder("spin")
                .step(PassStep::new("spin"))
                .routed("spin", LoopRouter, &[("again", "spin")])
                .build()
                .unwrap(),
        );
        let store = Arc::new(InMemoryStateStore::new());
        let engine = Engine::with_config(
            graph,
            store.clone(),
            EngineConfig {
                max_steps_per_turn: 5,
            },
        );

        let err = engine.run_turn("t1", TurnInput::new("hi")).await.unwrap_err();

        assert_eq!(err, WorkflowError::step_limit_exceeded("t1", 5));
        let record = store.get("t1").await.unwrap().unwrap();
        assert!(record.resume_position.is_none());
        assert!(record.state.stage.is_none());
    }

    #[tokio::test]
    async fn test_unknown_resume_position_is_rejected() {
        let (engine, store) = engine(two_question_graph());
        let record = store.load("t1").await.unwrap();
        store
            .save("t1", &record.state, Some("removed_step"))
            .await
            .unwrap();

        let err = engine.run_turn("t1", TurnInput::new("hi")).await.unwrap_err();

        assert_eq!(err, WorkflowError::step_not_found("removed_step"));
    }

    #[tokio::test]
    async fn test_member_change_clears_member_fields() {
        let (engine, store) = engine(two_question_graph());
        let mut record = store.load("t1").await.unwrap();
        record.state.member_id = Some("M1".to_string());
        record.state.group_id = Some("G1".to_string());
        store.save("t1", &record.state, None).await.unwrap();

        let result = engine
            .run_turn("t1", TurnInput::new("reason").with_member_id("M2"))
            .await
            .unwrap();

        assert_eq!(result.state.member_id.as_deref(), Some("M2"));
        assert!(result.state.group_id.is_none());
    }
}
