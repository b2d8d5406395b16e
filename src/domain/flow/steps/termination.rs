use std::sync::Arc;

use async_trait::async_trait;

use super::{classified, fail};
use crate::domain::conversation::ConversationState;
use crate::domain::flow::{names, stages};
use crate::domain::intent::Classifier;
use crate::domain::workflow::{Interrupt, Step, StepOutcome};
use crate::domain::DomainError;

pub const TERMINATION_PROMPT: &str =
    "Please share the reason for changing the member's current PCP.";

/// Asks why the current PCP is being replaced
pub struct AssignPcpAskTermination;

#[async_trait]
impl Step for AssignPcpAskTermination {
    fn name(&self) -> &'static str {
        names::ASSIGN_PCP_ASK_TERMINATION
    }

    async fn run(&self, state: &mut ConversationState) -> StepOutcome {
        if state.raw_termination_input.is_some() {
            return StepOutcome::Advance;
        }

        match state.take_input() {
            Some(answer) => {
                state.raw_termination_input = Some(answer);
                StepOutcome::Advance
            }
            None => StepOutcome::Suspend(
                Interrupt::new(stages::WAIT_TERMINATION_REASON, TERMINATION_PROMPT).with_code(112),
            ),
        }
    }
}

/// Normalizes the raw termination answer; the raw text is kept when the
/// classifier is unavailable or answers with nothing.
pub struct CollectTerminationReason {
    classifier: Arc<dyn Classifier>,
}

impl CollectTerminationReason {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self { classifier }
    }
}

#[async_trait]
impl Step for CollectTerminationReason {
    fn name(&self) -> &'static str {
        names::COLLECT_TERMINATION_REASON
    }

    async fn run(&self, state: &mut ConversationState) -> StepOutcome {
        if state.termination_reason.is_some() {
            return StepOutcome::Advance;
        }

        let Some(raw) = state.raw_termination_input.clone() else {
            let error = DomainError::missing_precondition(
                "The reason for changing the PCP was not captured. Please start again.",
            );
            return fail(state, self.name(), &error, "");
        };

        let result = self
            .classifier
            .normalize_termination_reason(&raw)
            .await
            .and_then(|reason| {
                let reason = reason.trim().to_string();
                if reason.is_empty() {
                    Err(DomainError::unparseable("classifier", "empty termination reason"))
                } else {
                    Ok(reason)
                }
            });

        let reason = classified(state, "normalize_termination_reason", result, || raw.clone());
        state.termination_reason = Some(reason);

        StepOutcome::Advance
    }
}
