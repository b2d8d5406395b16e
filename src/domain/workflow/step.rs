//! Step trait and suspension payload

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::conversation::{ConversationState, ResponseType};

/// Output shown to the user when a step pauses or ends the conversation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interrupt {
    pub stage: String,
    pub message: String,
    pub code: u16,
    pub response_type: ResponseType,
    pub prompt_title: Option<String>,
    pub prompts: Vec<String>,
}

impl Interrupt {
    pub fn new(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            message: message.into(),
            code: 200,
            response_type: ResponseType::Aura,
            prompt_title: None,
            prompts: Vec::new(),
        }
    }

    pub fn with_code(mut self, code: u16) -> Self {
        self.code = code;
        self
    }

    pub fn dialog(mut self) -> Self {
        self.response_type = ResponseType::Dialog;
        self
    }

    pub fn aura(mut self) -> Self {
        self.response_type = ResponseType::Aura;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.prompt_title = Some(title.into());
        self
    }

    pub fn with_prompts<I, S>(mut self, prompts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prompts = prompts.into_iter().map(Into::into).collect();
        self
    }

    /// Copy the payload into the state's turn output fields
    pub fn apply_to(&self, state: &mut ConversationState) {
        state.stage = Some(self.stage.clone());
        state.ai_response = Some(self.message.clone());
        state.ai_response_code = Some(self.code);
        state.ai_response_type = Some(self.response_type);
        state.prompt_title = self.prompt_title.clone();
        state.prompts = self.prompts.clone();
    }
}

/// What the engine should do after a step ran
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Follow the outgoing transition
    Advance,
    /// Pause until the next user message, then re-run this same step
    Suspend(Interrupt),
    /// End the traversal regardless of the outgoing transition
    Finish,
}

/// A named unit of work in a flow graph.
///
/// Steps never fail: collaborator errors are converted into user-facing
/// output inside the step. A step that owns an input field takes
/// `last_user_input` into it when resumed.
#[async_trait]
pub trait Step: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, state: &mut ConversationState) -> StepOutcome;
}

#[cfg(test)]
pub mod mock {
    use super::*;

    type Field = fn(&mut ConversationState) -> &mut Option<String>;

    /// Step that suspends until it has filled its field, then advances
    pub struct AskOnceStep {
        name: &'static str,
        field: Field,
    }

    impl AskOnceStep {
        pub fn new(name: &'static str, field: Field) -> Self {
            Self { name, field }
        }
    }

    #[async_trait]
    impl Step for AskOnceStep {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn run(&self, state: &mut ConversationState) -> StepOutcome {
            if (self.field)(state).is_some() {
                return StepOutcome::Advance;
            }

            match state.take_input() {
                Some(input) => {
                    *(self.field)(state) = Some(input);
                    StepOutcome::Advance
                }
                None => StepOutcome::Suspend(Interrupt::new(self.name.to_uppercase(), "?")),
            }
        }
    }

    /// Step that always advances
    #[derive(Debug)]
    pub struct PassStep {
        name: &'static str,
    }

    impl PassStep {
        pub fn new(name: &'static str) -> Self {
            Self { name }
        }
    }

    #[async_trait]
    impl Step for PassStep {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn run(&self, _state: &mut ConversationState) -> StepOutcome {
            StepOutcome::Advance
        }
    }
}
