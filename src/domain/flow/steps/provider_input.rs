use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::classified;
use crate::domain::conversation::{ConversationState, KnowsProvider};
use crate::domain::flow::{names, stages, FlowSettings};
use crate::domain::intent::{heuristics, Classifier, YesNo};
use crate::domain::workflow::{Interrupt, Step, StepOutcome};

pub const KNOWS_PROVIDER_QUESTION: &str =
    "Does the member already know which provider they would like as their PCP?";

pub const PROVIDER_INPUT_PROMPT: &str =
    "Please enter the provider ID, or the provider's name with city and state.";

fn knows_provider_prompt(message: &str) -> Interrupt {
    Interrupt::new(stages::ASK_KNOWS_PROVIDER, message)
        .with_code(101)
        .with_prompts(["Yes", "No"])
}

/// Yes/no on whether the provider is known.
///
/// An answer that already carries a provider id or a name search counts as
/// "yes" and is kept as the provider input. An unclear answer is asked again
/// and leaves the flag unknown.
pub struct CollectKnowsProvider {
    classifier: Arc<dyn Classifier>,
}

impl CollectKnowsProvider {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self { classifier }
    }
}

#[async_trait]
impl Step for CollectKnowsProvider {
    fn name(&self) -> &'static str {
        names::COLLECT_KNOWS_PROVIDER
    }

    async fn run(&self, state: &mut ConversationState) -> StepOutcome {
        if state.knows_provider != KnowsProvider::Unknown {
            return StepOutcome::Advance;
        }

        let Some(answer) = state.take_input() else {
            return StepOutcome::Suspend(knows_provider_prompt(KNOWS_PROVIDER_QUESTION));
        };

        if heuristics::looks_like_provider_query(&answer) {
            debug!(thread_id = %state.thread_id, "Answer already names a provider");
            state.knows_provider = KnowsProvider::Yes;
            state.raw_provider_input = Some(answer);
            return StepOutcome::Advance;
        }

        let result = self
            .classifier
            .classify_yes_no(KNOWS_PROVIDER_QUESTION, &answer)
            .await;
        let mut decision = classified(state, "classify_yes_no", result, || {
            heuristics::yes_no(&answer)
        });
        if decision == YesNo::Unclear {
            decision = heuristics::yes_no(&answer);
        }

        match decision {
            YesNo::Yes => {
                state.knows_provider = KnowsProvider::Yes;
                StepOutcome::Advance
            }
            YesNo::No => {
                state.knows_provider = KnowsProvider::No;
                StepOutcome::Advance
            }
            YesNo::Unclear => StepOutcome::Suspend(knows_provider_prompt(&format!(
                "Sorry, I didn't catch that. {} Please answer Yes or No.",
                KNOWS_PROVIDER_QUESTION
            ))),
        }
    }
}

/// Collects the provider id or name search
pub struct CollectProviderInput;

#[async_trait]
impl Step for CollectProviderInput {
    fn name(&self) -> &'static str {
        names::COLLECT_PROVIDER_INPUT
    }

    async fn run(&self, state: &mut ConversationState) -> StepOutcome {
        if state.raw_provider_input.is_some() {
            return StepOutcome::Advance;
        }

        match state.take_input() {
            Some(input) => {
                state.raw_provider_input = Some(input);
                StepOutcome::Advance
            }
            None => StepOutcome::Suspend(
                Interrupt::new(stages::ASK_PROVIDER_INPUT, PROVIDER_INPUT_PROMPT)
                    .with_code(103)
                    .dialog(),
            ),
        }
    }
}

/// Collects ZIP and optional filters when no provider is known
pub struct CollectNoFlowFilters {
    settings: Arc<FlowSettings>,
}

impl CollectNoFlowFilters {
    pub fn new(settings: Arc<FlowSettings>) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Step for CollectNoFlowFilters {
    fn name(&self) -> &'static str {
        names::COLLECT_NO_FLOW_FILTERS
    }

    async fn run(&self, state: &mut ConversationState) -> StepOutcome {
        if state.raw_filter_input.is_some() {
            return StepOutcome::Advance;
        }

        match state.take_input() {
            Some(input) => {
                state.raw_filter_input = Some(input);
                StepOutcome::Advance
            }
            None => StepOutcome::Suspend(
                Interrupt::new(
                    stages::ASK_NO_FLOW_FILTERS,
                    self.settings.no_flow_filters_prompt(),
                )
                .with_code(103)
                .dialog(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::ResponseType;
    use crate::domain::intent::mock::MockClassifier;

    #[tokio::test]
    async fn test_knows_provider_asks_with_yes_no_prompts() {
        let step = CollectKnowsProvider::new(Arc::new(MockClassifier::new()));
        let mut state = ConversationState::new("t1");

        match step.run(&mut state).await {
            StepOutcome::Suspend(interrupt) => {
                assert_eq!(interrupt.stage, stages::ASK_KNOWS_PROVIDER);
                assert_eq!(interrupt.code, 101);
                assert_eq!(interrupt.response_type, ResponseType::Aura);
                assert_eq!(interrupt.prompts, vec!["Yes", "No"]);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(state.knows_provider, KnowsProvider::Unknown);
    }

    #[tokio::test]
    async fn test_provider_id_answer_counts_as_yes() {
        let step = CollectKnowsProvider::new(Arc::new(MockClassifier::new()));
        let mut state = ConversationState::new("t1");
        state.last_user_input = Some("12345678".to_string());

        assert_eq!(step.run(&mut state).await, StepOutcome::Advance);
        assert_eq!(state.knows_provider, KnowsProvider::Yes);
        assert_eq!(state.raw_provider_input.as_deref(), Some("12345678"));
    }

    #[tokio::test]
    async fn test_no_answer() {
        let step = CollectKnowsProvider::new(Arc::new(MockClassifier::new().with_yes_no(YesNo::No)));
        let mut state = ConversationState::new("t1");
        state.last_user_input = Some("nope".to_string());

        step.run(&mut state).await;

        assert_eq!(state.knows_provider, KnowsProvider::No);
        assert!(state.raw_provider_input.is_none());
    }

    #[tokio::test]
    async fn test_unclear_answer_stays_unknown() {
        let step = CollectKnowsProvider::new(Arc::new(
            MockClassifier::new().with_yes_no(YesNo::Unclear),
        ));
        let mut state = ConversationState::new("t1");
        state.last_user_input = Some("hmm, not sure".to_string());

        let outcome = step.run(&mut state).await;

        assert!(matches!(outcome, StepOutcome::Suspend(_)));
        assert_eq!(state.knows_provider, KnowsProvider::Unknown);
    }

    #[tokio::test]
    async fn test_no_flow_filters_prompt_uses_template() {
        let settings = FlowSettings {
            default_radius_miles: 30,
            ..Default::default()
        };
        let step = CollectNoFlowFilters::new(Arc::new(settings.clone()));
        let mut state = ConversationState::new("t1");

        match step.run(&mut state).await {
            StepOutcome::Suspend(interrupt) => {
                assert_eq!(interrupt.stage, stages::ASK_NO_FLOW_FILTERS);
                assert_eq!(interrupt.code, 103);
                assert_eq!(interrupt.response_type, ResponseType::Dialog);
                assert_eq!(interrupt.message, settings.no_flow_filters_prompt());
                assert!(interrupt.message.contains("default 30 miles"));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_provider_input_consumed_on_resume() {
        let step = CollectProviderInput;
        let mut state = ConversationState::new("t1");

        assert!(matches!(step.run(&mut state).await, StepOutcome::Suspend(_)));

        state.last_user_input = Some("Jane Smith, Austin, TX".to_string());
        assert_eq!(step.run(&mut state).await, StepOutcome::Advance);
        assert_eq!(
            state.raw_provider_input.as_deref(),
            Some("Jane Smith, Austin, TX")
        );
    }
}
