use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::interaction::{listed_ids, target_provider};
use super::{classified, fail, today_yyyymmdd};
use crate::domain::conversation::ConversationState;
use crate::domain::directory::{render_provider_addresses, ProviderDirectory};
use crate::domain::flow::{names, stages, FlowSettings};
use crate::domain::intent::{heuristics, Classifier, FollowupAction, FollowupKind, YesNo};
use crate::domain::workflow::{Interrupt, Step, StepOutcome};

const ADDRESS_PROMPT: &str =
    "Ask for \"address of <ProviderID>\" to see where a listed provider practices.";

const ANYTHING_ELSE: &str = "Is there anything else I can help you with?";

const CLOSING_MESSAGE: &str = "Thank you for using the provider assistant. Have a great day!";

const ADDRESS_FAILED: &str =
    "We couldn't retrieve the provider's address right now. Please try again later.";

/// Ask the classifier for a conversational phrasing of a fixed prompt.
///
/// The answer is advisory: the template is what the user sees.
async fn phrase_fixed_prompt(
    classifier: &dyn Classifier,
    settings: &FlowSettings,
    state: &mut ConversationState,
    template: &str,
) {
    if !settings.phrase_fixed_prompts {
        return;
    }

    let result = classifier.phrase_prompt(template).await;
    let phrased = classified(state, "phrase_prompt", result, || template.to_string());
    if phrased.trim() != template {
        debug!(
            thread_id = %state.thread_id,
            "Phrased prompt differs from template, showing template"
        );
    }
}

/// Asks which specialty or service the member needs
pub struct SpecialistAskService {
    classifier: Arc<dyn Classifier>,
    settings: Arc<FlowSettings>,
}

impl SpecialistAskService {
    pub fn new(classifier: Arc<dyn Classifier>, settings: Arc<FlowSettings>) -> Self {
        Self {
            classifier,
            settings,
        }
    }
}

#[async_trait]
impl Step for SpecialistAskService {
    fn name(&self) -> &'static str {
        names::SPECIALIST_ASK_SERVICE
    }

    async fn run(&self, state: &mut ConversationState) -> StepOutcome {
        if state.specialist_service.is_some() {
            return StepOutcome::Advance;
        }

        if let Some(service) = state.take_input() {
            state.specialist_service = Some(service);
            return StepOutcome::Advance;
        }

        let template = self.settings.specialist_service_prompt.clone();
        phrase_fixed_prompt(self.classifier.as_ref(), &self.settings, state, &template).await;

        StepOutcome::Suspend(
            Interrupt::new(stages::ASK_SPECIALIST_SERVICE, template).with_code(109),
        )
    }
}

/// Asks for the ZIP and optional filters of the specialist search
pub struct SpecialistAskFilters {
    classifier: Arc<dyn Classifier>,
    settings: Arc<FlowSettings>,
}

impl SpecialistAskFilters {
    pub fn new(classifier: Arc<dyn Classifier>, settings: Arc<FlowSettings>) -> Self {
        Self {
            classifier,
            settings,
        }
    }
}

#[async_trait]
impl Step for SpecialistAskFilters {
    fn name(&self) -> &'static str {
        names::SPECIALIST_ASK_FILTERS
    }

    async fn run(&self, state: &mut ConversationState) -> StepOutcome {
        if state.raw_filter_input.is_some() {
            return StepOutcome::Advance;
        }

        if let Some(filters) = state.take_input() {
            state.raw_filter_input = Some(filters);
            return StepOutcome::Advance;
        }

        let prompt = self.settings.specialist_filters_prompt();
        phrase_fixed_prompt(self.classifier.as_ref(), &self.settings, state, &prompt).await;

        StepOutcome::Suspend(
            Interrupt::new(stages::ASK_SPECIALIST_FILTERS, prompt)
                .with_code(103)
                .dialog(),
        )
    }
}

/// Answers address questions about the specialist results
pub struct SpecialistProviderAddress {
    classifier: Arc<dyn Classifier>,
    providers: Arc<dyn ProviderDirectory>,
}

impl SpecialistProviderAddress {
    pub fn new(classifier: Arc<dyn Classifier>, providers: Arc<dyn ProviderDirectory>) -> Self {
        Self {
            classifier,
            providers,
        }
    }

    fn not_an_address_question(state: &mut ConversationState, notice: impl Into<String>) -> StepOutcome {
        state.last_followup_action = Some(FollowupKind::Question);
        state.pending_notice = Some(notice.into());
        StepOutcome::Advance
    }
}

#[async_trait]
impl Step for SpecialistProviderAddress {
    fn name(&self) -> &'static str {
        names::SPECIALIST_PROVIDER_ADDRESS
    }

    async fn run(&self, state: &mut ConversationState) -> StepOutcome {
        let Some(message) = state.take_input() else {
            let notice = state
                .pending_notice
                .take()
                .unwrap_or_else(|| ADDRESS_PROMPT.to_string());
            return StepOutcome::Suspend(
                Interrupt::new(stages::SPECIALIST_ADDRESS, notice)
                    .with_code(108)
                    .with_title(ADDRESS_PROMPT),
            );
        };

        let ids = listed_ids(state);
        let result = self.classifier.classify_followup(&message, &ids).await;
        let action = classified(state, "classify_followup", result, || {
            heuristics::followup(&message)
        });

        let named = match action {
            FollowupAction::AddressInquiry { provider_id } => provider_id,
            // A bare id in this flow can only mean "where is this provider"
            FollowupAction::ProviderIdOnly { provider_id } => Some(provider_id),
            _ => {
                return Self::not_an_address_question(
                    state,
                    format!("I can look up where a listed specialist practices. {}", ADDRESS_PROMPT),
                );
            }
        };

        let Some(provider_id) = target_provider(state, named.as_deref()) else {
            return Self::not_an_address_question(
                state,
                format!("Which provider's address would you like? {}", ADDRESS_PROMPT),
            );
        };

        if state.find_provider(&provider_id).is_none() {
            return Self::not_an_address_question(
                state,
                format!(
                    "Provider {} is not in the current results. {}",
                    provider_id, ADDRESS_PROMPT
                ),
            );
        }

        state.record_api_call("ProviderAddress");
        match self
            .providers
            .provider_addresses(&provider_id, &today_yyyymmdd())
            .await
        {
            Ok(addresses) => {
                state.last_followup_action = Some(FollowupKind::AddressInquiry);
                state.last_selected_provider_id = Some(provider_id);
                state.provider_addresses = Some(addresses);
                StepOutcome::Advance
            }
            Err(e) => fail(state, self.name(), &e, ADDRESS_FAILED),
        }
    }
}

/// Shows the addresses, then asks whether anything else is needed
pub struct SpecialistPostCompletion {
    classifier: Arc<dyn Classifier>,
}

impl SpecialistPostCompletion {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self { classifier }
    }

    fn completion(state: &ConversationState) -> Interrupt {
        let addresses = state.provider_addresses.as_deref().unwrap_or_default();

        Interrupt::new(
            stages::SPECIALIST_COMPLETED,
            render_provider_addresses(addresses),
        )
        .with_code(110)
        .with_title(ANYTHING_ELSE)
        .with_prompts(["Yes", "No"])
    }
}

#[async_trait]
impl Step for SpecialistPostCompletion {
    fn name(&self) -> &'static str {
        names::SPECIALIST_POST_COMPLETION
    }

    async fn run(&self, state: &mut ConversationState) -> StepOutcome {
        let Some(answer) = state.take_input() else {
            return StepOutcome::Suspend(Self::completion(state));
        };

        let result = self.classifier.classify_yes_no(ANYTHING_ELSE, &answer).await;
        let mut decision = classified(state, "classify_yes_no", result, || {
            heuristics::yes_no(&answer)
        });
        if decision == YesNo::Unclear {
            decision = heuristics::yes_no(&answer);
        }

        match decision {
            YesNo::Yes => {
                state.wants_more_help = Some(true);
                StepOutcome::Advance
            }
            YesNo::No => {
                state.wants_more_help = Some(false);
                Interrupt::new(stages::CLOSED, CLOSING_MESSAGE)
                    .with_code(110)
                    .apply_to(state);
                StepOutcome::Advance
            }
            YesNo::Unclear => StepOutcome::Suspend(
                Interrupt::new(
                    stages::SPECIALIST_COMPLETED,
                    format!("Sorry, I didn't catch that. {} Please answer Yes or No.", ANYTHING_ELSE),
                )
                .with_code(110)
                .with_title(ANYTHING_ELSE)
                .with_prompts(["Yes", "No"]),
            ),
        }
    }
}
