use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::{classified, fail, today_yyyymmdd};
use crate::domain::conversation::ConversationState;
use crate::domain::directory::{render_provider_addresses, ProviderDirectory};
use crate::domain::flow::{names, stages};
use crate::domain::intent::{heuristics, Classifier, FollowupAction, FollowupKind};
use crate::domain::workflow::{Interrupt, Step, StepOutcome};

const FOLLOWUP_PROMPT: &str =
    "Reply with \"Assign <ProviderID>\" to select a provider, or ask for a provider's address.";

const QUESTION_HELP: &str = "I can assign one of the listed providers as the member's PCP or look up a provider's address. Reply with \"Assign <ProviderID>\" or \"Address of <ProviderID>\".";

const ADDRESS_FAILED: &str =
    "We couldn't retrieve the provider's address right now. Please try again later.";

/// Resolve the provider a follow-up refers to: the one named, else the last
/// one selected, else the only one listed.
pub(crate) fn target_provider(state: &ConversationState, named: Option<&str>) -> Option<String> {
    named
        .map(str::to_string)
        .or_else(|| state.last_selected_provider_id.clone())
        .or_else(|| match state.providers_result.as_deref() {
            Some([only]) => Some(only.provider_id.clone()),
            _ => None,
        })
}

pub(crate) fn listed_ids(state: &ConversationState) -> Vec<String> {
    state
        .providers_result
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|p| p.provider_id.clone())
        .collect()
}

/// Interprets a reply to the provider list
pub struct ProviderInteraction {
    classifier: Arc<dyn Classifier>,
    providers: Arc<dyn ProviderDirectory>,
}

impl ProviderInteraction {
    pub fn new(classifier: Arc<dyn Classifier>, providers: Arc<dyn ProviderDirectory>) -> Self {
        Self {
            classifier,
            providers,
        }
    }

    fn ask_again(state: &mut ConversationState, notice: impl Into<String>) -> StepOutcome {
        state.last_followup_action = Some(FollowupKind::Question);
        state.pending_notice = Some(notice.into());
        StepOutcome::Advance
    }
}

#[async_trait]
impl Step for ProviderInteraction {
    fn name(&self) -> &'static str {
        names::PROVIDER_INTERACTION
    }

    async fn run(&self, state: &mut ConversationState) -> StepOutcome {
        let Some(message) = state.take_input() else {
            return StepOutcome::Suspend(
                Interrupt::new(stages::WAIT_FOLLOWUP, FOLLOWUP_PROMPT).with_code(107),
            );
        };

        let ids = listed_ids(state);
        let result = self.classifier.classify_followup(&message, &ids).await;
        let action = classified(state, "classify_followup", result, || {
            heuristics::followup(&message)
        });

        debug!(
            thread_id = %state.thread_id,
            action = action.kind().as_str(),
            "Follow-up classified"
        );

        match action {
            FollowupAction::AssignPcp { provider_id } => {
                let Some(provider_id) = target_provider(state, provider_id.as_deref()) else {
                    return Self::ask_again(
                        state,
                        "Which provider should be assigned? Reply with \"Assign <ProviderID>\".",
                    );
                };

                let Some(snapshot) = state.find_provider(&provider_id).cloned() else {
                    return Self::ask_again(
                        state,
                        format!(
                            "Provider {} is not in the current results. Please choose a provider from the list.",
                            provider_id
                        ),
                    );
                };

                info!(thread_id = %state.thread_id, provider_id = %provider_id, "Provider selected for assignment");
                state.last_followup_action = Some(FollowupKind::AssignPcp);
                state.last_selected_provider_id = Some(provider_id);
                state.selected_provider_snapshot = Some(snapshot);
                StepOutcome::Advance
            }
            FollowupAction::ProviderIdOnly { provider_id } => {
                state.last_followup_action = Some(FollowupKind::ProviderIdOnly);
                state.last_selected_provider_id = Some(provider_id);
                StepOutcome::Advance
            }
            FollowupAction::AddressInquiry { provider_id } => {
                let Some(provider_id) = target_provider(state, provider_id.as_deref()) else {
                    return Self::ask_again(
                        state,
                        "Which provider's address would you like? Reply with \"Address of <ProviderID>\".",
                    );
                };

                state.record_api_call("ProviderAddress");
                match self
                    .providers
                    .provider_addresses(&provider_id, &today_yyyymmdd())
                    .await
                {
                    Ok(addresses) => {
                        state.last_followup_action = Some(FollowupKind::AddressInquiry);
                        state.pending_notice = Some(render_provider_addresses(&addresses));
                        state.provider_addresses = Some(addresses);
                        state.last_selected_provider_id = Some(provider_id);
                        StepOutcome::Advance
                    }
                    Err(e) => fail(state, self.name(), &e, ADDRESS_FAILED),
                }
            }
            FollowupAction::Question => Self::ask_again(state, QUESTION_HELP),
        }
    }
}

/// Waits for the next reply to the provider list
pub struct WaitNextFollowup;

#[async_trait]
impl Step for WaitNextFollowup {
    fn name(&self) -> &'static str {
        names::WAIT_NEXT_FOLLOWUP
    }

    async fn run(&self, state: &mut ConversationState) -> StepOutcome {
        if state.has_input() {
            return StepOutcome::Advance;
        }

        let notice = state.pending_notice.take();
        let interrupt = if state.last_followup_action == Some(FollowupKind::AddressInquiry) {
            Interrupt::new(
                stages::SHOW_PROVIDER_ADDRESS,
                notice.unwrap_or_else(|| FOLLOWUP_PROMPT.to_string()),
            )
            .with_code(108)
            .with_title(FOLLOWUP_PROMPT)
        } else {
            Interrupt::new(
                stages::WAIT_FOLLOWUP,
                notice.unwrap_or_else(|| FOLLOWUP_PROMPT.to_string()),
            )
            .with_code(107)
        };

        StepOutcome::Suspend(interrupt)
    }
}

/// A bare provider id is not an assignment; say so and offer the options
pub struct ProviderIdOnlyWarning;

#[async_trait]
impl Step for ProviderIdOnlyWarning {
    fn name(&self) -> &'static str {
        names::PROVIDER_ID_ONLY_WARNING
    }

    async fn run(&self, state: &mut ConversationState) -> StepOutcome {
        if state.has_input() {
            return StepOutcome::Advance;
        }

        let provider_id = state
            .last_selected_provider_id
            .clone()
            .unwrap_or_default();

        StepOutcome::Suspend(
            Interrupt::new(
                stages::PROVIDER_ID_ONLY_WARNING,
                format!(
                    "You entered provider ID {id}. To make this provider the member's PCP, reply \"Assign {id}\". To see where they practice, reply \"Address of {id}\".",
                    id = provider_id
                ),
            )
            .with_code(106)
            .with_prompts([
                format!("Assign {}", provider_id),
                format!("Address of {}", provider_id),
            ]),
        )
    }
}
