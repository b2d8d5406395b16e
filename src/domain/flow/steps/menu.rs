use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::classified;
use crate::domain::conversation::{ConversationState, Flow};
use crate::domain::directory::{MemberDirectory, MemberProfile};
use crate::domain::flow::{names, stages};
use crate::domain::intent::{heuristics, Classifier, MenuIntent};
use crate::domain::workflow::{Interrupt, Step, StepOutcome};

pub const MENU_PROMPT: &str = "How can I help you today?";
pub const MENU_OPTIONS: [&str; 2] = ["Assign PCP", "Specialist Search"];

const UNSUPPORTED_MESSAGE: &str =
    "I can help with assigning a PCP or searching for a specialist. Please choose one of these options.";

/// Entry of every traversal: resets a finished conversation and loads the
/// member case when a member id is known.
pub struct LoadCase {
    members: Arc<dyn MemberDirectory>,
}

impl LoadCase {
    pub fn new(members: Arc<dyn MemberDirectory>) -> Self {
        Self { members }
    }
}

#[async_trait]
impl Step for LoadCase {
    fn name(&self) -> &'static str {
        names::LOAD_CASE
    }

    async fn run(&self, state: &mut ConversationState) -> StepOutcome {
        if state.stage.is_some() {
            debug!(
                thread_id = %state.thread_id,
                previous_stage = state.stage.as_deref().unwrap_or_default(),
                "Restarting finished conversation"
            );
            state.restart();
        }

        let Some(member_id) = state.member_id.clone() else {
            return StepOutcome::Advance;
        };

        if state.has_member_case() {
            return StepOutcome::Advance;
        }

        match self.members.lookup_member(&member_id).await {
            Ok(profile) => {
                state.record_api_call("MemberLookup");
                apply_profile(state, profile);
                info!(thread_id = %state.thread_id, "Loaded member case");
            }
            Err(e) => {
                warn!(
                    thread_id = %state.thread_id,
                    error = %e,
                    "Member lookup failed, continuing without member case"
                );
            }
        }

        StepOutcome::Advance
    }
}

fn apply_profile(state: &mut ConversationState, profile: MemberProfile) {
    state.group_id = profile.group_id;
    state.subscriber_id = profile.subscriber_id;
    state.member_suffix = profile.member_suffix;
    state.member_key = profile.member_key;

    if let Some(pcp) = profile.current_pcp {
        state.active_provider_id = Some(pcp.provider_id);
        state.active_effective_date = pcp.effective_date;
    }
}

/// Shows the menu, then classifies the choice
pub struct Start {
    classifier: Arc<dyn Classifier>,
}

impl Start {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self { classifier }
    }
}

#[async_trait]
impl Step for Start {
    fn name(&self) -> &'static str {
        names::START
    }

    async fn run(&self, state: &mut ConversationState) -> StepOutcome {
        let Some(message) = state.take_input() else {
            return StepOutcome::Suspend(
                Interrupt::new(stages::MENU, MENU_PROMPT)
                    .with_code(100)
                    .dialog()
                    .with_prompts(MENU_OPTIONS),
            );
        };

        let result = self.classifier.classify_menu(&message).await;
        let intent = classified(state, "classify_menu", result, || {
            heuristics::menu_intent(&message)
        });

        state.menu_intent = Some(intent);
        state.flow = Some(match intent {
            MenuIntent::AssignPcp => Flow::Pcp,
            MenuIntent::Specialist => Flow::Specialist,
            MenuIntent::Unsupported => Flow::Other,
        });

        debug!(thread_id = %state.thread_id, intent = ?intent, "Menu choice classified");

        if intent == MenuIntent::Unsupported {
            Interrupt::new(stages::START, UNSUPPORTED_MESSAGE)
                .with_code(101)
                .with_prompts(MENU_OPTIONS)
                .apply_to(state);
        }

        StepOutcome::Advance
    }
}

/// Clears the finished specialist request before showing the menu again
pub struct ReturnToMenu;

#[async_trait]
impl Step for ReturnToMenu {
    fn name(&self) -> &'static str {
        names::RETURN_TO_MENU
    }

    async fn run(&self, state: &mut ConversationState) -> StepOutcome {
        state.restart();
        state.last_user_input = None;
        StepOutcome::Advance
    }
}
