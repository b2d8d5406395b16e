//! Branch decisions for the PCP and specialist flows

use crate::domain::conversation::{ConversationState, Flow, KnowsProvider};
use crate::domain::intent::{FollowupKind, MenuIntent};
use crate::domain::workflow::Router;

pub mod branch {
    pub const ASSIGN_PCP: &str = "assign_pcp";
    pub const SPECIALIST: &str = "specialist";
    pub const UNSUPPORTED: &str = "unsupported";
    pub const KNOWS: &str = "knows";
    pub const UNKNOWN: &str = "unknown";
    pub const ASSIGN: &str = "assign";
    pub const PID_ONLY: &str = "pid_only";
    pub const LOOP: &str = "loop";
    pub const DONE: &str = "done";
    pub const END: &str = "end";
    pub const MENU: &str = "menu";
}

/// Menu choice stored by the `start` step
#[derive(Debug)]
pub struct MenuRouter;

impl Router for MenuRouter {
    fn name(&self) -> &'static str {
        "menu"
    }

    fn branches(&self) -> &'static [&'static str] {
        &[branch::ASSIGN_PCP, branch::SPECIALIST, branch::UNSUPPORTED]
    }

    fn decide(&self, state: &ConversationState) -> &'static str {
        match (state.menu_intent, state.flow) {
            (Some(MenuIntent::AssignPcp), Some(Flow::Pcp)) => branch::ASSIGN_PCP,
            (Some(MenuIntent::Specialist), Some(Flow::Specialist)) => branch::SPECIALIST,
            _ => branch::UNSUPPORTED,
        }
    }
}

/// Whether the caller already knows the provider
#[derive(Debug)]
pub struct KnowsProviderRouter;

impl Router for KnowsProviderRouter {
    fn name(&self) -> &'static str {
        "knows_provider"
    }

    fn branches(&self) -> &'static [&'static str] {
        &[branch::KNOWS, branch::UNKNOWN]
    }

    fn decide(&self, state: &ConversationState) -> &'static str {
        match state.knows_provider {
            KnowsProvider::Yes => branch::KNOWS,
            KnowsProvider::No | KnowsProvider::Unknown => branch::UNKNOWN,
        }
    }
}

/// Next move after a follow-up on a provider list.
///
/// Only an explicit assign classification with a selected provider in the
/// PCP flow leads to the update.
#[derive(Debug)]
pub struct FollowupRouter;

impl Router for FollowupRouter {
    fn name(&self) -> &'static str {
        "followup"
    }

    fn branches(&self) -> &'static [&'static str] {
        &[branch::ASSIGN, branch::PID_ONLY, branch::LOOP]
    }

    fn decide(&self, state: &ConversationState) -> &'static str {
        match state.last_followup_action {
            Some(FollowupKind::AssignPcp)
                if state.flow == Some(Flow::Pcp) && state.last_selected_provider_id.is_some() =>
            {
                branch::ASSIGN
            }
            Some(FollowupKind::ProviderIdOnly) => branch::PID_ONLY,
            _ => branch::LOOP,
        }
    }
}

/// Stay on the specialist address step until an address was shown
#[derive(Debug)]
pub struct SpecialistAddressRouter;

impl Router for SpecialistAddressRouter {
    fn name(&self) -> &'static str {
        "specialist_address"
    }

    fn branches(&self) -> &'static [&'static str] {
        &[branch::DONE, branch::LOOP]
    }

    fn decide(&self, state: &ConversationState) -> &'static str {
        let answered = state.last_followup_action == Some(FollowupKind::AddressInquiry)
            && state.provider_addresses.is_some();

        if answered {
            branch::DONE
        } else {
            branch::LOOP
        }
    }
}

/// Back to the menu only when the caller asked for more help
#[derive(Debug)]
pub struct PostCompletionRouter;

impl Router for PostCompletionRouter {
    fn name(&self) -> &'static str {
        "post_completion"
    }

    fn branches(&self) -> &'static [&'static str] {
        &[branch::END, branch::MENU]
    }

    fn decide(&self, state: &ConversationState) -> &'static str {
        match state.wants_more_help {
            Some(true) => branch::MENU,
            _ => branch::END,
        }
    }
}
