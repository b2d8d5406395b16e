//! Steps of the PCP and specialist flows

mod interaction;
mod menu;
mod provider_input;
mod search;
mod specialist;
mod termination;
mod update;

pub use interaction::{ProviderIdOnlyWarning, ProviderInteraction, WaitNextFollowup};
pub use menu::{LoadCase, ReturnToMenu, Start};
pub use provider_input::{CollectKnowsProvider, CollectNoFlowFilters, CollectProviderInput};
pub use search::{RunProviderSearch, RunSpecialistGenericSearch};
pub use specialist::{
    SpecialistAskFilters, SpecialistAskService, SpecialistPostCompletion,
    SpecialistProviderAddress,
};
pub use termination::{AssignPcpAskTermination, CollectTerminationReason};
pub use update::UpdatePcp;

use tracing::warn;

use super::stages;
use crate::domain::conversation::ConversationState;
use crate::domain::directory::SearchContext;
use crate::domain::workflow::{Interrupt, StepOutcome};
use crate::domain::DomainError;

const GENERIC_FAILURE: &str =
    "We're sorry, something went wrong while processing your request. Please try again later.";

/// End the traversal with an `ERROR` stage.
///
/// Precondition and verification failures carry their own user-facing text;
/// any other error is shown as `fallback`.
pub(crate) fn fail(
    state: &mut ConversationState,
    step: &'static str,
    error: &DomainError,
    fallback: &str,
) -> StepOutcome {
    warn!(
        thread_id = %state.thread_id,
        step = step,
        error = %error,
        "Step failed"
    );

    let message = match error {
        DomainError::MissingPrecondition { message } => message.clone(),
        DomainError::VerificationMismatch { expected, found } => format!(
            "The PCP change could not be verified: expected provider {} but the member record shows {}. Please review the member's PCP before trying again.",
            expected, found
        ),
        _ if fallback.is_empty() => GENERIC_FAILURE.to_string(),
        _ => fallback.to_string(),
    };

    Interrupt::new(stages::ERROR, message)
        .with_code(500)
        .aura()
        .apply_to(state);

    StepOutcome::Finish
}

/// Use a classifier answer, or the fallback when the call failed
pub(crate) fn classified<T>(
    state: &mut ConversationState,
    call: &'static str,
    result: Result<T, DomainError>,
    fallback: impl FnOnce() -> T,
) -> T {
    match result {
        Ok(value) => {
            state.record_llm_call(call);
            value
        }
        Err(error) => {
            warn!(
                thread_id = %state.thread_id,
                call = call,
                error = %error,
                "Classifier unavailable, using rule-based fallback"
            );
            fallback()
        }
    }
}

pub(crate) fn search_context(state: &ConversationState) -> SearchContext {
    SearchContext {
        member_id: state.member_id.clone(),
        group_id: state.group_id.clone(),
        subscriber_id: state.subscriber_id.clone(),
    }
}

pub(crate) fn today_yyyymmdd() -> String {
    chrono::Local::now()
        .date_naive()
        .format("%Y%m%d")
        .to_string()
}
