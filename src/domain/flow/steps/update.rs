use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Days, Local, NaiveDate};
use tracing::info;

use super::fail;
use crate::domain::conversation::ConversationState;
use crate::domain::directory::{
    AddPcpRequest, MemberDirectory, MemberKeys, PcpAssignment, PcpWriter, TerminatePcpRequest,
};
use crate::domain::flow::{names, stages};
use crate::domain::workflow::{Interrupt, Step, StepOutcome};
use crate::domain::DomainError;

const UPDATE_FAILED: &str =
    "We couldn't update the member's PCP right now. No further changes were made. Please try again later.";

/// Replaces the member's PCP with the selected provider.
///
/// The current PCP is terminated effective today, the new one is added
/// effective tomorrow, and the change is confirmed by reading the member's
/// PCP as of tomorrow. Writes are attempted once each.
pub struct UpdatePcp {
    members: Arc<dyn MemberDirectory>,
    writer: Arc<dyn PcpWriter>,
}

impl UpdatePcp {
    pub fn new(members: Arc<dyn MemberDirectory>, writer: Arc<dyn PcpWriter>) -> Self {
        Self { members, writer }
    }

    fn member_keys(state: &ConversationState) -> Result<MemberKeys, DomainError> {
        match (&state.group_id, &state.subscriber_id) {
            (Some(group_id), Some(subscriber_id)) => Ok(MemberKeys {
                group_id: group_id.clone(),
                subscriber_id: subscriber_id.clone(),
                member_suffix: state.member_suffix.clone(),
                member_key: state.member_key.clone(),
            }),
            _ => Err(DomainError::missing_precondition(
                "The member's group and subscriber details are missing, so the PCP cannot be changed. Please reload the member case and try again.",
            )),
        }
    }

    fn provider_label(state: &ConversationState, provider_id: &str) -> String {
        state
            .selected_provider_snapshot
            .as_ref()
            .filter(|p| p.provider_id == provider_id)
            .and_then(|p| p.name.clone())
            .map(|name| format!("{} (ID {})", name, provider_id))
            .unwrap_or_else(|| format!("provider {}", provider_id))
    }

    async fn apply(
        &self,
        state: &mut ConversationState,
        member: MemberKeys,
        provider_id: &str,
        today: NaiveDate,
        effective: NaiveDate,
    ) -> Result<(), DomainError> {
        if let Some(current) = state.active_provider_id.clone() {
            state.record_api_call("TerminatePCP");
            self.writer
                .terminate_pcp(&TerminatePcpRequest {
                    member: member.clone(),
                    provider_id: current,
                    termination_date: today,
                    reason: state.termination_reason.clone(),
                })
                .await?;
        }

        state.record_api_call("AddPCP");
        self.writer
            .add_pcp(&AddPcpRequest {
                member: member.clone(),
                provider_id: provider_id.to_string(),
                effective_date: effective,
                reason: state.termination_reason.clone(),
            })
            .await?;

        state.record_api_call("VerifyPCP");
        let found = self.members.current_pcp(&member, effective).await?;

        match found {
            Some(PcpAssignment {
                provider_id: ref found_id,
                ..
            }) if found_id == provider_id => Ok(()),
            Some(other) => Err(DomainError::verification_mismatch(
                provider_id,
                other.provider_id,
            )),
            None => Err(DomainError::verification_mismatch(provider_id, "no PCP")),
        }
    }
}

#[async_trait]
impl Step for UpdatePcp {
    fn name(&self) -> &'static str {
        names::UPDATE_PCP
    }

    async fn run(&self, state: &mut ConversationState) -> StepOutcome {
        let member = match Self::member_keys(state) {
            Ok(member) => member,
            Err(e) => return fail(state, self.name(), &e, ""),
        };

        let Some(provider_id) = state.last_selected_provider_id.clone() else {
            let error = DomainError::missing_precondition(
                "No provider was selected for assignment. Please choose a provider from the list.",
            );
            return fail(state, self.name(), &error, "");
        };

        let label = Self::provider_label(state, &provider_id);

        if state.active_provider_id.as_deref() == Some(provider_id.as_str()) {
            Interrupt::new(
                stages::COMPLETED,
                format!("{} is already the member's PCP. No change was made.", label),
            )
            .with_code(110)
            .apply_to(state);
            return StepOutcome::Finish;
        }

        let today = Local::now().date_naive();
        let effective = today.checked_add_days(Days::new(1)).unwrap_or(today);

        if let Err(e) = self
            .apply(state, member, &provider_id, today, effective)
            .await
        {
            return fail(state, self.name(), &e, UPDATE_FAILED);
        }

        info!(
            thread_id = %state.thread_id,
            provider_id = %provider_id,
            effective_date = %effective,
            "PCP updated"
        );

        let assignment = PcpAssignment::new(provider_id).effective_on(effective);
        state.active_provider_id = Some(assignment.provider_id);
        state.active_effective_date = assignment.effective_date;

        Interrupt::new(
            stages::COMPLETED,
            format!(
                "{} has been assigned as the member's PCP, effective {}.",
                label,
                effective.format("%m/%d/%Y")
            ),
        )
        .with_code(110)
        .apply_to(state);

        StepOutcome::Finish
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::directory::{
        MemberProfile, MockMemberDirectory, MockPcpWriter, ProviderRecord,
    };

    fn member_directory(current: Option<&str>) -> MockMemberDirectory {
        MockMemberDirectory::new().with_profile(MemberProfile {
            member_id: "M1".to_string(),
            group_id: Some("G1".to_string()),
            subscriber_id: Some("S1".to_string()),
            member_suffix: Some("01".to_string()),
            member_key: None,
            current_pcp: current.map(PcpAssignment::new),
        })
    }

    fn selected_state() -> ConversationState {
        let mut state = ConversationState::new("t1");
        state.group_id = Some("G1".to_string());
        state.subscriber_id = Some("S1".to_string());
        state.active_provider_id = Some("11111111".to_string());
        state.termination_reason = Some("Member relocated".to_string());
        state.last_selected_provider_id = Some("12345678".to_string());
        state.selected_provider_snapshot =
            Some(ProviderRecord::new("12345678").with_name("Dr. Jane Smith"));
        state
    }

    #[tokio::test]
    async fn test_terminate_add_verify() {
        let today = Local::now().date_naive();
        let tomorrow = today.checked_add_days(Days::new(1)).unwrap();

        let members = Arc::new(member_directory(Some("11111111")));
        members.set_current_pcp(Some(PcpAssignment::new("12345678")));

        let mut writer = MockPcpWriter::new();
        writer
            .expect_terminate_pcp()
            .withf(move |r| r.provider_id == "11111111" && r.termination_date == today)
            .times(1)
            .returning(|_| Ok(()));
        writer
            .expect_add_pcp()
            .withf(move |r| {
                r.provider_id == "12345678"
                    && r.effective_date == tomorrow
                    && r.member.group_id == "G1"
                    && r.reason.as_deref() == Some("Member relocated")
            })
            .times(1)
            .returning(|_| Ok(()));

        let step = UpdatePcp::new(members, Arc::new(writer));
        let mut state = selected_state();

        assert_eq!(step.run(&mut state).await, StepOutcome::Finish);
        assert_eq!(state.stage.as_deref(), Some(stages::COMPLETED));
        assert_eq!(state.ai_response_code, Some(110));
        assert_eq!(state.active_provider_id.as_deref(), Some("12345678"));
        let response = state.ai_response.as_deref().unwrap();
        assert!(response.contains("Dr. Jane Smith (ID 12345678)"));
        assert!(response.contains(&tomorrow.format("%m/%d/%Y").to_string()));
        assert_eq!(state.call_source(), "API:VerifyPCP");
    }

    #[tokio::test]
    async fn test_no_current_pcp_skips_terminate() {
        let members = Arc::new(member_directory(None));
        members.set_current_pcp(Some(PcpAssignment::new("12345678")));

        let mut writer = MockPcpWriter::new();
        writer.expect_terminate_pcp().times(0);
        writer.expect_add_pcp().times(1).returning(|_| Ok(()));

        let step = UpdatePcp::new(members, Arc::new(writer));
        let mut state = selected_state();
        state.active_provider_id = None;

        assert_eq!(step.run(&mut state).await, StepOutcome::Finish);
        assert_eq!(state.stage.as_deref(), Some(stages::COMPLETED));
    }

    #[tokio::test]
    async fn test_verification_mismatch_is_error() {
        let members = Arc::new(member_directory(Some("11111111")));

        let mut writer = MockPcpWriter::new();
        writer.expect_terminate_pcp().returning(|_| Ok(()));
        writer.expect_add_pcp().returning(|_| Ok(()));

        let step = UpdatePcp::new(members, Arc::new(writer));
        let mut state = selected_state();

        assert_eq!(step.run(&mut state).await, StepOutcome::Finish);
        assert_eq!(state.stage.as_deref(), Some(stages::ERROR));
        assert_eq!(state.ai_response_code, Some(500));
        assert!(state.ai_response.as_deref().unwrap().contains("11111111"));
        assert_eq!(state.active_provider_id.as_deref(), Some("11111111"));
    }

    #[tokio::test]
    async fn test_add_failure_is_not_retried() {
        let members = Arc::new(member_directory(Some("11111111")));

        let mut writer = MockPcpWriter::new();
        writer.expect_terminate_pcp().returning(|_| Ok(()));
        writer
            .expect_add_pcp()
            .times(1)
            .returning(|_| Err(DomainError::transient("pcp-writer", "HTTP 503")));

        let step = UpdatePcp::new(members, Arc::new(writer));
        let mut state = selected_state();

        step.run(&mut state).await;

        assert_eq!(state.stage.as_deref(), Some(stages::ERROR));
        assert_eq!(state.ai_response.as_deref(), Some(UPDATE_FAILED));
    }

    #[tokio::test]
    async fn test_missing_member_keys_is_error() {
        let mut writer = MockPcpWriter::new();
        writer.expect_add_pcp().times(0);

        let step = UpdatePcp::new(Arc::new(MockMemberDirectory::new()), Arc::new(writer));
        let mut state = selected_state();
        state.subscriber_id = None;

        step.run(&mut state).await;

        assert_eq!(state.stage.as_deref(), Some(stages::ERROR));
        assert!(state
            .ai_response
            .as_deref()
            .unwrap()
            .contains("group and subscriber"));
    }

    #[tokio::test]
    async fn test_same_provider_is_not_changed() {
        let mut writer = MockPcpWriter::new();
        writer.expect_terminate_pcp().times(0);
        writer.expect_add_pcp().times(0);

        let step = UpdatePcp::new(Arc::new(MockMemberDirectory::new()), Arc::new(writer));
        let mut state = selected_state();
        state.active_provider_id = Some("12345678".to_string());

        step.run(&mut state).await;

        assert_eq!(state.stage.as_deref(), Some(stages::COMPLETED));
        assert!(state.ai_response.as_deref().unwrap().contains("already"));
    }
}
