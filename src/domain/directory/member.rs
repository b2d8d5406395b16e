use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Member case details needed for PCP changes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemberProfile {
    pub member_id: String,
    pub group_id: Option<String>,
    pub subscriber_id: Option<String>,
    pub member_suffix: Option<String>,
    pub member_key: Option<String>,
    pub current_pcp: Option<PcpAssignment>,
}

/// A PCP assignment as recorded by the member system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PcpAssignment {
    pub provider_id: String,
    /// `YYYY-MM-DD` when known
    pub effective_date: Option<String>,
}

impl PcpAssignment {
    pub fn new(provider_id: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            effective_date: None,
        }
    }

    pub fn effective_on(mut self, date: NaiveDate) -> Self {
        self.effective_date = Some(date.format("%Y-%m-%d").to_string());
        self
    }
}

/// Keys identifying the member whose PCP is being changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberKeys {
    pub group_id: String,
    pub subscriber_id: String,
    pub member_suffix: Option<String>,
    pub member_key: Option<String>,
}

/// End the member's current PCP assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TerminatePcpRequest {
    pub member: MemberKeys,
    pub provider_id: String,
    pub termination_date: NaiveDate,
    pub reason: Option<String>,
}

/// Start a new PCP assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddPcpRequest {
    pub member: MemberKeys,
    pub provider_id: String,
    pub effective_date: NaiveDate,
    pub reason: Option<String>,
}

/// Member context attached to provider searches
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchContext {
    pub member_id: Option<String>,
    pub group_id: Option<String>,
    pub subscriber_id: Option<String>,
}
