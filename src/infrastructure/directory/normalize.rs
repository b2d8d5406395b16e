//! Directory payloads to domain records

use serde_json::Value;

use crate::domain::directory::{MemberProfile, PcpAssignment, ProviderAddress, ProviderRecord};
use crate::domain::DomainError;

/// String form of a scalar; blank strings and non-scalars are `None`
pub(crate) fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "Y" } else { "N" }.to_string()),
        _ => None,
    }
}

fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Entries under `key`, accepting a single object or a list
fn entries<'a>(payload: &'a Value, key: &str) -> Vec<&'a Value> {
    match payload.get(key) {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(item @ Value::Object(_)) => vec![item],
        _ => Vec::new(),
    }
}

/// Normalize `providerDetails` into records.
///
/// Entries that are not objects or carry no provider id are skipped.
pub fn provider_records(payload: &Value) -> Vec<ProviderRecord> {
    let details = entries(payload, "providerDetails");
    let total = details.len();

    let records: Vec<ProviderRecord> = details.into_iter().filter_map(provider_record).collect();

    if records.len() < total {
        tracing::warn!(
            skipped = total - records.len(),
            "Skipped malformed provider entries"
        );
    }

    records
}

fn provider_record(detail: &Value) -> Option<ProviderRecord> {
    let info = detail.get("providerInfo").filter(|v| v.is_object())?;
    let contact = detail.get("providerContact").unwrap_or(&Value::Null);

    Some(ProviderRecord {
        provider_id: text(info.get("providerId"))?,
        name: text(info.get("providerName")).or_else(|| text(info.get("providerFullName"))),
        address1: text(contact.get("addressLine1")),
        address2: text(contact.get("addressLine2")),
        city: text(contact.get("city")),
        state: text(contact.get("state")),
        zip: text(contact.get("zip")),
        county: text(contact.get("county")),
        phone: text(contact.get("phone")),
        fax: text(contact.get("fax")),
        network_status: text(info.get("networkStatus")),
        accepting_new_members: text(info.get("isAcceptingNewMembers")),
        pcp_assignment_indicator: text(info.get("pcpAssnInd")),
        distance_miles: number(info.get("distanceInMiles")),
    })
}

/// Addresses from `providerAddress`, falling back to `addresses`
pub fn provider_addresses(provider_id: &str, payload: &Value) -> Vec<ProviderAddress> {
    let mut items = entries(payload, "providerAddress");
    if items.is_empty() {
        items = entries(payload, "addresses");
    }

    items
        .into_iter()
        .filter(|item| item.is_object())
        .map(|item| ProviderAddress {
            provider_id: text(item.get("providerId")).unwrap_or_else(|| provider_id.to_string()),
            address_type: text(item.get("addressType")),
            address_line1: text(item.get("addressLine1")),
            address_line2: text(item.get("addressLine2")),
            city: text(item.get("city")),
            state: text(item.get("state")),
            zip: text(item.get("zip")),
            country: text(item.get("country")),
            phone: text(item.get("phone")),
            fax: text(item.get("fax")),
            effective_date: text(item.get("effectiveDate")),
            termination_date: text(item.get("terminationDate")),
        })
        .collect()
}

/// PCP assignment from a `pcp`/`currentPcp` object or top-level `providerId`
pub fn pcp_assignment(payload: &Value) -> Option<PcpAssignment> {
    let source = ["currentPcp", "pcp"]
        .into_iter()
        .filter_map(|key| payload.get(key))
        .find(|v| v.is_object())
        .unwrap_or(payload);

    let provider_id = text(source.get("providerId"))?;

    Some(PcpAssignment {
        provider_id,
        effective_date: text(source.get("effectiveDate")),
    })
}

pub fn member_profile(member_id: &str, payload: &Value) -> Result<MemberProfile, DomainError> {
    let member = payload
        .get("member")
        .filter(|v| v.is_object())
        .unwrap_or(payload);

    if !member.is_object() {
        return Err(DomainError::not_found(format!(
            "Member {} not found",
            member_id
        )));
    }

    Ok(MemberProfile {
        member_id: text(member.get("memberId")).unwrap_or_else(|| member_id.to_string()),
        group_id: text(member.get("groupId")),
        subscriber_id: text(member.get("subscriberId")),
        member_suffix: text(member.get("memberSuffix")),
        member_key: text(member.get("memberKey")),
        current_pcp: pcp_assignment(member),
    })
}
