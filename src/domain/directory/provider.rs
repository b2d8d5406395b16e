use serde::{Deserialize, Serialize};

/// Normalized provider record returned by every search variant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderRecord {
    pub provider_id: String,
    pub name: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub county: Option<String>,
    pub phone: Option<String>,
    pub fax: Option<String>,
    pub network_status: Option<String>,
    pub accepting_new_members: Option<String>,
    pub pcp_assignment_indicator: Option<String>,
    pub distance_miles: Option<f64>,
}

impl ProviderRecord {
    pub fn new(provider_id: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_location(
        mut self,
        city: impl Into<String>,
        state: impl Into<String>,
        zip: impl Into<String>,
    ) -> Self {
        self.city = Some(city.into());
        self.state = Some(state.into());
        self.zip = Some(zip.into());
        self
    }

    pub fn with_network_status(mut self, status: impl Into<String>) -> Self {
        self.network_status = Some(status.into());
        self
    }

    pub fn with_distance(mut self, miles: f64) -> Self {
        self.distance_miles = Some(miles);
        self
    }

    /// Single-line postal address, empty parts skipped
    pub fn formatted_address(&self) -> String {
        let mut parts: Vec<String> = [&self.address1, &self.address2]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        let state_zip = [&self.state, &self.zip]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        let locality = match self.city.as_deref().map(str::trim) {
            Some(city) if !city.is_empty() && !state_zip.is_empty() => {
                format!("{}, {}", city, state_zip)
            }
            Some(city) if !city.is_empty() => city.to_string(),
            _ => state_zip,
        };

        if !locality.is_empty() {
            parts.push(locality);
        }

        parts.join(", ")
    }

    /// Display label for the network status code
    pub fn network_label(&self) -> String {
        let raw = self.network_status.as_deref().unwrap_or("").trim();

        match raw.to_ascii_uppercase().as_str() {
            "I" | "IN" | "INN" | "IN NETWORK" | "IN_NETWORK" => "In Network".to_string(),
            "O" | "OUT" | "OON" | "OUT NETWORK" | "OUT_OF_NETWORK" => "Out Network".to_string(),
            _ => raw.to_string(),
        }
    }

    pub fn to_list_item(&self) -> ProviderListItem {
        ProviderListItem {
            provider_id: self.provider_id.clone(),
            name: self.name.clone().unwrap_or_default(),
            address: self.formatted_address(),
            network: self.network_label(),
            is_accepting_new_members: self.accepting_new_members.clone().unwrap_or_default(),
            pcp_assn_ind: self.pcp_assignment_indicator.clone().unwrap_or_default(),
            distance_in_miles: self.distance_miles,
        }
    }
}

/// Provider as rendered in the `SHOW_PROVIDER_LIST` payload.
///
/// Field order is part of the response contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderListItem {
    #[serde(rename = "ProviderID")]
    pub provider_id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Address")]
    pub address: String,
    #[serde(rename = "Network")]
    pub network: String,
    #[serde(rename = "IsAcceptingNewMembers")]
    pub is_accepting_new_members: String,
    #[serde(rename = "PCPAssnInd")]
    pub pcp_assn_ind: String,
    #[serde(rename = "DistanceInMiles")]
    pub distance_in_miles: Option<f64>,
}

#[derive(Serialize)]
struct ProviderListPayload {
    providers: Vec<ProviderListItem>,
}

/// Render `{"providers":[...]}` for a list of records
pub fn render_provider_list(records: &[ProviderRecord]) -> String {
    let payload = ProviderListPayload {
        providers: records.iter().map(ProviderRecord::to_list_item).collect(),
    };

    serde_json::to_string(&payload).unwrap_or_else(|_| r#"{"providers":[]}"#.to_string())
}

/// One address on file for a provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProviderAddress {
    #[serde(rename = "ProviderID")]
    pub provider_id: String,
    pub address_type: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub fax: Option<String>,
    pub effective_date: Option<String>,
    pub termination_date: Option<String>,
}

#[derive(Serialize)]
struct ProviderAddressPayload<'a> {
    #[serde(rename = "providerAddress")]
    provider_address: &'a [ProviderAddress],
}

/// Render `{"providerAddress":[...]}` for a list of addresses
pub fn render_provider_addresses(addresses: &[ProviderAddress]) -> String {
    let payload = ProviderAddressPayload {
        provider_address: addresses,
    };

    serde_json::to_string(&payload).unwrap_or_else(|_| r#"{"providerAddress":[]}"#.to_string())
}
