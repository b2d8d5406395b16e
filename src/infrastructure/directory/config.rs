use std::time::Duration;

use serde::Deserialize;

/// Provider and member REST service settings.
///
/// Paths are joined onto `base_url`; the payload defaults are sent with
/// every provider search.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    pub base_url: String,
    /// Sent as `x-api-key` when set
    pub api_key: Option<String>,
    pub search_by_id_path: String,
    pub search_by_name_path: String,
    pub search_by_zip_path: String,
    pub specialist_search_path: String,
    pub provider_address_path: String,
    pub member_lookup_path: String,
    pub current_pcp_path: String,
    pub terminate_pcp_path: String,
    pub add_pcp_path: String,
    pub limit: String,
    pub offset: String,
    pub only_pcps: String,
    pub member_override_class: String,
    pub member_override_plan: String,
    pub general_description: String,
    pub starting_location_addr1: String,
    pub timeout_secs: u64,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9090".to_string(),
            api_key: None,
            search_by_id_path: "/providers/search/by-id".to_string(),
            search_by_name_path: "/providers/search/by-name".to_string(),
            search_by_zip_path: "/providers/search/by-zip".to_string(),
            specialist_search_path: "/providers/search/specialists".to_string(),
            provider_address_path: "/providers/addresses".to_string(),
            member_lookup_path: "/members/lookup".to_string(),
            current_pcp_path: "/members/pcp/current".to_string(),
            terminate_pcp_path: "/members/pcp/terminate".to_string(),
            add_pcp_path: "/members/pcp/add".to_string(),
            limit: "10".to_string(),
            offset: "0".to_string(),
            only_pcps: "Y".to_string(),
            member_override_class: String::new(),
            member_override_plan: String::new(),
            general_description: String::new(),
            starting_location_addr1: String::new(),
            timeout_secs: 30,
        }
    }
}

impl DirectoryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}
