use serde::{Deserialize, Serialize};

/// How a provider search is keyed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    Id,
    NameCityState,
    ZipOnly,
}

impl SearchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::NameCityState => "name_city_state",
            Self::ZipOnly => "zip_only",
        }
    }
}

/// Provider search criteria as captured from the user.
///
/// Every field is optional; `resolve` fills in defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderQuery {
    pub search_type: Option<SearchType>,
    pub provider_id: Option<String>,
    pub name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub as_of_date: Option<String>,
    pub radius_miles: Option<u32>,
    pub language: Option<String>,
    pub gender: Option<String>,
}

/// Values used when the user did not supply one
#[derive(Debug, Clone, PartialEq)]
pub struct SearchDefaults {
    pub radius_miles: u32,
    /// `YYYYMMDD`
    pub as_of_date: String,
}

impl SearchDefaults {
    pub fn new(radius_miles: u32, as_of_date: impl Into<String>) -> Self {
        Self {
            radius_miles,
            as_of_date: as_of_date.into(),
        }
    }

    /// Defaults with `as_of_date` set to today's local date
    pub fn today(radius_miles: u32) -> Self {
        Self::new(
            radius_miles,
            chrono::Local::now().date_naive().format("%Y%m%d").to_string(),
        )
    }
}

/// Fully specified search, ready for a directory call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedSearch {
    pub search_type: SearchType,
    pub provider_id: Option<String>,
    pub name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub as_of_date: String,
    pub radius_miles: u32,
    pub language: Option<String>,
    pub gender: Option<String>,
}

impl ProviderQuery {
    /// Copy every field the other query sets over this one
    pub fn merge(&mut self, other: ProviderQuery) {
        fn take<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        take(&mut self.search_type, other.search_type);
        take(&mut self.provider_id, other.provider_id);
        take(&mut self.name, other.name);
        take(&mut self.city, other.city);
        take(&mut self.state, other.state);
        take(&mut self.zip, other.zip);
        take(&mut self.as_of_date, other.as_of_date);
        take(&mut self.radius_miles, other.radius_miles);
        take(&mut self.language, other.language);
        take(&mut self.gender, other.gender);
    }

    /// Search type explicitly set, or inferred from the populated fields
    pub fn effective_search_type(&self) -> SearchType {
        if let Some(search_type) = self.search_type {
            return search_type;
        }

        if non_blank(&self.provider_id).is_some() {
            SearchType::Id
        } else if non_blank(&self.name).is_none() && non_blank(&self.zip).is_some() {
            SearchType::ZipOnly
        } else {
            SearchType::NameCityState
        }
    }

    /// Apply defaults first, then let every value the user gave override them
    pub fn resolve(&self, defaults: &SearchDefaults) -> ResolvedSearch {
        ResolvedSearch {
            search_type: self.effective_search_type(),
            provider_id: non_blank(&self.provider_id),
            name: non_blank(&self.name),
            city: non_blank(&self.city),
            state: non_blank(&self.state).map(|s| s.to_ascii_uppercase()),
            zip: non_blank(&self.zip),
            as_of_date: non_blank(&self.as_of_date).unwrap_or_else(|| defaults.as_of_date.clone()),
            radius_miles: self
                .radius_miles
                .filter(|r| *r > 0)
                .unwrap_or(defaults.radius_miles),
            language: non_blank(&self.language),
            gender: non_blank(&self.gender),
        }
    }
}

impl ResolvedSearch {
    /// Name of the first criterion the search type needs but lacks
    pub fn missing_criterion(&self) -> Option<&'static str> {
        match self.search_type {
            SearchType::Id if self.provider_id.is_none() => Some("provider ID"),
            SearchType::ZipOnly if self.zip.is_none() => Some("ZIP code"),
            SearchType::NameCityState if self.name.is_none() && self.zip.is_none() => {
                Some("provider name")
            }
            SearchType::NameCityState
                if self.zip.is_none() && (self.city.is_none() || self.state.is_none()) =>
            {
                Some("city and state")
            }
            _ => None,
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
