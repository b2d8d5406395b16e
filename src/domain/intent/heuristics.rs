//! Rule-based fallbacks used when the classifier cannot be trusted

use once_cell::sync::Lazy;
use regex::Regex;

use super::{FollowupAction, MenuIntent, YesNo};
use crate::domain::directory::{ProviderQuery, SearchType};

static PROVIDER_ID_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{6,})\b").unwrap());

static ZIP_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{5})(?:-\d{4})?\b").unwrap());

static RADIUS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,3})\s*(?:mi|mile|miles)\b").unwrap());

static NAME_IN_CITY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:dr\.?\s+)?(.+?)\s+in\s+([a-z .'-]+?),?\s+([a-z]{2})\.?$").unwrap()
});

static STATE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z]{2}$").unwrap());

const LANGUAGES: &[&str] = &[
    "english",
    "spanish",
    "french",
    "german",
    "chinese",
    "mandarin",
    "cantonese",
    "vietnamese",
    "korean",
    "arabic",
    "russian",
    "portuguese",
    "hindi",
    "tagalog",
];

const ASSIGN_WORDS: &[&str] = &["assign", "select", "choose", "pick", "go with", "set as"];

pub fn menu_intent(message: &str) -> MenuIntent {
    let text = message.to_lowercase();

    if text.contains("pcp") || text.contains("primary care") || text.contains("assign") {
        MenuIntent::AssignPcp
    } else if text.contains("specialist") || text.contains("specialty") {
        MenuIntent::Specialist
    } else {
        MenuIntent::Unsupported
    }
}

/// Answers that commit to neither side
const HEDGES: [&str; 8] = [
    "not sure",
    "unsure",
    "not certain",
    "don't know",
    "dont know",
    "no idea",
    "maybe",
    "not really sure",
];

pub fn yes_no(message: &str) -> YesNo {
    let text = message.trim().to_lowercase();
    if HEDGES.iter().any(|hedge| text.contains(hedge)) {
        return YesNo::Unclear;
    }
    let first = text
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .find(|w| !w.is_empty())
        .unwrap_or("");

    match first {
        "yes" | "y" | "yeah" | "yep" | "sure" | "correct" | "ok" | "okay" => YesNo::Yes,
        "no" | "n" | "nope" | "nah" | "don't" | "dont" | "not" => YesNo::No,
        _ if text.starts_with("i do") && !text.starts_with("i don") => YesNo::Yes,
        _ if text.starts_with("i don") || text.contains("no thank") => YesNo::No,
        _ => YesNo::Unclear,
    }
}

/// Whether an answer already carries a provider id or name search
pub fn looks_like_provider_query(message: &str) -> bool {
    PROVIDER_ID_PATTERN.is_match(message) || NAME_IN_CITY_PATTERN.is_match(message.trim())
}

pub fn extract_provider_id(message: &str) -> Option<String> {
    PROVIDER_ID_PATTERN
        .captures(message)
        .map(|c| c[1].to_string())
}

/// Provider id, else ZIP, else "name, city, state"
pub fn provider_query(message: &str) -> ProviderQuery {
    let text = message.trim();

    if let Some(provider_id) = extract_provider_id(text) {
        return ProviderQuery {
            search_type: Some(SearchType::Id),
            provider_id: Some(provider_id),
            ..Default::default()
        };
    }

    let mut query = ProviderQuery::default();

    if let Some(caps) = NAME_IN_CITY_PATTERN.captures(text) {
        query.name = Some(caps[1].trim().to_string());
        query.city = Some(caps[2].trim().to_string());
        query.state = Some(caps[3].to_ascii_uppercase());
    } else {
        let parts: Vec<&str> = text
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();

        match parts.as_slice() {
            [name, city, state, ..] if STATE_PATTERN.is_match(state) => {
                query.name = Some(name.to_string());
                query.city = Some(city.to_string());
                query.state = Some(state.to_ascii_uppercase());
            }
            [name, ..] if !ZIP_PATTERN.is_match(text) || parts.len() > 1 => {
                query.name = Some(name.to_string());
            }
            _ => {}
        }
    }

    let filters = search_filters(text);
    query.zip = filters.zip;
    query.radius_miles = filters.radius_miles;

    query.search_type = Some(if query.name.is_none() && query.zip.is_some() {
        SearchType::ZipOnly
    } else {
        SearchType::NameCityState
    });

    query
}

/// ZIP, radius, language and gender from free text
pub fn search_filters(message: &str) -> ProviderQuery {
    let text = message.to_lowercase();

    let zip = ZIP_PATTERN.captures(message).map(|c| c[1].to_string());

    let radius_miles = RADIUS_PATTERN
        .captures(message)
        .and_then(|c| c[1].parse::<u32>().ok());

    let language = LANGUAGES
        .iter()
        .find(|l| text.contains(*l))
        .map(|l| capitalize(l));

    let gender = if text.contains("female") || text.contains("woman") {
        Some("F".to_string())
    } else if text.contains("male") || text.contains(" man") {
        Some("M".to_string())
    } else {
        None
    };

    ProviderQuery {
        search_type: zip.as_ref().map(|_| SearchType::ZipOnly),
        zip,
        radius_miles,
        language,
        gender,
        ..Default::default()
    }
}

/// Follow-up action after a provider list
pub fn followup(message: &str) -> FollowupAction {
    let text = message.trim().to_lowercase();
    let provider_id = extract_provider_id(&text);

    if text.contains("address") || text.contains("located") || text.contains("location") {
        return FollowupAction::AddressInquiry { provider_id };
    }

    if ASSIGN_WORDS.iter().any(|w| text.contains(w)) {
        return FollowupAction::AssignPcp { provider_id };
    }

    match provider_id {
        Some(id) if text.chars().all(|c| c.is_ascii_digit() || c.is_whitespace()) => {
            FollowupAction::ProviderIdOnly { provider_id: id }
        }
        _ => FollowupAction::Question,
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
