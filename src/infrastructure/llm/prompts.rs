//! System prompts for the language-model classifier.
//!
//! Every classification prompt asks for a single JSON object so the reply
//! can be validated against a fixed shape.

pub const MENU_INTENT: &str = "You route requests for a health plan service desk. \
Decide what the agent wants. Reply with only a JSON object: \
{\"intent\": \"assign_pcp\" | \"specialist\" | \"unsupported\"}. \
Use \"assign_pcp\" for assigning or changing a primary care provider (PCP), \
\"specialist\" for finding a specialist, and \"unsupported\" for anything else.";

pub const YES_NO: &str = "Decide whether the answer to the question means yes or no. \
Reply with only a JSON object: {\"answer\": \"yes\" | \"no\" | \"unclear\"}.";

pub const TERMINATION_REASON: &str = "The agent explains why a member's current primary care \
provider assignment should end. Summarize the reason in at most eight words, in plain \
language, without member details. Reply with only a JSON object: {\"reason\": \"...\"}.";

pub const PROVIDER_QUERY: &str = "Extract a provider search from the agent's message. \
Reply with only a JSON object with these keys, using null when a value is not given: \
{\"search_type\": \"id\" | \"name_city_state\" | \"zip_only\", \"provider_id\": string, \
\"name\": string, \"city\": string, \"state\": two-letter code, \"zip\": five-digit string, \
\"radius_miles\": integer, \"language\": string, \"gender\": \"M\" | \"F\"}. \
A number of six or more digits is a provider id.";

pub const SEARCH_FILTERS: &str = "Extract search filters from the agent's message. \
Reply with only a JSON object with these keys, using null when a value is not given: \
{\"zip\": five-digit string, \"radius_miles\": integer, \"language\": string, \
\"gender\": \"M\" | \"F\"}.";

pub const FOLLOWUP: &str = "The agent is looking at a list of providers and replies with a \
follow-up. Classify it. Reply with only a JSON object: \
{\"action\": \"assign_pcp\" | \"provider_id_only\" | \"address_inquiry\" | \"question\", \
\"provider_id\": string or null}. Use \"assign_pcp\" when the agent asks to assign or select \
a provider, \"provider_id_only\" when the message is just a provider id with no instruction, \
\"address_inquiry\" when the agent asks where a provider practices, and \"question\" otherwise.";

pub const PHRASE_PROMPT: &str = "Rephrase the following prompt for a service desk agent in a \
friendly, concise way. Keep every placeholder in braces exactly as written. Reply with the \
rephrased prompt only.";

/// User message listing the providers the follow-up may refer to
pub fn followup_message(message: &str, provider_ids: &[String]) -> String {
    format!(
        "Listed provider ids: {}\nFollow-up: {}",
        provider_ids.join(", "),
        message
    )
}

pub fn yes_no_message(question: &str, answer: &str) -> String {
    format!("Question: {}\nAnswer: {}", question, answer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_followup_message_lists_ids() {
        let message = followup_message("assign 12345678", &["12345678".into(), "87654321".into()]);

        assert!(message.contains("12345678, 87654321"));
        assert!(message.ends_with("Follow-up: assign 12345678"));
    }
}
