/// Placeholder replaced with the default search radius in filter prompts
pub const DEFAULT_DISTANCE_TOKEN: &str = "{default_distance}";

pub const DEFAULT_SPECIALIST_SERVICE_PROMPT: &str = "What type of specialist or service are you looking for? (e.g., Cardiology, Dermatology, Physical Therapy)";

pub const DEFAULT_FILTERS_TEMPLATE: &str = "Please provide the ZIP code to search around. Optionally include a search radius (default {default_distance} miles), preferred language, or provider gender.";

/// Tunables for the conversation flows
#[derive(Debug, Clone, PartialEq)]
pub struct FlowSettings {
    pub default_radius_miles: u32,
    /// Sent verbatim
    pub specialist_service_prompt: String,
    pub specialist_filters_template: String,
    pub no_flow_filters_template: String,
    /// Ask the model to phrase fixed prompts; its text is never shown
    pub phrase_fixed_prompts: bool,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            default_radius_miles: 25,
            specialist_service_prompt: DEFAULT_SPECIALIST_SERVICE_PROMPT.to_string(),
            specialist_filters_template: DEFAULT_FILTERS_TEMPLATE.to_string(),
            no_flow_filters_template: DEFAULT_FILTERS_TEMPLATE.to_string(),
            phrase_fixed_prompts: true,
        }
    }
}

impl FlowSettings {
    pub fn specialist_filters_prompt(&self) -> String {
        render_distance(&self.specialist_filters_template, self.default_radius_miles)
    }

    pub fn no_flow_filters_prompt(&self) -> String {
        render_distance(&self.no_flow_filters_template, self.default_radius_miles)
    }
}

/// Substitute the default radius; no other placeholder is touched
pub fn render_distance(template: &str, radius_miles: u32) -> String {
    template.replace(DEFAULT_DISTANCE_TOKEN, &radius_miles.to_string())
}
