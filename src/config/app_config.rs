use serde::Deserialize;

use crate::domain::flow::{DEFAULT_FILTERS_TEMPLATE, DEFAULT_SPECIALIST_SERVICE_PROMPT};
use crate::domain::{EngineConfig, FlowSettings};
use crate::infrastructure::directory::DirectoryConfig;
use crate::infrastructure::http::RetryPolicy;
use crate::infrastructure::llm::GatewayConfig;
use crate::infrastructure::observability::ObservabilityConfig;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
    #[serde(default)]
    pub llm: GatewayConfig,
    #[serde(default)]
    pub retry: RetryPolicy,
    #[serde(default)]
    pub directory: DirectoryConfig,
    #[serde(default)]
    pub conversation: ConversationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Flow tunables
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    pub default_radius_miles: u32,
    pub specialist_service_prompt: String,
    /// `{default_distance}` is replaced with the default radius
    pub specialist_filters_template: String,
    pub no_flow_filters_template: String,
    pub phrase_fixed_prompts: bool,
    pub max_steps_per_turn: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            default_radius_miles: 25,
            specialist_service_prompt: DEFAULT_SPECIALIST_SERVICE_PROMPT.to_string(),
            specialist_filters_template: DEFAULT_FILTERS_TEMPLATE.to_string(),
            no_flow_filters_template: DEFAULT_FILTERS_TEMPLATE.to_string(),
            phrase_fixed_prompts: true,
            max_steps_per_turn: EngineConfig::default().max_steps_per_turn,
        }
    }
}

impl ConversationConfig {
    pub fn flow_settings(&self) -> FlowSettings {
        FlowSettings {
            default_radius_miles: self.default_radius_miles,
            specialist_service_prompt: self.specialist_service_prompt.clone(),
            specialist_filters_template: self.specialist_filters_template.clone(),
            no_flow_filters_template: self.no_flow_filters_template.clone(),
            phrase_fixed_prompts: self.phrase_fixed_prompts,
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            max_steps_per_turn: self.max_steps_per_turn,
        }
    }
}

impl AppConfig {
    /// Layer `config/default`, `config/local` and `APP__*` environment variables
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
