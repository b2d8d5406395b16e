//! Language model gateway client and the classifier built on it

mod classifier;
mod gateway;
mod prompts;
mod token_cache;

pub use classifier::{extract_json_object, LlmClassifier};
pub use gateway::{extract_content, GatewayConfig, GatewayLlmProvider};
pub use token_cache::TokenCache;
