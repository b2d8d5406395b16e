//! PCP Assist
//!
//! Resumable conversation service that helps a customer-service
//! representative reassign a member's primary care provider or find a
//! specialist. Each turn runs the flow graph until it completes or suspends
//! on a question, and the thread resumes from there on the next turn.

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use self::config::AppConfig;

use std::sync::Arc;

use api::state::AppState;
use domain::{build_flow_graph, Engine, FlowDeps, LlmProvider};
use infrastructure::directory::{RestMemberDirectory, RestPcpWriter, RestProviderDirectory};
use infrastructure::http::{HttpClient, RetryPolicy};
use infrastructure::llm::{GatewayLlmProvider, LlmClassifier};
use infrastructure::services::ConversationService;
use infrastructure::storage::InMemoryStateStore;
use tracing::info;

/// Create application state with default configuration
pub fn create_app_state() -> anyhow::Result<AppState> {
    create_app_state_with_config(&AppConfig::default())
}

/// Wire the LLM gateway, directory adapters and engine from configuration
pub fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let llm_client = HttpClient::new(config.llm.timeout(), config.retry.clone())?;
    let model = config.llm.model.clone();
    let provider: Arc<dyn LlmProvider> =
        Arc::new(GatewayLlmProvider::new(llm_client, config.llm.clone()));
    let classifier = Arc::new(LlmClassifier::new(provider, model));

    let directory_config = Arc::new(config.directory.clone());
    let directory_timeout = config.directory.timeout();
    let providers = Arc::new(RestProviderDirectory::new(
        HttpClient::new(directory_timeout, config.retry.clone())?,
        directory_config.clone(),
    ));
    let members = Arc::new(RestMemberDirectory::new(
        HttpClient::new(directory_timeout, config.retry.clone())?,
        directory_config.clone(),
    ));
    // PCP changes are not idempotent
    let pcp_writer = Arc::new(RestPcpWriter::new(
        HttpClient::new(directory_timeout, RetryPolicy::none())?,
        directory_config,
    ));

    let deps = FlowDeps {
        classifier,
        providers,
        members,
        pcp_writer,
        settings: Arc::new(config.conversation.flow_settings()),
    };
    let graph = Arc::new(build_flow_graph(&deps)?);
    info!(steps = graph.step_names().len(), "Flow graph assembled");

    let engine = Engine::with_config(
        graph,
        Arc::new(InMemoryStateStore::new()),
        config.conversation.engine_config(),
    );

    Ok(AppState::new(Arc::new(ConversationService::new(engine))))
}
