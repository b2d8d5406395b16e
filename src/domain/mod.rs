//! Domain layer - Core business logic and entities

pub mod conversation;
pub mod directory;
pub mod error;
pub mod flow;
pub mod intent;
pub mod llm;
pub mod workflow;

pub use conversation::{ConversationState, Flow, KnowsProvider, ResponseType};
pub use directory::{
    MemberDirectory, PcpWriter, ProviderAddress, ProviderDirectory, ProviderQuery, ProviderRecord,
};
pub use error::DomainError;
pub use flow::{build_flow_graph, FlowDeps, FlowSettings, ResponseMapper, TurnReply};
pub use intent::{Classifier, FollowupAction, MenuIntent, YesNo};
pub use llm::{LlmProvider, LlmRequest, LlmResponse, Message, Usage};
pub use workflow::{
    Engine, EngineConfig, EngineOutcome, StateStore, TurnInput, TurnResult, WorkflowError,
};
