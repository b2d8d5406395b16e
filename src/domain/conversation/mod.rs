//! Conversation state model

mod state;

pub use state::{CallType, ConversationState, Flow, KnowsProvider, ResponseType};
