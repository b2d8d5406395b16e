//! Conversation state storage

mod in_memory;

pub use in_memory::InMemoryStateStore;
