//! Infrastructure layer - External service implementations

pub mod directory;
pub mod http;
pub mod llm;
pub mod logging;
pub mod observability;
pub mod services;
pub mod storage;
