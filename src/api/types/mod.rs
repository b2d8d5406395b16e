//! API request/response types

pub mod conversation;
pub mod error;
pub mod json;

pub use conversation::{ThreadDeletedResponse, TurnRequestBody};
pub use error::{ApiError, ApiErrorResponse, ApiErrorType};
pub use json::Json;
