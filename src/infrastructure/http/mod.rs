//! Outbound HTTP with bounded retries

mod client;
mod retry;

pub use client::{HttpClient, HttpClientTrait};
pub use retry::RetryPolicy;

#[cfg(test)]
pub use client::mock::MockHttpClient;
