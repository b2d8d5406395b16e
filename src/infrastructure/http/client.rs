use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use super::RetryPolicy;
use crate::domain::DomainError;

/// JSON-over-HTTP calls (mockable)
#[async_trait]
pub trait HttpClientTrait: Send + Sync + std::fmt::Debug {
    async fn post_json(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, DomainError>;

    async fn post_form(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        form: &[(&str, &str)],
    ) -> Result<serde_json::Value, DomainError>;
}

/// reqwest client retrying connection failures and 429/5xx answers
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl HttpClient {
    pub fn new(timeout: Duration, retry: RetryPolicy) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                DomainError::configuration(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self { client, retry })
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    async fn send_once(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<serde_json::Value, DomainError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() || e.is_connect() {
                DomainError::transient("http", format!("Request failed: {}", e))
            } else {
                DomainError::provider("http", format!("Request failed: {}", e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let message = format!("HTTP {}: {}", status, error_body);
            return Err(if RetryPolicy::is_retryable_status(status.as_u16()) {
                DomainError::transient("http", message)
            } else {
                DomainError::provider("http", message)
            });
        }

        let text = response.text().await.map_err(|e| {
            DomainError::provider("http", format!("Failed to read response: {}", e))
        })?;

        if text.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| {
            DomainError::unparseable("http", format!("Failed to parse response: {}", e))
        })
    }

    async fn send_with_retry<F>(&self, url: &str, build: F) -> Result<serde_json::Value, DomainError>
    where
        F: Fn() -> reqwest::RequestBuilder + Send + Sync,
    {
        let mut attempt = 0;

        loop {
            match self.send_once(build()).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    warn!(
                        url = %url,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying request"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl HttpClientTrait for HttpClient {
    async fn post_json(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, DomainError> {
        self.send_with_retry(url, || {
            let mut request = self.client.post(url);
            for (key, value) in &headers {
                request = request.header(*key, *value);
            }
            request.json(body)
        })
        .await
    }

    async fn post_form(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        form: &[(&str, &str)],
    ) -> Result<serde_json::Value, DomainError> {
        self.send_with_retry(url, || {
            let mut request = self.client.post(url);
            for (key, value) in &headers {
                request = request.header(*key, *value);
            }
            request.form(form)
        })
        .await
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::RwLock;

    /// Canned responses keyed by URL; every call is recorded
    #[derive(Debug, Default)]
    pub struct MockHttpClient {
        responses: RwLock<HashMap<String, serde_json::Value>>,
        errors: RwLock<HashMap<String, DomainError>>,
        calls: RwLock<Vec<(String, serde_json::Value)>>,
    }

    impl MockHttpClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_response(self, url: impl Into<String>, response: serde_json::Value) -> Self {
            self.responses.write().unwrap().insert(url.into(), response);
            self
        }

        pub fn with_error(self, url: impl Into<String>, error: DomainError) -> Self {
            self.errors.write().unwrap().insert(url.into(), error);
            self
        }

        pub fn calls(&self) -> Vec<(String, serde_json::Value)> {
            self.calls.read().unwrap().clone()
        }

        pub fn last_body(&self) -> Option<serde_json::Value> {
            self.calls.read().unwrap().last().map(|(_, body)| body.clone())
        }

        fn respond(&self, url: &str, body: serde_json::Value) -> Result<serde_json::Value, DomainError> {
            self.calls.write().unwrap().push((url.to_string(), body));

            if let Some(error) = self.errors.read().unwrap().get(url) {
                return Err(error.clone());
            }

            self.responses
                .read()
                .unwrap()
                .get(url)
                .cloned()
                .ok_or_else(|| DomainError::provider("mock", format!("No mock response for {}", url)))
        }
    }

    #[async_trait]
    impl HttpClientTrait for MockHttpClient {
        async fn post_json(
            &self,
            url: &str,
            _headers: Vec<(&str, &str)>,
            body: &serde_json::Value,
        ) -> Result<serde_json::Value, DomainError> {
            self.respond(url, body.clone())
        }

        async fn post_form(
            &self,
            url: &str,
            _headers: Vec<(&str, &str)>,
            form: &[(&str, &str)],
        ) -> Result<serde_json::Value, DomainError> {
            let body = form
                .iter()
                .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
                .collect::<serde_json::Map<_, _>>();
            self.respond(url, serde_json::Value::Object(body))
        }
    }
}
