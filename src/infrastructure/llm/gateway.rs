//! Chat model behind an OAuth2-protected LLM gateway

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::token_cache::TokenCache;
use crate::domain::{DomainError, LlmProvider, LlmRequest, LlmResponse, Usage};
use crate::infrastructure::http::HttpClientTrait;
use crate::infrastructure::observability::{record_llm_request, LlmRequestMetricParams};

const PROVIDER_NAME: &str = "gateway";

/// Gateway connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub gateway_url: String,
    #[serde(default = "default_token_path")]
    pub token_path: String,
    /// Absolute URL, or a path joined onto `gateway_url`
    #[serde(default = "default_chat_endpoint")]
    pub chat_endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_qos")]
    pub qos: String,
    #[serde(default = "default_reasoning")]
    pub reasoning: bool,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_token_path() -> String {
    "/oauth2/token".to_string()
}

fn default_chat_endpoint() -> String {
    "/chat".to_string()
}

fn default_model() -> String {
    "default".to_string()
}

fn default_qos() -> String {
    "accurate".to_string()
}

fn default_reasoning() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            gateway_url: String::new(),
            token_path: default_token_path(),
            chat_endpoint: default_chat_endpoint(),
            model: default_model(),
            qos: default_qos(),
            reasoning: default_reasoning(),
            client_id: String::new(),
            client_secret: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl GatewayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn base_url(&self) -> &str {
        self.gateway_url.trim_end_matches('/')
    }

    pub fn token_url(&self) -> String {
        format!("{}{}", self.base_url(), self.token_path)
    }

    pub fn chat_url(&self) -> String {
        let endpoint = if self.chat_endpoint.starts_with("http://")
            || self.chat_endpoint.starts_with("https://")
        {
            self.chat_endpoint.clone()
        } else {
            format!("{}{}", self.base_url(), self.chat_endpoint)
        };

        format!("{}?qos={}&reasoning={}", endpoint, self.qos, self.reasoning)
    }
}

/// [`LlmProvider`] talking to the gateway with a cached client-credentials token
#[derive(Debug)]
pub struct GatewayLlmProvider<C: HttpClientTrait> {
    client: C,
    config: GatewayConfig,
    tokens: TokenCache,
}

impl<C: HttpClientTrait> GatewayLlmProvider<C> {
    pub fn new(client: C, config: GatewayConfig) -> Self {
        Self {
            client,
            config,
            tokens: TokenCache::new(),
        }
    }

    async fn bearer_token(&self) -> Result<String, DomainError> {
        self.tokens.get_or_fetch(|| self.fetch_token()).await
    }

    async fn fetch_token(&self) -> Result<(String, Option<u64>), DomainError> {
        if self.config.gateway_url.is_empty() {
            return Err(DomainError::configuration("LLM gateway URL is not set"));
        }
        if self.config.client_id.is_empty() || self.config.client_secret.is_empty() {
            return Err(DomainError::credential(
                "LLM gateway client id and secret are required",
            ));
        }

        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];

        let payload = self
            .client
            .post_form(&self.config.token_url(), Vec::new(), &form)
            .await?;

        let token = payload
            .get("access_token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| DomainError::credential("Token response has no access_token"))?;

        let expires_in = payload.get("expires_in").and_then(|v| {
            v.as_u64()
                .or_else(|| v.as_str().and_then(|s| s.parse().ok()))
        });

        Ok((token.to_string(), expires_in))
    }

    fn build_request(&self, request: &LlmRequest) -> Value {
        let messages: Vec<Value> = request
            .messages
            .iter()
            .filter(|m| m.content_text().is_some())
            .map(|m| json!({"role": m.role, "content": m.content}))
            .collect();

        json!({
            "messages": messages,
            "stream": false,
        })
    }

    async fn send(&self, body: &Value) -> Result<Value, DomainError> {
        let token = self.bearer_token().await?;
        let auth_header = format!("Bearer {}", token);
        let headers = vec![
            ("Authorization", auth_header.as_str()),
            ("Content-Type", "application/json"),
        ];

        self.client
            .post_json(&self.config.chat_url(), headers, body)
            .await
    }

    fn parse_response(payload: &Value) -> Result<LlmResponse, DomainError> {
        extract_content(payload)
            .map(LlmResponse::new)
            .ok_or_else(|| DomainError::unparseable(PROVIDER_NAME, "Empty response from gateway"))
    }
}

#[async_trait]
impl<C: HttpClientTrait> LlmProvider for GatewayLlmProvider<C> {
    async fn chat(&self, model: &str, request: LlmRequest) -> Result<LlmResponse, DomainError> {
        let body = self.build_request(&request);
        if body["messages"].as_array().is_none_or(|m| m.is_empty()) {
            return Err(DomainError::validation("No messages to send"));
        }

        let prompt_tokens = request.estimated_tokens();
        let start = Instant::now();

        let mut result = self.send(&body).await;
        if let Err(ref e) = result {
            if is_unauthorized(e) {
                tracing::warn!("Gateway rejected cached token, fetching a new one");
                self.tokens.invalidate().await;
                result = self.send(&body).await;
            }
        }

        let result = result.and_then(|payload| Self::parse_response(&payload));
        let completion_tokens = result
            .as_ref()
            .ok()
            .and_then(LlmResponse::content)
            .map(|c| c.split_whitespace().count() as u32)
            .unwrap_or(0);

        record_llm_request(LlmRequestMetricParams {
            provider: PROVIDER_NAME,
            model,
            duration: start.elapsed(),
            success: result.is_ok(),
            input_tokens: Some(prompt_tokens as u64),
            output_tokens: Some(completion_tokens as u64),
        });

        match result {
            Ok(response) => {
                tracing::debug!(
                    model = %model,
                    prompt_tokens,
                    completion_tokens,
                    latency_ms = start.elapsed().as_millis() as u64,
                    "Gateway chat completed"
                );
                Ok(response.with_usage(Usage::new(prompt_tokens, completion_tokens)))
            }
            Err(e) => {
                tracing::warn!(model = %model, error = %e, "Gateway chat failed");
                Err(e)
            }
        }
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

fn is_unauthorized(error: &DomainError) -> bool {
    matches!(error, DomainError::Provider { message, .. } if message.starts_with("HTTP 401"))
}

/// Assistant text from a gateway payload.
///
/// Looks at `message.content`, then `choices[0].message.content`, then a
/// top-level `content` or `text`. A list of parts is joined from their
/// `text` values. Blank content yields `None`.
pub fn extract_content(payload: &Value) -> Option<String> {
    let content = payload
        .pointer("/message/content")
        .filter(|v| !v.is_null())
        .or_else(|| payload.pointer("/choices/0/message/content").filter(|v| !v.is_null()))
        .or_else(|| payload.get("content").filter(|v| !v.is_null()))
        .or_else(|| payload.get("text").filter(|v| v.is_string()))?;

    let text = match content {
        Value::String(s) => s.clone(),
        Value::Array(parts) => parts
            .iter()
            .map(|part| match part {
                Value::String(s) => s.clone(),
                other => other
                    .get("text")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            })
            .collect(),
        _ => return None,
    };

    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::http::{HttpClient, MockHttpClient, RetryPolicy};
    use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base: &str) -> GatewayConfig {
        GatewayConfig {
            gateway_url: base.to_string(),
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            ..GatewayConfig::default()
        }
    }

    fn request() -> LlmRequest {
        LlmRequest::builder()
            .system("Classify the request.")
            .user("Assign PCP")
            .build()
    }

    #[test]
    fn test_chat_url() {
        let mut config = config("https://gw.example.com/");
        assert_eq!(
            config.chat_url(),
            "https://gw.example.com/chat?qos=accurate&reasoning=true"
        );

        config.chat_endpoint = "https://chat.example.com/v2/chat".to_string();
        config.reasoning = false;
        assert_eq!(
            config.chat_url(),
            "https://chat.example.com/v2/chat?qos=accurate&reasoning=false"
        );
        assert_eq!(config.token_url(), "https://gw.example.com/oauth2/token");
    }

    #[test]
    fn test_extract_content_variants() {
        assert_eq!(
            extract_content(&json!({"message": {"content": "  hi  "}})).as_deref(),
            Some("hi")
        );
        assert_eq!(
            extract_content(&json!({"choices": [{"message": {"content": "from choices"}}]}))
                .as_deref(),
            Some("from choices")
        );
        assert_eq!(
            extract_content(&json!({"text": "plain"})).as_deref(),
            Some("plain")
        );
        assert_eq!(
            extract_content(&json!({"message": {"content": [{"text": "a"}, {"text": "b"}]}}))
                .as_deref(),
            Some("ab")
        );
        assert_eq!(extract_content(&json!({"message": {"content": "   "}})), None);
        assert_eq!(extract_content(&json!({"other": 1})), None);
    }

    #[tokio::test]
    async fn test_token_is_fetched_once() {
        let client = MockHttpClient::new()
            .with_response(
                "https://gw/oauth2/token",
                json!({"access_token": "tok", "expires_in": 3600}),
            )
            .with_response(
                "https://gw/chat?qos=accurate&reasoning=true",
                json!({"message": {"content": "assign_pcp"}}),
            );
        let provider = GatewayLlmProvider::new(client, config("https://gw"));

        for _ in 0..2 {
            let response = provider.chat("default", request()).await.unwrap();
            assert_eq!(response.content(), Some("assign_pcp"));
        }

        let token_calls = provider
            .client
            .calls()
            .iter()
            .filter(|(url, _)| url.ends_with("/oauth2/token"))
            .count();
        assert_eq!(token_calls, 1);
    }

    #[tokio::test]
    async fn test_request_body_shape() {
        let client = MockHttpClient::new()
            .with_response("https://gw/oauth2/token", json!({"access_token": "tok"}))
            .with_response(
                "https://gw/chat?qos=accurate&reasoning=true",
                json!({"text": "ok"}),
            );
        let provider = GatewayLlmProvider::new(client, config("https://gw"));

        let response = provider.chat("default", request()).await.unwrap();

        assert_eq!(
            provider.client.last_body().unwrap(),
            json!({
                "messages": [
                    {"role": "system", "content": "Classify the request."},
                    {"role": "user", "content": "Assign PCP"}
                ],
                "stream": false
            })
        );
        assert_eq!(response.usage.prompt_tokens, 5);
    }

    #[tokio::test]
    async fn test_missing_credentials() {
        let mut config = config("https://gw");
        config.client_secret = String::new();
        let provider = GatewayLlmProvider::new(MockHttpClient::new(), config);

        let err = provider.chat("default", request()).await.unwrap_err();

        assert!(matches!(err, DomainError::Credential { .. }));
    }

    #[tokio::test]
    async fn test_empty_content_is_unparseable() {
        let client = MockHttpClient::new()
            .with_response("https://gw/oauth2/token", json!({"access_token": "tok"}))
            .with_response(
                "https://gw/chat?qos=accurate&reasoning=true",
                json!({"message": {"content": ""}}),
            );
        let provider = GatewayLlmProvider::new(client, config("https://gw"));

        let err = provider.chat("default", request()).await.unwrap_err();

        assert!(matches!(err, DomainError::Unparseable { .. }));
    }

    #[tokio::test]
    async fn test_gateway_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("client_id=client"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"access_token": "tok", "expires_in": 3600})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .and(query_param("qos", "accurate"))
            .and(query_param("reasoning", "true"))
            .and(header("authorization", "Bearer tok"))
            .and(body_json(json!({
                "messages": [
                    {"role": "system", "content": "Classify the request."},
                    {"role": "user", "content": "Assign PCP"}
                ],
                "stream": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"choices": [{"message": {"content": "{\"intent\": \"assign_pcp\"}"}}]}),
            ))
            .mount(&server)
            .await;

        let client = HttpClient::new(Duration::from_secs(5), RetryPolicy::none()).unwrap();
        let provider = GatewayLlmProvider::new(client, config(&server.uri()));

        let response = provider.chat("default", request()).await.unwrap();

        assert_eq!(response.content(), Some("{\"intent\": \"assign_pcp\"}"));
    }

    #[tokio::test]
    async fn test_unauthorized_refreshes_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "tok"})))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(401))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": "ok"})))
            .mount(&server)
            .await;

        let client = HttpClient::new(Duration::from_secs(5), RetryPolicy::none()).unwrap();
        let provider = GatewayLlmProvider::new(client, config(&server.uri()));

        let response = provider.chat("default", request()).await.unwrap();

        assert_eq!(response.content(), Some("ok"));
    }
}
