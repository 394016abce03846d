//! Groq API client implementation
//!
//! Groq exposes an OpenAI-compatible chat completions endpoint. This module
//! implements the LlmClient trait against it.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::{Value, json};

use crate::error::{DraftgateError, Result};
use crate::llm::client::LlmClient;
use crate::llm::types::{CompletionRequest, CompletionResponse, StopReason, Usage};

/// Groq API base URL
pub const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";

/// Environment variable holding the API key
pub const GROQ_API_KEY_ENV: &str = "GROQ_API_KEY";

/// Default model to use
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// Default sampling temperature, kept low for determinism-leaning output
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Configuration for the Groq client
#[derive(Debug, Clone)]
pub struct GroqConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub base_url: Option<String>,
    /// Per-request timeout; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: None,
            base_url: None,
            timeout: None,
        }
    }
}

impl GroqConfig {
    /// Get the effective base URL
    pub fn effective_base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(GROQ_API_BASE)
    }
}

/// Groq API client
pub struct GroqClient {
    client: Client,
    api_key: String,
    config: GroqConfig,
}

impl GroqClient {
    /// Create a client reading the key from a named environment variable
    pub fn from_env(env_var: &str, config: GroqConfig) -> Result<Self> {
        let api_key = std::env::var(env_var)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| DraftgateError::MissingCredential {
                env_var: env_var.to_string(),
            })?;

        Self::with_api_key(api_key, config)
    }

    /// Create a client with an explicit API key
    pub fn with_api_key(api_key: String, config: GroqConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| DraftgateError::Llm(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            config,
        })
    }

    /// Build the API URL for chat completions
    fn api_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.effective_base_url().trim_end_matches('/')
        )
    }

    /// Build the request body for the chat completions API
    fn build_request(&self, request: &CompletionRequest) -> Value {
        let messages: Vec<Value> = request
            .messages
            .iter()
            .map(|m| json!({ "role": m.role.as_str(), "content": m.content }))
            .collect();

        let mut body = json!({
            "model": self.config.model,
            "messages": messages,
            "temperature": self.config.temperature,
        });

        if let Some(max_tokens) = self.config.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }

        body
    }

    /// Parse the API response into a CompletionResponse
    fn parse_response(&self, body: Value) -> Result<CompletionResponse> {
        let choice = body["choices"]
            .as_array()
            .and_then(|choices| choices.first())
            .ok_or_else(|| DraftgateError::Llm("Response contained no choices".to_string()))?;

        let stop_reason = StopReason::from_finish_reason(choice["finish_reason"].as_str());
        let content = choice["message"]["content"].as_str().unwrap_or("").to_string();

        let usage = match body.get("usage") {
            Some(u) => Usage::new(
                u["prompt_tokens"].as_u64().unwrap_or(0),
                u["completion_tokens"].as_u64().unwrap_or(0),
            ),
            None => Usage::default(),
        };

        Ok(CompletionResponse {
            content,
            stop_reason,
            usage,
        })
    }

    /// Send a request to the Groq API
    async fn send_request(&self, body: Value) -> Result<Value> {
        let response = self
            .client
            .post(self.api_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| DraftgateError::Llm(format!("Request failed: {}", e)))?;

        let status = response.status();

        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(DraftgateError::Llm(format!(
                "Rate limited, retry after {} seconds",
                retry_after
            )));
        }

        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(DraftgateError::Llm(format!("API error {}: {}", status, error_body)));
        }

        response
            .json()
            .await
            .map_err(|e| DraftgateError::Llm(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl LlmClient for GroqClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let body = self.build_request(&request);
        let response = self.send_request(body).await?;
        let parsed = self.parse_response(response)?;
        debug!(
            "groq completion: {} tokens ({} in / {} out), stop={:?}",
            parsed.usage.total(),
            parsed.usage.input_tokens,
            parsed.usage.output_tokens,
            parsed.stop_reason
        );
        Ok(parsed)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

impl std::fmt::Debug for GroqClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroqClient")
            .field("model", &self.config.model)
            .field("temperature", &self.config.temperature)
            .field("base_url", &self.config.effective_base_url())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GroqClient {
        GroqClient::with_api_key("test-key".to_string(), GroqConfig::default()).unwrap()
    }

    #[test]
    fn test_config_default() {
        let config = GroqConfig::default();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.temperature, DEFAULT_TEMPERATURE);
        assert!(config.max_tokens.is_none());
        assert!(config.timeout.is_none());
        assert_eq!(config.effective_base_url(), GROQ_API_BASE);
    }

    #[test]
    fn test_client_missing_env_var() {
        let result = GroqClient::from_env("DRAFTGATE_TEST_SURELY_UNSET_KEY", GroqConfig::default());
        match result {
            Err(DraftgateError::MissingCredential { env_var }) => {
                assert_eq!(env_var, "DRAFTGATE_TEST_SURELY_UNSET_KEY");
            }
            other => panic!("expected MissingCredential, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_api_url_respects_base_url() {
        let config = GroqConfig {
            base_url: Some("http://localhost:9999/v1/".to_string()),
            ..Default::default()
        };
        let client = GroqClient::with_api_key("k".to_string(), config).unwrap();
        assert_eq!(client.api_url(), "http://localhost:9999/v1/chat/completions");
        assert_eq!(
            GroqClient::with_api_key("k".to_string(), GroqConfig::default())
                .unwrap()
                .api_url(),
            "https://api.groq.com/openai/v1/chat/completions"
        );
    }

    #[test]
    fn test_build_request_single_prompt() {
        let body = client().build_request(&CompletionRequest::from_prompt("Hello"));

        assert_eq!(body["model"], DEFAULT_MODEL);
        let temperature = body["temperature"].as_f64().unwrap();
        assert!((temperature - 0.2).abs() < 1e-6);
        assert!(body.get("max_tokens").is_none());

        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[0]["content"], "Hello");
    }

    #[test]
    fn test_build_request_uses_configured_model_and_limits() {
        let config = GroqConfig {
            model: "llama-3.1-8b-instant".to_string(),
            temperature: 0.7,
            max_tokens: Some(512),
            ..Default::default()
        };
        let client = GroqClient::with_api_key("k".to_string(), config).unwrap();
        let request = CompletionRequest::from_prompt("Review this").with_user_message("Again");

        let body = client.build_request(&request);

        assert_eq!(body["model"], "llama-3.1-8b-instant");
        assert_eq!(body["max_tokens"], 512);
        let temperature = body["temperature"].as_f64().unwrap();
        assert!((temperature - 0.7).abs() < 1e-6);

        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[1]["content"], "Again");
    }

    #[test]
    fn test_parse_response_text() {
        let response = client()
            .parse_response(json!({
                "choices": [{
                    "index": 0,
                    "message": { "role": "assistant", "content": "READY" },
                    "finish_reason": "stop"
                }],
                "usage": { "prompt_tokens": 12, "completion_tokens": 3 }
            }))
            .unwrap();

        assert_eq!(response.content, "READY");
        assert_eq!(response.stop_reason, StopReason::EndTurn);
        assert_eq!(response.usage, Usage::new(12, 3));
    }

    #[test]
    fn test_parse_response_truncated() {
        let response = client()
            .parse_response(json!({
                "choices": [{
                    "message": { "role": "assistant", "content": "partial" },
                    "finish_reason": "length"
                }]
            }))
            .unwrap();

        assert_eq!(response.stop_reason, StopReason::MaxTokens);
        assert_eq!(response.usage, Usage::default());
    }

    #[test]
    fn test_parse_response_without_choices() {
        let result = client().parse_response(json!({ "choices": [] }));
        assert!(matches!(result, Err(DraftgateError::Llm(_))));
    }

    #[test]
    fn test_debug_impl_hides_key() {
        let debug_str = format!("{:?}", client());
        assert!(debug_str.contains("GroqClient"));
        assert!(debug_str.contains(DEFAULT_MODEL));
        assert!(!debug_str.contains("test-key"));
    }

    #[test]
    fn test_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<GroqClient>();
    }
}
