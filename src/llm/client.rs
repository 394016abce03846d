//! LLM client trait and a scripted mock implementation

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{DraftgateError, Result};
use crate::llm::types::{CompletionRequest, CompletionResponse};

/// Stateless LLM client - each call is independent (fresh context)
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Single completion request (blocking until complete)
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Model identifier used for requests
    fn model(&self) -> &str;
}

/// Mock client replaying a fixed script of responses, in order.
///
/// Every request is recorded so tests can inspect the prompts that were sent.
/// Running past the end of the script is an error.
#[derive(Debug, Default)]
pub struct MockLlmClient {
    script: Mutex<VecDeque<Result<CompletionResponse>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a sequence of text responses
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mock = Self::new();
        for response in responses {
            mock.push_response(response);
        }
        mock
    }

    /// Append a text response to the script
    pub fn push_response(&self, content: impl Into<String>) {
        self.push_completion(CompletionResponse::text(content));
    }

    /// Append a full response, e.g. one with a non-default stop reason
    pub fn push_completion(&self, response: CompletionResponse) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(Ok(response));
        }
    }

    /// Append a failure to the script
    pub fn push_error(&self, error: DraftgateError) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(Err(error));
        }
    }

    /// All requests received so far
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// User prompts received so far, in order
    pub fn prompts(&self) -> Vec<String> {
        self.requests()
            .iter()
            .filter_map(|r| r.last_user_message().map(str::to_string))
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        let next = self
            .script
            .lock()
            .map_err(|_| DraftgateError::Llm("mock script lock poisoned".to_string()))?
            .pop_front();

        next.unwrap_or_else(|| Err(DraftgateError::Llm("mock script exhausted".to_string())))
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}
