//! Tavily search provider (requires API key)

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::{Value, json};

use super::{SearchClient, SearchHit, format_hits, http_client};
use crate::error::{DraftgateError, Result};

const TAVILY_API_URL: &str = "https://api.tavily.com/search";

/// Environment variable holding the Tavily key
pub const TAVILY_API_KEY_ENV: &str = "TAVILY_API_KEY";

pub struct TavilySearch {
    client: Client,
    api_key: String,
    max_results: usize,
}

impl TavilySearch {
    pub fn new(api_key: impl Into<String>, max_results: usize, timeout: Option<Duration>) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            api_key: api_key.into(),
            max_results,
        })
    }

    /// Read the key from a named environment variable
    pub fn from_env(env_var: &str, max_results: usize, timeout: Option<Duration>) -> Result<Self> {
        let api_key = std::env::var(env_var)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| DraftgateError::MissingCredential {
                env_var: env_var.to_string(),
            })?;
        Self::new(api_key, max_results, timeout)
    }

    fn build_body(&self, query: &str) -> Value {
        json!({
            "api_key": self.api_key,
            "query": query,
            "max_results": self.max_results,
            "search_depth": "basic"
        })
    }
}

/// Extract hits from a Tavily response body
pub fn parse_results(data: &Value) -> Vec<SearchHit> {
    data["results"]
        .as_array()
        .into_iter()
        .flatten()
        .map(|r| SearchHit {
            title: r["title"].as_str().unwrap_or("(no title)").to_string(),
            url: r["url"].as_str().unwrap_or("").to_string(),
            snippet: r["content"].as_str().unwrap_or("").to_string(),
        })
        .collect()
}

#[async_trait]
impl SearchClient for TavilySearch {
    fn name(&self) -> &str {
        "Tavily"
    }

    async fn search(&self, query: &str) -> Result<String> {
        let response = self
            .client
            .post(TAVILY_API_URL)
            .json(&self.build_body(query))
            .send()
            .await
            .map_err(|e| DraftgateError::Search(format!("Tavily request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(DraftgateError::Search(format!(
                "Tavily API error {}: {}",
                status, error_text
            )));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| DraftgateError::Search(format!("Failed to parse Tavily response: {}", e)))?;

        let hits = parse_results(&data);
        debug!("Tavily returned {} hits for {:?}", hits.len(), query);
        Ok(format_hits(&hits))
    }
}
