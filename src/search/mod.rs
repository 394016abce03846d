//! Web search collaborators used to seed the first draft.
//!
//! A search returns one block of text; callers get no structured results,
//! ranking, or pagination.

pub mod duckduckgo;
pub mod tavily;

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{DraftgateError, Result};

pub use duckduckgo::DuckDuckGoSearch;
pub use tavily::TavilySearch;

/// Text returned when a provider finds nothing
pub const NO_RESULTS: &str = "No results found";

/// Default cap on entries folded into the text block
pub const DEFAULT_MAX_RESULTS: usize = 5;

/// A single search hit, before flattening
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Trait for pluggable search providers
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Provider name for display
    fn name(&self) -> &str;

    /// Run a query and return the retrieved material as text
    async fn search(&self, query: &str) -> Result<String>;
}

/// Flatten hits into a numbered text block
pub fn format_hits(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return NO_RESULTS.to_string();
    }

    hits.iter()
        .enumerate()
        .map(|(i, hit)| {
            let mut entry = format!("{}. {}\n", i + 1, hit.title);
            if !hit.url.is_empty() {
                entry.push_str(&format!("   {}\n", hit.url));
            }
            entry.push_str(&format!("   {}\n", hit.snippet));
            entry
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the HTTP client shared by the providers
pub(crate) fn http_client(timeout: Option<Duration>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder().user_agent(concat!(
        env!("CARGO_PKG_NAME"),
        "/",
        env!("CARGO_PKG_VERSION")
    ));
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| DraftgateError::Search(format!("Failed to create HTTP client: {}", e)))
}

/// Search stub returning canned material (or a canned failure) and
/// recording queries
#[derive(Debug, Default)]
pub struct StaticSearch {
    material: String,
    failure: Option<String>,
    queries: Mutex<Vec<String>>,
}

impl StaticSearch {
    pub fn new(material: impl Into<String>) -> Self {
        Self {
            material: material.into(),
            failure: None,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// A stub whose every search fails with `message`
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Queries received so far
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SearchClient for StaticSearch {
    fn name(&self) -> &str {
        "static"
    }

    async fn search(&self, query: &str) -> Result<String> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.to_string());
        }
        match &self.failure {
            Some(message) => Err(DraftgateError::Search(message.clone())),
            None => Ok(self.material.clone()),
        }
    }
}
