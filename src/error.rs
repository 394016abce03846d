//! Error types for draftgate
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in draftgate
#[derive(Debug, Error)]
pub enum DraftgateError {
    /// Required credential absent from the environment
    #[error("Missing API key: environment variable {env_var} not set")]
    MissingCredential { env_var: String },

    /// Invalid or unusable configuration
    #[error("Config error: {0}")]
    Config(String),

    /// Text-generation service error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Search service error
    #[error("Search error: {0}")]
    Search(String),

    /// Invalid state transition or operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DraftgateError {
    /// True when the failure came from an external collaborator during a run
    pub fn is_collaborator_failure(&self) -> bool {
        matches!(self, DraftgateError::Llm(_) | DraftgateError::Search(_))
    }
}

/// Result type alias for draftgate operations
pub type Result<T> = std::result::Result<T, DraftgateError>;
