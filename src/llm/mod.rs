//! LLM Client Layer - Groq chat-completion integration
//!
//! This module provides:
//! - Message types for LLM communication
//! - LlmClient trait for API abstraction
//! - GroqClient implementation
//! - MockLlmClient for scripted runs

pub mod client;
pub mod groq;
pub mod types;

pub use client::{LlmClient, MockLlmClient};
pub use groq::{GroqClient, GroqConfig};
pub use types::{CompletionRequest, CompletionResponse, Message, Role, StopReason, Usage};
