//! Quality Gate: an LLM reviewer that accepts a draft or explains what is
//! wrong with it.
//!
//! Acceptance is a case-insensitive substring match for the acceptance token
//! anywhere in the reply. A critique that merely mentions the token (or a
//! word containing it) counts as acceptance.

use std::sync::Arc;

use log::info;

use crate::domain::{SessionRecord, Verdict};
use crate::error::Result;
use crate::llm::{CompletionRequest, LlmClient};
use crate::prompt::{DEFAULT_ACCEPTANCE_TOKEN, evaluation_prompt};

pub struct QualityGate {
    llm: Arc<dyn LlmClient>,
    acceptance_token: String,
}

impl QualityGate {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            acceptance_token: DEFAULT_ACCEPTANCE_TOKEN.to_string(),
        }
    }

    /// Set the token whose presence signals acceptance
    pub fn with_acceptance_token(mut self, token: impl Into<String>) -> Self {
        self.acceptance_token = token.into();
        self
    }

    /// Judge a reply text against the acceptance token
    pub fn is_accepted(&self, reply: &str) -> bool {
        reply
            .to_uppercase()
            .contains(&self.acceptance_token.to_uppercase())
    }

    /// Evaluate a draft. The full reply becomes the feedback on rejection.
    pub async fn evaluate(&self, draft: &str) -> Result<Verdict> {
        let prompt = evaluation_prompt(draft, &self.acceptance_token);
        let response = self.llm.complete(CompletionRequest::from_prompt(prompt)).await?;

        if self.is_accepted(&response.content) {
            Ok(Verdict::accept())
        } else {
            Ok(Verdict::reject(response.content))
        }
    }

    /// Run one evaluation step against the session and record the verdict.
    pub async fn review(&self, session: &mut SessionRecord) -> Result<()> {
        let verdict = self.evaluate(&session.draft).await?;
        info!(
            "Iteration {}: quality gate {}",
            session.iteration_count,
            if verdict.accepted { "passed" } else { "failed" }
        );
        session.record_verdict(verdict);
        Ok(())
    }
}
