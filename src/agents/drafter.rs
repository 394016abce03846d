//! Draft Producer: writes the first draft from search results, then revises
//! it against reviewer feedback.

use std::sync::Arc;

use log::{debug, info, warn};

use crate::domain::SessionRecord;
use crate::error::Result;
use crate::llm::{CompletionRequest, LlmClient};
use crate::prompt::{research_prompt, revision_prompt};
use crate::search::SearchClient;

pub struct DraftProducer {
    llm: Arc<dyn LlmClient>,
    search: Arc<dyn SearchClient>,
}

impl DraftProducer {
    pub fn new(llm: Arc<dyn LlmClient>, search: Arc<dyn SearchClient>) -> Self {
        Self { llm, search }
    }

    /// Produce a draft for `task`.
    ///
    /// Without feedback this searches for the task and asks for a full
    /// report; with feedback it asks for a revision of `prior_draft`. The
    /// generated text is returned verbatim and any collaborator error is
    /// passed straight back.
    pub async fn produce(
        &self,
        task: &str,
        prior_draft: Option<&str>,
        feedback: Option<&str>,
    ) -> Result<String> {
        let prompt = match feedback {
            Some(feedback) => revision_prompt(prior_draft.unwrap_or_default(), feedback),
            None => {
                let material = self.search.search(task).await?;
                debug!(
                    "{} returned {} bytes of material",
                    self.search.name(),
                    material.len()
                );
                research_prompt(task, &material)
            }
        };

        let response = self.llm.complete(CompletionRequest::from_prompt(prompt)).await?;
        if response.stop_reason.is_truncated() {
            warn!("Draft for {:?} hit the token limit and may be cut short", task);
        }
        Ok(response.content)
    }

    /// Run one drafting step against the session and record the result.
    pub async fn draft(&self, session: &mut SessionRecord) -> Result<()> {
        let text = self
            .produce(&session.task, session.prior_draft(), session.pending_feedback())
            .await?;
        session.record_draft(text);
        info!("Iteration {}: draft ready", session.iteration_count);
        Ok(())
    }
}
