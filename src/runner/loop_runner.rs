//! Loop runner implementation - alternates drafting and review.
//!
//! The LoopRunner drives a SessionRecord through the Drafting/Evaluating
//! states until the Quality Gate accepts the draft or the iteration cap is
//! reached.

use std::sync::Arc;

use log::{info, warn};

use crate::agents::{DraftProducer, QualityGate};
use crate::domain::{LoopState, SessionRecord};
use crate::error::{DraftgateError, Result};
use crate::llm::LlmClient;
use crate::search::SearchClient;

/// Default cap on Draft Producer invocations per run
pub const DEFAULT_MAX_ITERATIONS: u32 = 3;

/// Configuration for the LoopRunner.
#[derive(Debug, Clone)]
pub struct LoopRunnerConfig {
    /// Maximum number of drafts per run
    pub max_iterations: u32,
}

impl Default for LoopRunnerConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// LoopRunner executes one draft/critique run.
///
/// Each cycle:
/// 1. Draft Producer writes (or revises) the draft
/// 2. Quality Gate accepts it or returns feedback
/// 3. On rejection below the cap, the feedback seeds the next draft
///
/// Collaborator errors abort the run and are returned as-is.
pub struct LoopRunner {
    drafter: DraftProducer,
    gate: QualityGate,
    config: LoopRunnerConfig,
}

impl LoopRunner {
    /// Create a runner from ready-made agents.
    pub fn new(drafter: DraftProducer, gate: QualityGate, config: LoopRunnerConfig) -> Self {
        Self {
            drafter,
            gate,
            config,
        }
    }

    /// Create a runner where both agents share one LLM client.
    pub fn from_clients(
        llm: Arc<dyn LlmClient>,
        search: Arc<dyn SearchClient>,
        config: LoopRunnerConfig,
    ) -> Self {
        Self::new(
            DraftProducer::new(llm.clone(), search),
            QualityGate::new(llm),
            config,
        )
    }

    /// Replace the reviewer, e.g. to change its acceptance token
    pub fn with_gate(mut self, gate: QualityGate) -> Self {
        self.gate = gate;
        self
    }

    /// Run the loop for `task` until a terminal state is reached.
    pub async fn run(&self, task: impl Into<String>) -> Result<SessionRecord> {
        let mut session = SessionRecord::new(task);
        info!("Starting run for task: {:?}", session.task);

        while !session.is_finished() {
            self.step(&mut session).await?;
        }

        info!(
            "Run finished: state={} iterations={} elapsed={}ms",
            session.state,
            session.iteration_count,
            session.elapsed().num_milliseconds()
        );
        Ok(session)
    }

    /// Perform exactly one state transition and return the new state.
    pub async fn step(&self, session: &mut SessionRecord) -> Result<LoopState> {
        match session.state {
            LoopState::Drafting => {
                self.drafter.draft(session).await?;
                session.state = LoopState::Evaluating;
            }
            LoopState::Evaluating => {
                self.gate.review(session).await?;
                if session.accepted {
                    session.finish(LoopState::Accepted);
                } else if session.iteration_count >= self.config.max_iterations {
                    warn!(
                        "Iteration cap of {} reached without acceptance",
                        self.config.max_iterations
                    );
                    session.finish(LoopState::Exhausted);
                } else {
                    session.state = LoopState::Drafting;
                }
            }
            state @ (LoopState::Accepted | LoopState::Exhausted) => {
                return Err(DraftgateError::InvalidState(format!(
                    "cannot step a run that is already {}",
                    state
                )));
            }
        }
        Ok(session.state)
    }
}
