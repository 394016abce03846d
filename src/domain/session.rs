//! Session record and loop state
//!
//! A SessionRecord is created fresh for every run, threaded through each loop
//! step, and handed back to the caller once a terminal state is reached.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Feedback stored when the gate rejects without saying why
pub const EMPTY_CRITIQUE_PLACEHOLDER: &str = "The reviewer rejected the draft without giving feedback.";

/// States of the draft/critique loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopState {
    /// Waiting for the Draft Producer
    Drafting,
    /// Waiting for the Quality Gate
    Evaluating,
    /// The gate accepted the draft
    Accepted,
    /// The iteration cap was reached without acceptance
    Exhausted,
}

impl LoopState {
    /// Returns true if the loop is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoopState::Accepted | LoopState::Exhausted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LoopState::Drafting => "drafting",
            LoopState::Evaluating => "evaluating",
            LoopState::Accepted => "accepted",
            LoopState::Exhausted => "exhausted",
        }
    }
}

impl std::fmt::Display for LoopState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one Quality Gate evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub accepted: bool,
    /// Empty when accepted, the full critique otherwise
    pub feedback: String,
}

impl Verdict {
    pub fn accept() -> Self {
        Self {
            accepted: true,
            feedback: String::new(),
        }
    }

    pub fn reject(feedback: impl Into<String>) -> Self {
        Self {
            accepted: false,
            feedback: feedback.into(),
        }
    }
}

/// The mutable state of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Objective, fixed at creation
    pub task: String,

    /// Latest artifact from the Draft Producer
    pub draft: String,

    /// Critique from the latest rejection; empty after acceptance
    pub feedback: String,

    /// Number of Draft Producer invocations so far
    pub iteration_count: u32,

    /// Whether the latest evaluation accepted the draft
    pub accepted: bool,

    /// One entry per agent invocation, append-only
    pub log: Vec<String>,

    pub state: LoopState,

    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl SessionRecord {
    /// Create a fresh record in the Drafting state
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            draft: String::new(),
            feedback: String::new(),
            iteration_count: 0,
            accepted: false,
            log: Vec::new(),
            state: LoopState::Drafting,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Feedback to carry into the next draft, if the last evaluation rejected
    pub fn pending_feedback(&self) -> Option<&str> {
        (!self.feedback.is_empty()).then_some(self.feedback.as_str())
    }

    /// Prior draft, if one has been produced
    pub fn prior_draft(&self) -> Option<&str> {
        (!self.draft.is_empty() || self.iteration_count > 0).then_some(self.draft.as_str())
    }

    /// Record a Draft Producer result: replaces the draft, bumps the
    /// iteration count and logs which iteration produced or revised it.
    pub fn record_draft(&mut self, draft: String) {
        let revised = self.pending_feedback().is_some();
        self.iteration_count += 1;
        self.draft = draft;
        self.log.push(format!(
            "Iteration {}: draft {}.",
            self.iteration_count,
            if revised { "revised" } else { "generated" }
        ));
    }

    /// Record a Quality Gate result and log pass/fail
    pub fn record_verdict(&mut self, verdict: Verdict) {
        self.accepted = verdict.accepted;
        if verdict.accepted {
            self.feedback.clear();
            self.log.push("Quality gate: passed.".to_string());
        } else {
            self.feedback = if verdict.feedback.trim().is_empty() {
                EMPTY_CRITIQUE_PLACEHOLDER.to_string()
            } else {
                verdict.feedback
            };
            self.log.push("Quality gate: failed, requesting edits.".to_string());
        }
    }

    /// Move to a terminal state and stamp the finish time
    pub fn finish(&mut self, state: LoopState) {
        debug_assert!(state.is_terminal());
        self.state = state;
        self.finished_at = Some(Utc::now());
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_terminal()
    }

    /// Wall-clock time of the run, up to now if still running
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at.unwrap_or_else(Utc::now) - self.started_at
    }
}
