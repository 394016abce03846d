//! Draftgate - a two-agent draft/critique refinement loop
//!
//! A drafting agent writes a report from web search results; a reviewing
//! agent either accepts it or sends back feedback. The loop repeats until the
//! report is accepted or the iteration cap is reached, and the result is
//! served through a small web UI.

pub mod agents;
pub mod domain;
pub mod error;
pub mod llm;
pub mod prompt;
pub mod runner;
pub mod search;
pub mod web;

pub use error::{DraftgateError, Result};
