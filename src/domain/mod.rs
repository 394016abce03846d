//! Domain types for a single draft/critique run

mod session;

pub use session::{EMPTY_CRITIQUE_PLACEHOLDER, LoopState, SessionRecord, Verdict};
