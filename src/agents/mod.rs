//! The two agent roles: a drafter and a reviewer.

mod drafter;
mod gate;

pub use drafter::DraftProducer;
pub use gate::QualityGate;
