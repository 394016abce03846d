//! Loop runner module - drives the draft/critique cycle.
//!
//! This module provides:
//! - LoopRunner for executing one run
//! - LoopRunnerConfig for the iteration cap

mod loop_runner;

pub use loop_runner::{DEFAULT_MAX_ITERATIONS, LoopRunner, LoopRunnerConfig};
