//! Evaluation engine.
//!
//! - [`DealEngine`]: inbound operations, queries and promotion scheduling
//! - [`Evaluator`]: pure promotion/consensus decisions
//! - [`matcher`]: alert matching on success transitions
//! - [`ModeController`]: per-engine mode and thresholds
//! - [`Statistics`]: aggregate outcome counts and timings

#[allow(clippy::module_inception)]
mod engine;
mod evaluator;
pub mod matcher;
mod mode;
mod stats;

pub use engine::DealEngine;
pub use evaluator::{Evaluator, Transition};
pub use mode::{Mode, ModeConfig, ModeController};
pub use stats::Statistics;
