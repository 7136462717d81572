//! # DealWatch - Deal Aggregation Engine
//!
//! A classroom demonstration contrasting two ways of deciding which crowd
//! submitted deals are real, and how quickly personalized price alerts fire
//! as a result.
//!
//! ## Architecture
//!
//! - **Engine**: mode-driven promotion/consensus evaluation and alert matching
//! - **State**: in-memory registries for users, deals and alerts
//! - **Events**: outbound events and fire-and-forget subscriber delivery
//! - **Config**: configuration management
//! - **App**: side-by-side demo of both models

pub mod app;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod state;

pub use app::{App, ScenarioReport};
pub use config::Config;
pub use engine::{DealEngine, Mode, ModeConfig, Statistics};
pub use error::{Error, Result};
pub use events::{Event, Notifier, Subscriber};
