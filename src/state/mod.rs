//! State management for DealWatch.
//!
//! Registries for users, deals and alerts. They only validate and record;
//! status decisions belong to the evaluator in [`crate::engine`].

mod alert_state;
mod deal_state;
mod user_state;

pub use alert_state::{Alert, AlertDraft, AlertState};
pub use deal_state::{
    DEFAULT_CATEGORY, Deal, DealDraft, DealFilter, DealState, DealStatus, Verdict, Verification,
};
pub use user_state::{DEFAULT_REPUTATION, User, UserState};

/// The in-memory store backing one engine.
#[derive(Debug, Default)]
pub struct Store {
    /// Registered users.
    pub users: UserState,
    /// Submitted deals.
    pub deals: DealState,
    /// Standing alerts.
    pub alerts: AlertState,
}

impl Store {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}
