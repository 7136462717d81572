//! Outbound events for DealWatch.
//!
//! Every state change the engine makes is published as an [`Event`]
//! through the [`Notifier`]. Events for the same deal are published in the
//! order the changes were applied.

mod notifier;

pub use notifier::{ChannelSubscriber, LogSubscriber, Notifier, Subscriber};

#[cfg(test)]
pub use notifier::MockSubscriber;

use crate::engine::ModeConfig;
use crate::state::Deal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Events emitted by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Event {
    /// A deal was submitted.
    DealCreated { deal: Deal },
    /// A tally changed without a status transition.
    DealUpdated { deal: Deal },
    /// Centralized promotion succeeded.
    DealPromoted { deal: Deal },
    /// Decentralized consensus marked the deal valid.
    DealVerified { deal: Deal },
    /// Decentralized consensus marked the deal invalid.
    DealRejected { deal: Deal },
    /// A standing alert matched a deal.
    AlertTriggered(AlertTrigger),
    /// The operating mode changed.
    ConfigUpdated { config: ModeConfig },
}

impl Event {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::DealCreated { .. } => "deal-created",
            Self::DealUpdated { .. } => "deal-updated",
            Self::DealPromoted { .. } => "deal-promoted",
            Self::DealVerified { .. } => "deal-verified",
            Self::DealRejected { .. } => "deal-rejected",
            Self::AlertTriggered(_) => "alert-triggered",
            Self::ConfigUpdated { .. } => "config-updated",
        }
    }

    /// The deal this event concerns, if any.
    pub fn deal(&self) -> Option<&Deal> {
        match self {
            Self::DealCreated { deal }
            | Self::DealUpdated { deal }
            | Self::DealPromoted { deal }
            | Self::DealVerified { deal }
            | Self::DealRejected { deal } => Some(deal),
            Self::AlertTriggered(trigger) => Some(&trigger.deal),
            Self::ConfigUpdated { .. } => None,
        }
    }

    /// Serialize for a transport.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Payload of an `alert-triggered` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertTrigger {
    /// Alert that fired.
    pub alert_id: String,
    /// Owner of the alert.
    pub user_id: String,
    /// Deal snapshot at evaluation time.
    pub deal: Deal,
    /// Milliseconds from deal submission to this trigger.
    pub latency_ms: i64,
    /// When the alert fired.
    pub triggered_at: DateTime<Utc>,
}
