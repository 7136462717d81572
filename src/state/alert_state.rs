//! Alert-related state.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// A user's standing alert criteria.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    /// Alert ID.
    pub id: String,
    /// Owning user.
    pub user_id: String,
    /// Keyword phrase, matched as a case-insensitive substring.
    pub keywords: String,
    /// Highest acceptable price.
    pub max_price: Decimal,
    /// Verifications a deal must carry before the alert fires.
    pub min_verifications: u32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Deals this alert already fired for.
    pub triggered: BTreeSet<String>,
}

impl Alert {
    /// Check whether this alert already fired for a deal.
    pub fn has_triggered(&self, deal_id: &str) -> bool {
        self.triggered.contains(deal_id)
    }
}

/// Creation payload for an alert.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertDraft {
    pub user_id: String,
    pub keywords: String,
    pub max_price: Option<Decimal>,
    #[serde(default)]
    pub min_verifications: u32,
}

impl AlertDraft {
    /// Check required fields.
    pub fn validate(&self) -> crate::Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(crate::Error::validation("Alert owner is required"));
        }
        if self.keywords.trim().is_empty() {
            return Err(crate::Error::validation("Alert keywords are required"));
        }
        match self.max_price {
            None => Err(crate::Error::validation("Alert max price is required")),
            Some(price) if price <= Decimal::ZERO => Err(crate::Error::validation(format!(
                "Alert max price must be positive, got {}",
                price
            ))),
            Some(_) => Ok(()),
        }
    }
}

/// State for alert-related data.
#[derive(Debug, Default)]
pub struct AlertState {
    /// Alerts indexed by ID.
    alerts: HashMap<String, Alert>,
    /// Alert IDs in creation order.
    order: Vec<String>,
}

impl AlertState {
    /// Create an alert from a validated draft.
    pub fn insert(&mut self, draft: AlertDraft, now: DateTime<Utc>) -> crate::Result<Alert> {
        draft.validate()?;
        let max_price = draft
            .max_price
            .ok_or_else(|| crate::Error::validation("Alert max price is required"))?;

        let alert = Alert {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: draft.user_id,
            keywords: draft.keywords.trim().to_string(),
            max_price,
            min_verifications: draft.min_verifications,
            created_at: now,
            triggered: BTreeSet::new(),
        };

        self.order.push(alert.id.clone());
        self.alerts.insert(alert.id.clone(), alert.clone());
        Ok(alert)
    }

    /// Delete an alert.
    pub fn remove(&mut self, alert_id: &str) -> crate::Result<Alert> {
        let alert = self
            .alerts
            .remove(alert_id)
            .ok_or_else(|| crate::Error::not_found(format!("Alert '{}' not found", alert_id)))?;
        self.order.retain(|id| id != alert_id);
        Ok(alert)
    }

    /// Get an alert by ID.
    pub fn get(&self, alert_id: &str) -> Option<&Alert> {
        self.alerts.get(alert_id)
    }

    /// Alerts owned by a user, oldest first.
    pub fn for_user(&self, user_id: &str) -> Vec<&Alert> {
        self.iter().filter(|a| a.user_id == user_id).collect()
    }

    /// All alerts in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Alert> {
        self.order.iter().filter_map(|id| self.alerts.get(id))
    }

    /// All alerts in creation order, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Alert> {
        let alerts = &mut self.alerts;
        let mut ordered: Vec<&mut Alert> = alerts.values_mut().collect();
        let position: HashMap<&str, usize> = self
            .order
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();
        ordered.sort_by_key(|a| position.get(a.id.as_str()).copied().unwrap_or(usize::MAX));
        ordered.into_iter()
    }

    /// Total number of (alert, deal) triggers recorded.
    pub fn trigger_count(&self) -> usize {
        self.alerts.values().map(|a| a.triggered.len()).sum()
    }

    /// Number of alerts.
    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    /// Check if there are no alerts.
    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }
}
