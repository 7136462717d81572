//! Matches standing alerts against deals that just succeeded.

use crate::events::AlertTrigger;
use crate::state::{Alert, AlertState, Deal};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Check an alert's criteria against a deal.
///
/// The keyword phrase must appear in the title or the category (ignoring
/// case), the price must not exceed the alert's ceiling, and the deal must
/// carry at least the required number of verifications.
pub fn matches(alert: &Alert, deal: &Deal) -> bool {
    let keywords = alert.keywords.to_lowercase();
    let text_match = deal.title.to_lowercase().contains(&keywords)
        || deal.category.to_lowercase().contains(&keywords);

    text_match
        && deal.price <= alert.max_price
        && deal.verification_count() >= alert.min_verifications
}

/// Fire every alert that matches the deal and has not fired for it yet.
///
/// Only promoted and verified deals are considered. Latency is measured from
/// deal submission to `now` and never reported below zero.
pub fn evaluate_alerts(alerts: &mut AlertState, deal: &Deal, now: DateTime<Utc>) -> Vec<AlertTrigger> {
    if !deal.status.is_success() {
        debug!("Skipping alert scan for deal {} in status {}", deal.id, deal.status);
        return Vec::new();
    }

    let latency_ms = (now - deal.created_at).num_milliseconds().max(0);
    let mut triggers = Vec::new();

    for alert in alerts.iter_mut() {
        if alert.has_triggered(&deal.id) || !matches(alert, deal) {
            continue;
        }
        alert.triggered.insert(deal.id.clone());
        triggers.push(AlertTrigger {
            alert_id: alert.id.clone(),
            user_id: alert.user_id.clone(),
            deal: deal.clone(),
            latency_ms,
            triggered_at: now,
        });
    }

    triggers
}
