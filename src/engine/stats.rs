//! Aggregate statistics for comparing the two models.

use crate::state::{DealStatus, Store};
use serde::{Deserialize, Serialize};

/// Snapshot of deal outcomes and timings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_deals: usize,
    pub pending: usize,
    pub promoted: usize,
    pub verified: usize,
    pub rejected: usize,
    /// Mean seconds from submission to promotion.
    pub avg_promotion_secs: Option<f64>,
    /// Mean seconds from submission to verification.
    pub avg_verification_secs: Option<f64>,
    /// Alerts fired so far.
    pub alerts_triggered: usize,
    /// Mean milliseconds from submission to an alert firing.
    pub avg_alert_latency_ms: Option<f64>,
}

impl Statistics {
    /// Compute statistics from the store and the recorded alert latencies.
    ///
    /// Fired alerts are counted from the latency log, so deleting an alert
    /// does not rewrite history.
    pub fn collect(store: &Store, alert_latencies_ms: &[i64]) -> Self {
        let mut stats = Self::default();
        let mut promotion_secs = Vec::new();
        let mut verification_secs = Vec::new();

        for deal in store.deals.iter() {
            stats.total_deals += 1;
            match deal.status {
                DealStatus::Pending => stats.pending += 1,
                DealStatus::Promoted => stats.promoted += 1,
                DealStatus::Verified => stats.verified += 1,
                DealStatus::Rejected => stats.rejected += 1,
            }
            if let Some(elapsed) = deal.time_to_promotion() {
                promotion_secs.push(elapsed.num_milliseconds() as f64 / 1000.0);
            }
            if let Some(elapsed) = deal.time_to_verification() {
                verification_secs.push(elapsed.num_milliseconds() as f64 / 1000.0);
            }
        }

        stats.avg_promotion_secs = mean(&promotion_secs);
        stats.avg_verification_secs = mean(&verification_secs);
        stats.alerts_triggered = alert_latencies_ms.len();
        stats.avg_alert_latency_ms =
            mean(&alert_latencies_ms.iter().map(|&ms| ms as f64).collect::<Vec<_>>());
        stats
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::DealDraft;
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;

    fn submit(store: &mut Store, title: &str) -> String {
        store
            .deals
            .insert(
                DealDraft {
                    title: title.to_string(),
                    price: Some(dec!(10)),
                    original_price: None,
                    url: "https://shop.example".to_string(),
                    category: String::new(),
                    submitter_id: "alice".to_string(),
                },
                Utc::now(),
            )
            .unwrap()
            .id
    }

    #[test]
    fn test_empty_store() {
        let stats = Statistics::collect(&Store::new(), &[]);
        assert_eq!(stats, Statistics::default());
        assert!(stats.avg_promotion_secs.is_none());
    }

    #[test]
    fn test_counts_and_averages() {
        let mut store = Store::new();
        let promoted = submit(&mut store, "A");
        let verified = submit(&mut store, "B");
        let rejected = submit(&mut store, "C");
        submit(&mut store, "D");

        let deal = store.deals.require_mut(&promoted).unwrap();
        deal.status = DealStatus::Promoted;
        deal.promoted_at = Some(deal.created_at + Duration::seconds(30));

        let deal = store.deals.require_mut(&verified).unwrap();
        deal.status = DealStatus::Verified;
        deal.verified_at = Some(deal.created_at + Duration::seconds(4));

        store.deals.require_mut(&rejected).unwrap().status = DealStatus::Rejected;

        let stats = Statistics::collect(&store, &[100, 300]);
        assert_eq!(stats.total_deals, 4);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.promoted, 1);
        assert_eq!(stats.verified, 1);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.avg_promotion_secs, Some(30.0));
        assert_eq!(stats.avg_verification_secs, Some(4.0));
        assert_eq!(stats.alerts_triggered, 2);
        assert_eq!(stats.avg_alert_latency_ms, Some(200.0));
    }
}
