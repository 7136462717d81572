//! Classroom demo application.
//!
//! Runs the same deal/alert scenario once per mode on fresh engines so the
//! outcomes and alert latencies of the two models can be compared.

use crate::config::Config;
use crate::engine::{DealEngine, Mode, Statistics};
use crate::error::Result;
use crate::events::{Event, LogSubscriber, Notifier};
use crate::state::{AlertDraft, DealDraft, DealStatus, Verdict};
use serde::Serialize;
use std::time::Duration;
use tracing::info;

/// Outcome of one scenario run.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    /// Mode the scenario ran in.
    pub mode: Mode,
    /// Final deal status.
    pub final_status: DealStatus,
    /// Names of events published, in order.
    pub events: Vec<&'static str>,
    /// Number of alerts fired.
    pub alerts_fired: usize,
    /// Latency of the first alert, if any fired.
    pub alert_latency_ms: Option<i64>,
    /// Engine statistics at the end of the run.
    pub stats: Statistics,
}

/// The demo application.
pub struct App {
    config: Config,
}

impl App {
    /// Create a new application.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run the scenario in both modes.
    pub async fn run(&self) -> Result<Vec<ScenarioReport>> {
        let mut reports = Vec::new();
        for mode in [Mode::Centralized, Mode::Decentralized] {
            let report = self.run_scenario(mode).await?;
            info!(
                "{} model: deal {}, {} alert(s), latency {:?} ms",
                report.mode, report.final_status, report.alerts_fired, report.alert_latency_ms
            );
            reports.push(report);
        }
        Ok(reports)
    }

    /// Run the scenario once on a fresh engine in the given mode.
    pub async fn run_scenario(&self, mode: Mode) -> Result<ScenarioReport> {
        let demo = &self.config.demo;

        let notifier = Notifier::new();
        notifier.subscribe("log", LogSubscriber);
        let mut rx = notifier.subscribe_channel("report");

        let mut settings = self.config.engine.clone();
        settings.mode = mode;
        settings.promotion_delay_ms = demo.promotion_delay_ms;
        let engine = DealEngine::from_settings(&settings, notifier);

        let submitter = engine.register_user("alice").await?;
        let watcher = engine.register_user("bob").await?;
        let crowd = demo.centralized_votes.max(demo.decentralized_verifications);
        let mut peers = Vec::new();
        for i in 0..crowd {
            peers.push(engine.register_user(&format!("peer{}", i + 1)).await?);
        }

        let deal = engine
            .submit_deal(DealDraft {
                title: demo.deal_title.clone(),
                price: Some(demo.deal_price),
                original_price: None,
                url: "https://deals.example/demo".to_string(),
                category: demo.deal_category.clone(),
                submitter_id: submitter.id.clone(),
            })
            .await?;

        engine
            .create_alert(AlertDraft {
                user_id: watcher.id.clone(),
                keywords: demo.alert_keywords.clone(),
                max_price: Some(demo.alert_max_price),
                min_verifications: demo.alert_min_verifications,
            })
            .await?;

        match mode {
            Mode::Centralized => {
                for peer in peers.iter().take(demo.centralized_votes as usize) {
                    engine.record_vote(&deal.id, &peer.id).await?;
                }
                // Let the single promotion check fire.
                tokio::time::sleep(Duration::from_millis(demo.promotion_delay_ms + 100)).await;
            }
            Mode::Decentralized => {
                for peer in peers.iter().take(demo.decentralized_verifications as usize) {
                    engine
                        .record_verification(
                            &deal.id,
                            &peer.id,
                            Verdict::Valid,
                            Some("checked the listing".to_string()),
                        )
                        .await?;
                }
            }
        }

        let final_status = engine.get_deal(&deal.id).await?.status;
        let stats = engine.stats().await;
        engine.shutdown().await;

        let mut events = Vec::new();
        let mut alerts_fired = 0;
        let mut alert_latency_ms = None;
        while let Ok(event) = rx.try_recv() {
            if let Event::AlertTriggered(trigger) = &event {
                alerts_fired += 1;
                alert_latency_ms.get_or_insert(trigger.latency_ms);
            }
            events.push(event.name());
        }

        Ok(ScenarioReport {
            mode,
            final_status,
            events,
            alerts_fired,
            alert_latency_ms,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_centralized_demo_misses_alert() {
        let app = App::new(Config::default());
        let report = app.run_scenario(Mode::Centralized).await.unwrap();

        assert_eq!(report.final_status, DealStatus::Pending);
        assert_eq!(report.alerts_fired, 0);
        assert_eq!(report.stats.alerts_triggered, 0);
        assert!(report.alert_latency_ms.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_decentralized_demo_fires_alert() {
        let app = App::new(Config::default());
        let report = app.run_scenario(Mode::Decentralized).await.unwrap();

        assert_eq!(report.final_status, DealStatus::Verified);
        assert_eq!(report.alerts_fired, 1);
        assert_eq!(report.events.last(), Some(&"alert-triggered"));
        assert_eq!(report.stats.alerts_triggered, 1);
        assert_eq!(report.stats.verified, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_covers_both_modes() {
        let reports = App::new(Config::default()).run().await.unwrap();
        let modes: Vec<Mode> = reports.iter().map(|r| r.mode).collect();
        assert_eq!(modes, vec![Mode::Centralized, Mode::Decentralized]);
    }
}
