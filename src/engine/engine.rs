//! Deal engine - serializes mutations, runs the evaluator and publishes events.

use super::matcher::evaluate_alerts;
use super::{Evaluator, Mode, ModeConfig, ModeController, Statistics, Transition};
use crate::config::EngineSettings;
use crate::error::Result;
use crate::events::{Event, Notifier};
use crate::state::{
    Alert, AlertDraft, Deal, DealDraft, DealFilter, Store, User, Verdict, Verification,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Entry point for every inbound operation and query.
///
/// Cloning is cheap and every clone shares the same registries. Each
/// mutation takes the write lock for its whole step and publishes its
/// events before releasing it, so steps never interleave and events for a
/// deal come out in the order they were applied.
#[derive(Clone, Debug)]
pub struct DealEngine {
    inner: Arc<RwLock<EngineInner>>,
    notifier: Notifier,
}

#[derive(Debug)]
struct EngineInner {
    store: Store,
    mode: ModeController,
    /// Outstanding one-shot promotion checks by deal ID.
    promotion_checks: HashMap<String, JoinHandle<()>>,
    /// Latency of every alert fired so far.
    alert_latencies_ms: Vec<i64>,
}

impl DealEngine {
    /// Create an engine with its own mode configuration.
    pub fn new(config: ModeConfig, notifier: Notifier) -> Self {
        info!(
            "Deal engine starting in {} mode (promotion >= {} votes after {:?}, consensus >= {})",
            config.mode, config.promotion_threshold, config.promotion_delay, config.consensus_threshold
        );
        Self {
            inner: Arc::new(RwLock::new(EngineInner {
                store: Store::new(),
                mode: ModeController::new(config),
                promotion_checks: HashMap::new(),
                alert_latencies_ms: Vec::new(),
            })),
            notifier,
        }
    }

    /// Create an engine from loaded settings.
    pub fn from_settings(settings: &EngineSettings, notifier: Notifier) -> Self {
        Self::new(settings.mode_config(), notifier)
    }

    /// The notifier events are published through.
    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Register a user.
    pub async fn register_user(&self, username: &str) -> Result<User> {
        let mut inner = self.inner.write().await;
        let user = inner.store.users.register(username, Utc::now())?;
        info!("Registered user: {} ({})", user.username, user.id);
        Ok(user)
    }

    /// Submit a deal and schedule its single promotion check.
    pub async fn submit_deal(&self, draft: DealDraft) -> Result<Deal> {
        draft.validate()?;

        let mut inner = self.inner.write().await;
        inner.store.users.require(&draft.submitter_id)?;

        let deal = inner.store.deals.insert(draft, Utc::now())?;
        info!("Deal submitted: '{}' at {} ({})", deal.title, deal.price, deal.id);
        self.notifier.publish(Event::DealCreated { deal: deal.clone() });

        let delay = inner.mode.config().promotion_delay;
        let handle = self.schedule_promotion_check(deal.id.clone(), delay);
        inner.promotion_checks.insert(deal.id.clone(), handle);

        Ok(deal)
    }

    fn schedule_promotion_check(&self, deal_id: String, delay: Duration) -> JoinHandle<()> {
        let engine = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = engine.run_promotion_check(&deal_id).await {
                debug!("Promotion check for {} skipped: {}", deal_id, e);
            }
        })
    }

    /// The delayed check. Runs once per deal; a miss is final.
    async fn run_promotion_check(&self, deal_id: &str) -> Result<Option<Transition>> {
        let mut inner = self.inner.write().await;
        inner.promotion_checks.remove(deal_id);

        let config = inner.mode.config();
        let EngineInner {
            store,
            alert_latencies_ms,
            ..
        } = &mut *inner;

        let deal = store.deals.require_mut(deal_id)?;
        let Some(transition) = Evaluator::new(config).on_promotion_check(deal) else {
            info!(
                "Deal {} not promoted: status={} votes={}/{} mode={}",
                deal_id, deal.status, deal.votes, config.promotion_threshold, config.mode
            );
            return Ok(None);
        };

        let now = Utc::now();
        transition.apply(deal, now);
        let snapshot = deal.clone();
        info!("Deal promoted: '{}' with {} votes", snapshot.title, snapshot.votes);
        self.finish_transition(store, alert_latencies_ms, transition, snapshot, now);
        Ok(Some(transition))
    }

    /// Add a vote. Votes only matter to the scheduled promotion check.
    pub async fn record_vote(&self, deal_id: &str, user_id: &str) -> Result<Deal> {
        let mut inner = self.inner.write().await;
        inner.store.deals.require(deal_id)?;
        inner.store.users.require(user_id)?;

        let deal = inner.store.deals.add_vote(deal_id)?.clone();
        debug!("Vote on {} by {}: {} votes", deal_id, user_id, deal.votes);
        self.notifier.publish(Event::DealUpdated { deal: deal.clone() });
        Ok(deal)
    }

    /// Record a verification and run the consensus rule.
    pub async fn record_verification(
        &self,
        deal_id: &str,
        user_id: &str,
        verdict: Verdict,
        evidence: Option<String>,
    ) -> Result<Verification> {
        let mut inner = self.inner.write().await;
        inner.store.deals.require(deal_id)?;
        inner.store.users.require(user_id)?;

        let now = Utc::now();
        let verification =
            inner
                .store
                .deals
                .add_verification(deal_id, user_id, verdict, evidence, now)?;

        let config = inner.mode.config();
        let EngineInner {
            store,
            alert_latencies_ms,
            ..
        } = &mut *inner;

        let deal = store.deals.require_mut(deal_id)?;
        debug!(
            "Verification on {} by {}: {:?} (valid={}, invalid={})",
            deal_id,
            user_id,
            verdict,
            deal.valid_count(),
            deal.invalid_count()
        );

        match Evaluator::new(config).on_verification(deal) {
            Some(transition) => {
                transition.apply(deal, now);
                let snapshot = deal.clone();
                info!("Deal {}: '{}'", snapshot.status, snapshot.title);
                self.finish_transition(store, alert_latencies_ms, transition, snapshot, now);
            }
            None => {
                let snapshot = deal.clone();
                self.notifier.publish(Event::DealUpdated { deal: snapshot });
            }
        }

        Ok(verification)
    }

    /// Publish a transition and, for successes, fire matching alerts after it.
    fn finish_transition(
        &self,
        store: &mut Store,
        alert_latencies_ms: &mut Vec<i64>,
        transition: Transition,
        deal: Deal,
        now: DateTime<Utc>,
    ) {
        self.notifier.publish(transition.event(deal.clone()));
        if !transition.is_success() {
            return;
        }

        for trigger in evaluate_alerts(&mut store.alerts, &deal, now) {
            info!(
                "Alert {} triggered for user {} on '{}' ({} ms)",
                trigger.alert_id, trigger.user_id, deal.title, trigger.latency_ms
            );
            alert_latencies_ms.push(trigger.latency_ms);
            self.notifier.publish(Event::AlertTriggered(trigger));
        }
    }

    /// Create a standing alert.
    pub async fn create_alert(&self, draft: AlertDraft) -> Result<Alert> {
        draft.validate()?;

        let mut inner = self.inner.write().await;
        inner.store.users.require(&draft.user_id)?;
        let alert = inner.store.alerts.insert(draft, Utc::now())?;
        info!(
            "Alert created for {}: '{}' <= {} with >= {} verifications",
            alert.user_id, alert.keywords, alert.max_price, alert.min_verifications
        );
        Ok(alert)
    }

    /// Delete an alert.
    pub async fn delete_alert(&self, alert_id: &str) -> Result<Alert> {
        let mut inner = self.inner.write().await;
        let alert = inner.store.alerts.remove(alert_id)?;
        info!("Alert deleted: {}", alert_id);
        Ok(alert)
    }

    /// Switch modes. Only later events see the new mode.
    pub async fn set_mode(&self, mode: Mode) -> ModeConfig {
        let mut inner = self.inner.write().await;
        let config = inner.mode.set_mode(mode);
        info!("Mode set to {}", mode);
        self.notifier.publish(Event::ConfigUpdated { config });
        config
    }

    /// Current mode configuration.
    pub async fn config(&self) -> ModeConfig {
        self.inner.read().await.mode.config()
    }

    /// Deals matching the filter, newest first.
    pub async fn list_deals(&self, filter: &DealFilter) -> Vec<Deal> {
        let inner = self.inner.read().await;
        inner.store.deals.list(filter).into_iter().cloned().collect()
    }

    /// A single deal.
    pub async fn get_deal(&self, deal_id: &str) -> Result<Deal> {
        let inner = self.inner.read().await;
        inner.store.deals.require(deal_id).cloned()
    }

    /// All registered users.
    pub async fn list_users(&self) -> Vec<User> {
        let inner = self.inner.read().await;
        inner.store.users.list().into_iter().cloned().collect()
    }

    /// A single user.
    pub async fn get_user(&self, user_id: &str) -> Result<User> {
        let inner = self.inner.read().await;
        inner.store.users.require(user_id).cloned()
    }

    /// Alerts owned by a user.
    pub async fn list_alerts(&self, user_id: &str) -> Result<Vec<Alert>> {
        let inner = self.inner.read().await;
        inner.store.users.require(user_id)?;
        Ok(inner.store.alerts.for_user(user_id).into_iter().cloned().collect())
    }

    /// Aggregate statistics.
    pub async fn stats(&self) -> Statistics {
        let inner = self.inner.read().await;
        Statistics::collect(&inner.store, &inner.alert_latencies_ms)
    }

    /// Promotion checks that have not fired yet.
    pub async fn pending_promotion_checks(&self) -> usize {
        self.inner.read().await.promotion_checks.len()
    }

    /// Abort every outstanding promotion check.
    pub async fn shutdown(&self) {
        let mut inner = self.inner.write().await;
        let count = inner.promotion_checks.len();
        for (_, handle) in inner.promotion_checks.drain() {
            handle.abort();
        }
        info!("Deal engine stopped, {} promotion checks cancelled", count);
    }
}
