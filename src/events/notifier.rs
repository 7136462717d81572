//! Fire-and-forget event delivery.

use super::Event;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Receives events from the notifier.
///
/// Each subscriber is drained by its own task, so a slow or failing
/// subscriber never holds up evaluation or other subscribers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Subscriber: Send + Sync {
    /// Deliver one event. Errors are logged and dropped.
    async fn deliver(&self, event: &Event) -> Result<()>;
}

/// Publishes events to registered subscribers.
#[derive(Clone, Default)]
pub struct Notifier {
    subscribers: Arc<Mutex<Vec<SubscriberHandle>>>,
}

struct SubscriberHandle {
    name: String,
    tx: mpsc::UnboundedSender<Event>,
}

impl Notifier {
    /// Create a notifier with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber and spawn the task that feeds it.
    pub fn subscribe<S>(&self, name: impl Into<String>, subscriber: S) -> JoinHandle<()>
    where
        S: Subscriber + 'static,
    {
        let name = name.into();
        let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
        self.register(name.clone(), tx);

        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if let Err(e) = subscriber.deliver(&event).await {
                    warn!("Subscriber '{}' failed to take {}: {}", name, event.name(), e);
                }
            }
            debug!("Subscriber '{}' drained", name);
        })
    }

    /// Register a plain channel and return its receiving end.
    pub fn subscribe_channel(&self, name: impl Into<String>) -> mpsc::UnboundedReceiver<Event> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.register(name.into(), tx);
        rx
    }

    fn register(&self, name: String, tx: mpsc::UnboundedSender<Event>) {
        info!("Subscriber '{}' registered", name);
        self.lock().push(SubscriberHandle { name, tx });
    }

    /// Hand an event to every live subscriber without waiting for delivery.
    ///
    /// Returns how many subscribers accepted it. Subscribers whose receiving
    /// side is gone are dropped.
    pub fn publish(&self, event: Event) -> usize {
        let mut subscribers = self.lock();
        subscribers.retain(|handle| {
            if handle.tx.send(event.clone()).is_ok() {
                true
            } else {
                warn!("Subscriber '{}' disconnected, removing", handle.name);
                false
            }
        });
        subscribers.len()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<SubscriberHandle>> {
        // A panicked publisher leaves the list intact.
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Forwards events into an mpsc channel.
#[derive(Debug, Clone)]
pub struct ChannelSubscriber {
    tx: mpsc::UnboundedSender<Event>,
}

impl ChannelSubscriber {
    pub fn new(tx: mpsc::UnboundedSender<Event>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl Subscriber for ChannelSubscriber {
    async fn deliver(&self, event: &Event) -> Result<()> {
        self.tx
            .send(event.clone())
            .map_err(|e| crate::Error::channel(e.to_string()))
    }
}

/// Writes every event to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSubscriber;

#[async_trait]
impl Subscriber for LogSubscriber {
    async fn deliver(&self, event: &Event) -> Result<()> {
        match event {
            Event::AlertTriggered(trigger) => info!(
                "[{}] alert {} for user {} on '{}' after {} ms",
                event.name(),
                trigger.alert_id,
                trigger.user_id,
                trigger.deal.title,
                trigger.latency_ms
            ),
            Event::ConfigUpdated { config } => {
                info!("[{}] mode is now {}", event.name(), config.mode)
            }
            _ => {
                if let Some(deal) = event.deal() {
                    info!(
                        "[{}] '{}' status={} votes={} valid={} invalid={}",
                        event.name(),
                        deal.title,
                        deal.status,
                        deal.votes,
                        deal.valid_count(),
                        deal.invalid_count()
                    );
                }
            }
        }
        Ok(())
    }
}
