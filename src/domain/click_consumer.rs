//! Long-running subscriber that turns click events into click records.
//!
//! # Delivery semantics
//!
//! The click topic is broadcast, not a work queue. Each running consumer
//! receives every event and writes its own record, so running `N` instances
//! against one topic stores `N` records per redirect. Deployments that scale
//! the HTTP tier horizontally should run a single consumer.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::domain::click_event::ClickEvent;
use crate::domain::entities::{ClickRecord, NewClickRecord};
use crate::domain::event_bus::{BusError, EventBus, Subscription};
use crate::domain::repositories::ClickRepository;
use crate::error::AppError;

/// Pause after a transport error, and before each re-subscribe attempt.
const RECEIVE_BACKOFF: Duration = Duration::from_millis(500);

/// Consecutive receive errors after which the subscription is treated as lost.
const MAX_CONSECUTIVE_RECEIVE_ERRORS: u32 = 5;

/// Reasons a single message was skipped.
#[derive(Debug, Error)]
pub enum ConsumeError {
    #[error("Malformed click event: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Failed to persist click record: {0}")]
    Persist(#[from] AppError),
}

enum ReceiveExit {
    Shutdown,
    /// The subscription ended or kept failing.
    Lost,
}

pub struct ClickConsumer {
    bus: Arc<dyn EventBus>,
    clicks: Arc<dyn ClickRepository>,
    topic: String,
}

impl ClickConsumer {
    pub fn new(bus: Arc<dyn EventBus>, clicks: Arc<dyn ClickRepository>, topic: String) -> Self {
        Self { bus, clicks, topic }
    }

    /// Subscribes to the click topic and spawns the receive loop.
    ///
    /// The subscription is established before this returns, so events
    /// published afterwards are observed. A subscription that ends or keeps
    /// failing is replaced by a fresh one; the loop only exits once
    /// `shutdown` is cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`BusError`] if the initial subscription cannot be opened.
    pub async fn start(self, shutdown: CancellationToken) -> Result<JoinHandle<()>, BusError> {
        let subscription = self.bus.subscribe(&self.topic).await?;
        info!(topic = %self.topic, "Click consumer listening for click events");

        Ok(tokio::spawn(self.run(subscription, shutdown)))
    }

    async fn run(self, mut subscription: Box<dyn Subscription>, shutdown: CancellationToken) {
        loop {
            let exit = self.receive(subscription.as_mut(), &shutdown).await;

            if let Err(e) = subscription.close().await {
                warn!(error = %e, "Failed to close click subscription");
            }

            if let ReceiveExit::Shutdown = exit {
                break;
            }

            match self.resubscribe(&shutdown).await {
                Some(next) => subscription = next,
                None => break,
            }
        }

        info!("Click consumer stopped");
    }

    /// Processes messages from `subscription` until shutdown or until the
    /// subscription is lost.
    async fn receive(
        &self,
        subscription: &mut dyn Subscription,
        shutdown: &CancellationToken,
    ) -> ReceiveExit {
        let mut consecutive_errors = 0;

        loop {
            let next = tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("Click consumer received shutdown signal");
                    return ReceiveExit::Shutdown;
                }
                next = subscription.next_payload() => next,
            };

            match next {
                Ok(Some(payload)) => {
                    consecutive_errors = 0;
                    match self.handle_payload(&payload).await {
                        Ok(record) => {
                            debug!(code = %record.code, id = record.id, "Recorded click");
                        }
                        Err(e) => {
                            metrics::counter!("click_events_discarded_total").increment(1);
                            warn!(error = %e, "Discarding click event");
                        }
                    }
                }
                Ok(None) => {
                    warn!(topic = %self.topic, "Click subscription ended");
                    return ReceiveExit::Lost;
                }
                Err(e) => {
                    consecutive_errors += 1;
                    error!(error = %e, consecutive_errors, "Error receiving click event");
                    if consecutive_errors >= MAX_CONSECUTIVE_RECEIVE_ERRORS {
                        return ReceiveExit::Lost;
                    }
                    tokio::select! {
                        _ = shutdown.cancelled() => return ReceiveExit::Shutdown,
                        _ = tokio::time::sleep(RECEIVE_BACKOFF) => {}
                    }
                }
            }
        }
    }

    /// Opens a new subscription, retrying with back-off.
    ///
    /// Returns `None` if `shutdown` is cancelled first.
    async fn resubscribe(&self, shutdown: &CancellationToken) -> Option<Box<dyn Subscription>> {
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => return None,
                _ = tokio::time::sleep(RECEIVE_BACKOFF) => {}
            }

            let result = tokio::select! {
                biased;
                _ = shutdown.cancelled() => return None,
                result = self.bus.subscribe(&self.topic) => result,
            };

            match result {
                Ok(subscription) => {
                    metrics::counter!("click_consumer_resubscribes_total").increment(1);
                    info!(topic = %self.topic, "Click consumer resubscribed");
                    return Some(subscription);
                }
                Err(e) => warn!(error = %e, "Failed to resubscribe to click topic"),
            }
        }
    }

    /// Parses, classifies and persists one message payload.
    ///
    /// # Errors
    ///
    /// - [`ConsumeError::Parse`] if the payload is not a valid click event
    /// - [`ConsumeError::Persist`] if the store rejects the record
    pub async fn handle_payload(&self, payload: &str) -> Result<ClickRecord, ConsumeError> {
        let event = ClickEvent::from_payload(payload)?;
        let record = NewClickRecord::from(event);

        Ok(self.clicks.insert(record).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Browser, Device};
    use crate::domain::repositories::MockClickRepository;
    use crate::infrastructure::bus::InMemoryEventBus;
    use chrono::Utc;
    use serde_json::json;

    fn stored(record: NewClickRecord) -> ClickRecord {
        ClickRecord {
            id: 1,
            code: record.code,
            user_agent: record.user_agent,
            ip: record.ip,
            referer: record.referer,
            device: record.device.to_string(),
            browser: record.browser.to_string(),
            created_at: record.created_at,
        }
    }

    fn consumer(clicks: MockClickRepository) -> ClickConsumer {
        ClickConsumer::new(
            Arc::new(InMemoryEventBus::new(16)),
            Arc::new(clicks),
            "url:click".to_string(),
        )
    }

    #[tokio::test]
    async fn test_handle_payload_classifies_and_persists() {
        let mut clicks = MockClickRepository::new();
        clicks
            .expect_insert()
            .withf(|r| {
                r.code == "promo1" && r.device == Device::Mobile && r.browser == Browser::Chrome
            })
            .times(1)
            .returning(|r| Ok(stored(r)));

        let payload = json!({
            "short_code": "promo1",
            "user_agent": "Mozilla/5.0 (Linux; Android 14) Chrome/120 Mobile Safari/537.36",
            "ip": "203.0.113.7",
            "referer": "",
            "timestamp": Utc::now().to_rfc3339(),
        })
        .to_string();

        let record = consumer(clicks).handle_payload(&payload).await.unwrap();

        assert_eq!(record.device, "Mobile");
        assert_eq!(record.browser, "Chrome");
    }

    #[tokio::test]
    async fn test_handle_payload_rejects_malformed_json() {
        let mut clicks = MockClickRepository::new();
        clicks.expect_insert().times(0);

        let result = consumer(clicks).handle_payload("{not json").await;

        assert!(matches!(result, Err(ConsumeError::Parse(_))));
    }

    #[tokio::test]
    async fn test_handle_payload_reports_persist_failure() {
        let mut clicks = MockClickRepository::new();
        clicks
            .expect_insert()
            .times(1)
            .returning(|_| Err(AppError::internal("Database error", json!({}))));

        let payload = json!({
            "short_code": "abc",
            "timestamp": "2026-10-14T09:30:00Z",
        })
        .to_string();

        let result = consumer(clicks).handle_payload(&payload).await;

        assert!(matches!(result, Err(ConsumeError::Persist(_))));
    }

    #[tokio::test]
    async fn test_cancellation_stops_idle_consumer() {
        let clicks = MockClickRepository::new();
        let shutdown = CancellationToken::new();

        let handle = consumer(clicks).start(shutdown.clone()).await.unwrap();
        shutdown.cancel();

        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("consumer should exit without waiting for a message")
            .unwrap();
    }
}
