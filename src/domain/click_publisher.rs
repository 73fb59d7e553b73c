//! Bounded, fire-and-forget emission of click events.
//!
//! Redirect handlers hand events to [`ClickPublisher::emit`], which never
//! waits: the event goes into a bounded queue or is dropped when the queue
//! is full. A single [`run_click_publisher`] task drains the queue and
//! publishes to the event bus with bounded concurrency and a per-publish
//! timeout, so a broker outage cannot pile up background work.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, info, warn};

use crate::domain::click_event::ClickEvent;
use crate::domain::event_bus::{BusError, EventBus};

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Click queue is full, event dropped")]
    QueueFull,
    #[error("Click queue is closed")]
    QueueClosed,
    #[error("Failed to serialize click event: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error(transparent)]
    Bus(#[from] BusError),
    #[error("Publish timed out after {0:?}")]
    Timeout(Duration),
}

/// Sending half of the click queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ClickPublisher {
    sender: mpsc::Sender<ClickEvent>,
}

impl ClickPublisher {
    /// Creates a publisher and the receiver to pass to [`run_click_publisher`].
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ClickEvent>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }

    /// Enqueues an event without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::QueueFull`] when the queue is at capacity (the
    /// event is dropped) and [`PublishError::QueueClosed`] after the publisher
    /// task has stopped.
    pub fn emit(&self, event: ClickEvent) -> Result<(), PublishError> {
        self.sender.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => PublishError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => PublishError::QueueClosed,
        })
    }
}

/// Limits applied by the publisher task.
#[derive(Debug, Clone, Copy)]
pub struct PublisherSettings {
    pub concurrency: usize,
    pub timeout: Duration,
}

/// Drains the click queue until every [`ClickPublisher`] is dropped.
///
/// At most `settings.concurrency` publishes are in flight at once. On exit,
/// waits for in-flight publishes to finish (each is bounded by the timeout).
pub async fn run_click_publisher(
    mut receiver: mpsc::Receiver<ClickEvent>,
    bus: Arc<dyn EventBus>,
    topic: String,
    settings: PublisherSettings,
) {
    let concurrency = settings.concurrency.max(1);
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let topic: Arc<str> = topic.into();

    info!(%topic, concurrency, "Click publisher started");

    while let Some(event) = receiver.recv().await {
        let Ok(permit) = semaphore.clone().acquire_owned().await else {
            break;
        };

        let bus = bus.clone();
        let topic = topic.clone();
        tokio::spawn(async move {
            let _permit = permit;
            let code = event.code.clone();
            match publish_one(bus.as_ref(), &topic, &event, settings.timeout).await {
                Ok(()) => {
                    metrics::counter!("click_events_published_total").increment(1);
                    debug!(%code, "Click event published");
                }
                Err(e) => {
                    metrics::counter!("click_events_failed_total").increment(1);
                    warn!(%code, error = %e, "Failed to publish click event");
                }
            }
        });
    }

    // Wait for in-flight publishes before reporting shutdown.
    let _ = semaphore.acquire_many(concurrency as u32).await;
    info!("Click publisher stopped");
}

/// Serializes and publishes a single event within `timeout`.
pub async fn publish_one(
    bus: &dyn EventBus,
    topic: &str,
    event: &ClickEvent,
    timeout: Duration,
) -> Result<(), PublishError> {
    let payload = event.to_payload()?;

    tokio::time::timeout(timeout, bus.publish(topic, payload))
        .await
        .map_err(|_| PublishError::Timeout(timeout))??;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::click_event::ClickContext;
    use crate::domain::event_bus::Subscription;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records payloads, optionally stalling forever on publish.
    #[derive(Default)]
    struct RecordingBus {
        published: Mutex<Vec<(String, String)>>,
        stall: bool,
    }

    #[async_trait]
    impl EventBus for RecordingBus {
        async fn publish(&self, topic: &str, payload: String) -> Result<(), BusError> {
            if self.stall {
                std::future::pending::<()>().await;
            }
            self.published
                .lock()
                .unwrap()
                .push((topic.to_string(), payload));
            Ok(())
        }

        async fn subscribe(&self, _topic: &str) -> Result<Box<dyn Subscription>, BusError> {
            Err(BusError::Connection("not supported".to_string()))
        }
    }

    fn event(code: &str) -> ClickEvent {
        ClickEvent::now(code, ClickContext::default())
    }

    #[test]
    fn test_emit_drops_when_queue_full() {
        let (publisher, _receiver) = ClickPublisher::channel(1);

        assert!(publisher.emit(event("a")).is_ok());
        assert!(matches!(
            publisher.emit(event("b")),
            Err(PublishError::QueueFull)
        ));
    }

    #[test]
    fn test_emit_after_receiver_dropped() {
        let (publisher, receiver) = ClickPublisher::channel(4);
        drop(receiver);

        assert!(matches!(
            publisher.emit(event("a")),
            Err(PublishError::QueueClosed)
        ));
    }

    #[tokio::test]
    async fn test_publisher_drains_queue_and_stops() {
        let bus = Arc::new(RecordingBus::default());
        let (publisher, receiver) = ClickPublisher::channel(16);

        for code in ["a", "b", "c"] {
            publisher.emit(event(code)).unwrap();
        }
        drop(publisher);

        run_click_publisher(
            receiver,
            bus.clone(),
            "url:click".to_string(),
            PublisherSettings {
                concurrency: 2,
                timeout: Duration::from_secs(1),
            },
        )
        .await;

        let published = bus.published.lock().unwrap();
        assert_eq!(published.len(), 3);
        assert!(published.iter().all(|(topic, _)| topic == "url:click"));

        let mut codes: Vec<String> = published
            .iter()
            .map(|(_, payload)| ClickEvent::from_payload(payload).unwrap().code)
            .collect();
        codes.sort();
        assert_eq!(codes, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_publish_one_times_out() {
        let bus = RecordingBus {
            stall: true,
            ..Default::default()
        };

        let result = publish_one(&bus, "url:click", &event("a"), Duration::from_millis(20)).await;

        assert!(matches!(result, Err(PublishError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_stalled_bus_does_not_block_shutdown() {
        let bus = Arc::new(RecordingBus {
            stall: true,
            ..Default::default()
        });
        let (publisher, receiver) = ClickPublisher::channel(16);
        publisher.emit(event("a")).unwrap();
        drop(publisher);

        tokio::time::timeout(
            Duration::from_secs(2),
            run_click_publisher(
                receiver,
                bus,
                "url:click".to_string(),
                PublisherSettings {
                    concurrency: 1,
                    timeout: Duration::from_millis(20),
                },
            ),
        )
        .await
        .expect("publisher should stop once the timed-out publish is abandoned");
    }
}
