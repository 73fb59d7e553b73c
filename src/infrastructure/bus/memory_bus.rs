//! In-process event bus built on tokio broadcast channels.

use super::{BusError, EventBus, Subscription};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// An event bus that only reaches subscribers in the same process.
///
/// Used when Redis is not configured and in tests. Semantics match the Redis
/// bus: broadcast to current subscribers, nothing retained for late
/// subscribers, and a subscriber that falls more than `capacity` messages
/// behind loses the oldest ones.
pub struct InMemoryEventBus {
    capacity: usize,
    topics: Mutex<HashMap<String, broadcast::Sender<String>>>,
}

impl InMemoryEventBus {
    pub fn new(capacity: usize) -> Self {
        debug!(capacity, "Using in-process event bus");
        Self {
            capacity: capacity.max(1),
            topics: Mutex::new(HashMap::new()),
        }
    }

    fn sender(&self, topic: &str) -> Result<broadcast::Sender<String>, BusError> {
        let mut topics = self
            .topics
            .lock()
            .map_err(|_| BusError::Connection("topic registry poisoned".to_string()))?;

        Ok(topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone())
    }

    /// Number of live subscriptions on `topic`.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .lock()
            .ok()
            .and_then(|topics| topics.get(topic).map(|tx| tx.receiver_count()))
            .unwrap_or(0)
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish(&self, topic: &str, payload: String) -> Result<(), BusError> {
        // A send error only means nobody is subscribed.
        let receivers = self.sender(topic)?.send(payload).unwrap_or(0);
        debug!(topic, receivers, "Published to in-process topic");
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<Box<dyn Subscription>, BusError> {
        let receiver = self.sender(topic)?.subscribe();
        Ok(Box::new(InMemorySubscription {
            topic: topic.to_string(),
            receiver,
        }))
    }
}

struct InMemorySubscription {
    topic: String,
    receiver: broadcast::Receiver<String>,
}

#[async_trait]
impl Subscription for InMemorySubscription {
    async fn next_payload(&mut self) -> Result<Option<String>, BusError> {
        loop {
            match self.receiver.recv().await {
                Ok(payload) => return Ok(Some(payload)),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(topic = %self.topic, skipped, "Subscriber lagged, messages dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return Ok(None),
            }
        }
    }

    async fn close(self: Box<Self>) -> Result<(), BusError> {
        debug!(topic = %self.topic, "Closing in-process subscription");
        Ok(())
    }
}
