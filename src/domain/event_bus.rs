//! Publish/subscribe abstraction for click events.
//!
//! A topic is broadcast: every live subscription receives every message
//! published after it subscribed. Delivery is at-most-once with no replay
//! and no acknowledgement.
//!
//! # Implementations
//!
//! - [`crate::infrastructure::bus::RedisEventBus`] - Redis pub/sub
//! - [`crate::infrastructure::bus::InMemoryEventBus`] - In-process broadcast channels

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("Event bus connection error: {0}")]
    Connection(String),
    #[error("Event bus publish error: {0}")]
    Publish(String),
    #[error("Event bus receive error: {0}")]
    Receive(String),
}

#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publishes `payload` to every current subscriber of `topic`.
    ///
    /// Publishing to a topic without subscribers succeeds and is lost.
    async fn publish(&self, topic: &str, payload: String) -> Result<(), BusError>;

    /// Opens a new subscription to `topic`.
    async fn subscribe(&self, topic: &str) -> Result<Box<dyn Subscription>, BusError>;
}

/// A live subscription to one topic.
#[async_trait]
pub trait Subscription: Send {
    /// Waits for the next message payload.
    ///
    /// Must be cancel-safe: dropping the future before it completes loses no
    /// message that would otherwise have been returned by a later call.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(payload))` for each message
    /// - `Ok(None)` once the subscription can deliver nothing more
    async fn next_payload(&mut self) -> Result<Option<String>, BusError>;

    /// Releases the subscription.
    async fn close(self: Box<Self>) -> Result<(), BusError>;
}
