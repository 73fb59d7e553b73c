//! Redis pub/sub event bus.

use super::{BusError, EventBus, Subscription};
use async_trait::async_trait;
use futures_util::StreamExt;
use redis::{AsyncCommands, Client, aio::ConnectionManager, aio::PubSub};
use tracing::{debug, info};

/// Event bus backed by Redis `PUBLISH` / `SUBSCRIBE`.
///
/// Publishing goes through a shared `ConnectionManager`, which reconnects on
/// its own. Each subscription opens a dedicated pub/sub connection.
pub struct RedisEventBus {
    client: Client,
    publisher: ConnectionManager,
}

impl RedisEventBus {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Connection`] if the URL is invalid, the connection cannot
    /// be established, or the PING health check fails.
    pub async fn connect(redis_url: &str) -> Result<Self, BusError> {
        info!("Connecting to Redis event bus");

        let client = Client::open(redis_url)
            .map_err(|e| BusError::Connection(format!("Failed to create Redis client: {}", e)))?;

        let publisher = ConnectionManager::new(client.clone())
            .await
            .map_err(|e| BusError::Connection(format!("Failed to connect to Redis: {}", e)))?;

        let mut test_conn = publisher.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| BusError::Connection(format!("Redis PING failed: {}", e)))?;

        info!("✓ Connected to Redis event bus");

        Ok(Self { client, publisher })
    }
}

#[async_trait]
impl EventBus for RedisEventBus {
    async fn publish(&self, topic: &str, payload: String) -> Result<(), BusError> {
        let mut conn = self.publisher.clone();

        let receivers: i64 = conn
            .publish(topic, payload)
            .await
            .map_err(|e| BusError::Publish(e.to_string()))?;

        debug!(topic, receivers, "Published to Redis channel");
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<Box<dyn Subscription>, BusError> {
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(|e| BusError::Connection(format!("Failed to open pub/sub connection: {}", e)))?;

        pubsub
            .subscribe(topic)
            .await
            .map_err(|e| BusError::Connection(format!("SUBSCRIBE {} failed: {}", topic, e)))?;

        Ok(Box::new(RedisSubscription {
            topic: topic.to_string(),
            pubsub,
        }))
    }
}

struct RedisSubscription {
    topic: String,
    pubsub: PubSub,
}

#[async_trait]
impl Subscription for RedisSubscription {
    async fn next_payload(&mut self) -> Result<Option<String>, BusError> {
        let mut messages = self.pubsub.on_message();

        match messages.next().await {
            Some(msg) => msg
                .get_payload::<String>()
                .map(Some)
                .map_err(|e| BusError::Receive(e.to_string())),
            None => Ok(None),
        }
    }

    async fn close(self: Box<Self>) -> Result<(), BusError> {
        let RedisSubscription { topic, mut pubsub } = *self;

        pubsub
            .unsubscribe(&topic)
            .await
            .map_err(|e| BusError::Connection(format!("UNSUBSCRIBE failed: {}", e)))?;

        debug!(%topic, "Redis subscription closed");
        Ok(())
    }
}
