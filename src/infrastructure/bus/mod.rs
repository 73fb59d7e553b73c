//! Event bus implementations.
//!
//! - [`RedisEventBus`] - Production Redis pub/sub bus
//! - [`InMemoryEventBus`] - In-process fallback for single-node runs and tests

mod memory_bus;
mod redis_bus;

pub use crate::domain::event_bus::{BusError, EventBus, Subscription};
pub use memory_bus::InMemoryEventBus;
pub use redis_bus::RedisEventBus;
