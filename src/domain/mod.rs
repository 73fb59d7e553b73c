//! Domain layer containing business entities and the click pipeline.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Store trait definitions
//! - [`event_bus`] - Publish/subscribe abstraction
//! - [`click_event`] - Wire model for click events
//! - [`user_agent`] - Device and browser classification
//! - [`token_validator`] - Bearer token validation contract
//! - [`click_publisher`] - Bounded fire-and-forget event emission
//! - [`click_consumer`] - Subscriber that records classified clicks
//!
//! # Click Processing Flow
//!
//! 1. The redirect handler resolves a code and increments its counter
//! 2. A [`click_event::ClickEvent`] is queued on [`click_publisher::ClickPublisher`]
//! 3. [`click_publisher::run_click_publisher`] publishes it to the click topic
//! 4. [`click_consumer::ClickConsumer`] receives, classifies and persists it
//!    via [`repositories::ClickRepository`]

pub mod click_consumer;
pub mod click_event;
pub mod click_publisher;
pub mod entities;
pub mod event_bus;
pub mod repositories;
pub mod token_validator;
pub mod user_agent;
