//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! concrete implementations for data persistence, the event bus and token
//! validation.
//!
//! # Modules
//!
//! - [`auth`] - HTTP client for the user service
//! - [`bus`] - Event bus implementations (Redis pub/sub and in-process)
//! - [`persistence`] - PostgreSQL repository implementations

pub mod auth;
pub mod bus;
pub mod persistence;
