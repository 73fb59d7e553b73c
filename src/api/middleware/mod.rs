//! HTTP middleware for request processing.
//!
//! Provides optional authentication and request tracing.

pub mod auth;
pub mod tracing;
