//! Application layer services implementing business logic.
//!
//! Services coordinate repository calls, validation and the click publisher.
//! They hold repository trait objects so HTTP handlers and tests can share
//! one construction path.
//!
//! # Available Services
//!
//! - [`services::link_service::LinkService`] - Short code allocation
//! - [`services::redirect_service::RedirectService`] - Redirect resolution and click emission
//! - [`services::stats_service::StatsService`] - Click analytics
//! - [`services::auth_service::AuthService`] - Optional bearer token identification

pub mod services;
