//! Business logic services for the application layer.

pub mod auth_service;
pub mod link_service;
pub mod redirect_service;
pub mod stats_service;

pub use auth_service::AuthService;
pub use link_service::{CreateLink, LinkService};
pub use redirect_service::RedirectService;
pub use stats_service::{StatsService, UrlStats};
