//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod links;
pub mod redirect;
pub mod stats;

pub use links::create_link_handler;
pub use redirect::redirect_handler;
pub use stats::{overall_stats_handler, recent_clicks_handler, url_stats_handler};
