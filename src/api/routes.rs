//! API route configuration.
//!
//! Every API route passes through the optional bearer authentication of
//! [`crate::api::middleware::auth`]; none of them require it.

use crate::api::handlers::{
    create_link_handler, overall_stats_handler, recent_clicks_handler, url_stats_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// All API routes.
///
/// # Endpoints
///
/// - `POST /urls`              - Create a short link
/// - `GET  /stats/overall`     - System-wide click totals
/// - `GET  /stats/recent`      - Most recent clicks
/// - `GET  /stats/{code}`      - Analytics for one short code
///
/// Static segments take precedence over `{code}`, so `overall` and `recent`
/// never reach [`url_stats_handler`].
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/urls", post(create_link_handler))
        .route("/stats/overall", get(overall_stats_handler))
        .route("/stats/recent", get(recent_clicks_handler))
        .route("/stats/{code}", get(url_stats_handler))
}
