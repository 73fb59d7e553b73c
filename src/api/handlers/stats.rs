//! Handlers for click statistics endpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::api::dto::stats::{ClickResponse, OverallStatsResponse, RecentQuery, UrlStatsResponse};
use crate::error::AppError;
use crate::state::AppState;

/// Returns analytics for one short code.
///
/// # Endpoint
///
/// `GET /api/stats/{code}`
///
/// Codes that were never clicked, including unknown codes, report zero
/// totals. Breakdowns that failed to compute are listed in
/// `partial_failures` and returned empty.
///
/// # Response
///
/// ```json
/// {
///   "short_code": "promo1",
///   "total_clicks": 3,
///   "by_day": [{ "date": "2026-10-14", "clicks": 3 }],
///   "by_device": [{ "device": "Mobile", "count": 2 }, { "device": "Desktop", "count": 1 }],
///   "by_browser": [{ "browser": "Safari", "count": 2 }, { "browser": "Chrome", "count": 1 }],
///   "by_referer": [{ "referer": "https://news.example.com/", "count": 2 }],
///   "partial_failures": []
/// }
/// ```
pub async fn url_stats_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<UrlStatsResponse>, AppError> {
    let stats = state.stats_service.get_url_stats(&code).await?;
    Ok(Json(stats.into()))
}

/// Returns system-wide totals.
///
/// # Endpoint
///
/// `GET /api/stats/overall`
pub async fn overall_stats_handler(
    State(state): State<AppState>,
) -> Result<Json<OverallStatsResponse>, AppError> {
    let stats = state.stats_service.get_overall_stats().await?;
    Ok(Json(stats.into()))
}

/// Returns the most recent clicks, newest first.
///
/// # Endpoint
///
/// `GET /api/stats/recent?limit=N`
///
/// `limit` defaults to 20 and is clamped to 1-100. A non-numeric `limit`
/// is treated as absent.
pub async fn recent_clicks_handler(
    Query(query): Query<RecentQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<ClickResponse>>, AppError> {
    let clicks = state.stats_service.get_recent_clicks(query.limit()).await?;
    Ok(Json(clicks.into_iter().map(ClickResponse::from).collect()))
}
