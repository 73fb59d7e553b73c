//! Handler for short URL redirect.

use axum::{
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use std::net::SocketAddr;

use crate::error::AppError;
use crate::state::AppState;
use crate::utils::client_ip::click_context;

/// Redirects a short code to its target URL.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// # Request Flow
///
/// 1. Look up the link; unknown and expired codes are both 404
/// 2. Atomically increment the link's click counter
/// 3. Queue a click event for the analytics pipeline (never blocks)
/// 4. Return `302 Found` with the target in `Location`
///
/// # Errors
///
/// Returns 404 Not Found if the code is unknown or expired.
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Result<impl IntoResponse, AppError> {
    let context = click_context(&headers, addr, state.behind_proxy);

    let target = state.redirect_service.resolve(&code, context).await?;

    Ok((StatusCode::FOUND, [(header::LOCATION, target)]))
}
