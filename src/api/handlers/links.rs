//! Handler for link creation.

use axum::{Extension, Json, extract::State, http::StatusCode};
use validator::Validate;

use crate::api::dto::links::{CreateUrlRequest, UrlResponse};
use crate::application::services::CreateLink;
use crate::domain::token_validator::Identity;
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short link.
///
/// # Endpoint
///
/// `POST /api/urls`
///
/// # Authentication
///
/// Optional. With a valid bearer token the link's owner is the caller's
/// user id; otherwise the link is anonymous.
///
/// # Request Body
///
/// ```json
/// {
///   "original_url": "https://example.com/landing",
///   "custom_code": "promo1",
///   "expires_in": 24
/// }
/// ```
///
/// # Response Codes
///
/// - **201 Created**: Link created
/// - **400 Bad Request**: Invalid URL, custom code or expiry
/// - **409 Conflict**: Custom code already taken
/// - **503 Service Unavailable**: No free generated code found
pub async fn create_link_handler(
    State(state): State<AppState>,
    identity: Option<Extension<Identity>>,
    Json(payload): Json<CreateUrlRequest>,
) -> Result<(StatusCode, Json<UrlResponse>), AppError> {
    payload.validate()?;

    let input = CreateLink {
        custom_code: payload.custom_code(),
        expires_in: payload.expires_in(),
        target_url: payload.original_url,
        owner: identity.map(|Extension(id)| id.user_id),
    };

    let link = state.link_service.create_short_link(input).await?;
    let short_url = state.link_service.short_url(&link.code);

    Ok((StatusCode::CREATED, Json(UrlResponse::new(link, short_url))))
}
