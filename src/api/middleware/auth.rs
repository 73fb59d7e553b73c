//! Optional bearer token identification middleware.

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::Response,
};
use axum_auth::AuthBearer;

use crate::state::AppState;

/// Attaches the caller's [`Identity`](crate::domain::token_validator::Identity)
/// as a request extension when a valid bearer token is presented.
///
/// # Header Format
///
/// ```text
/// Authorization: Bearer <token>
/// ```
///
/// Requests without the header, with a malformed header, or with a token the
/// user service does not accept continue anonymously. Handlers read the
/// identity with `Option<Extension<Identity>>`.
pub async fn layer(State(st): State<AppState>, req: Request, next: Next) -> Response {
    if !st.auth_service.is_enabled() {
        return next.run(req).await;
    }

    let (mut parts, body) = req.into_parts();

    let identity = match AuthBearer::from_request_parts(&mut parts, &()).await {
        Ok(AuthBearer(token)) => st.auth_service.identify(&token).await,
        Err(_) => None,
    };

    let mut req = Request::from_parts(parts, body);
    if let Some(identity) = identity {
        req.extensions_mut().insert(identity);
    }

    next.run(req).await
}
