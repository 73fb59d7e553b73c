//! Optional caller identification via bearer tokens.

use std::sync::Arc;
use tracing::debug;

use crate::domain::token_validator::{Identity, TokenValidator};

/// Resolves bearer tokens to an [`Identity`] when a validator is configured.
///
/// Authentication is optional on every route: a missing, invalid or
/// unverifiable token leaves the request anonymous instead of rejecting it.
pub struct AuthService {
    validator: Option<Arc<dyn TokenValidator>>,
}

impl AuthService {
    pub fn new(validator: Option<Arc<dyn TokenValidator>>) -> Self {
        Self { validator }
    }

    /// A service that treats every request as anonymous.
    pub fn disabled() -> Self {
        Self { validator: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.validator.is_some()
    }

    /// Returns the caller's identity, or `None` if the token is not accepted.
    pub async fn identify(&self, token: &str) -> Option<Identity> {
        let validator = self.validator.as_ref()?;

        match validator.validate(token).await {
            Ok(v) if v.valid => Some(Identity {
                user_id: v.user_id,
                email: v.email,
            }),
            Ok(_) => None,
            Err(e) => {
                debug!(error = %e, "Token not accepted, continuing anonymously");
                None
            }
        }
    }
}
