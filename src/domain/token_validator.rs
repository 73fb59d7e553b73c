//! Bearer token validation, consumed as an external capability.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::AppError;

/// Result of validating a bearer token.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenValidation {
    pub valid: bool,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub email: String,
}

/// The authenticated caller attached to a request.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub user_id: String,
    pub email: String,
}

/// Validates bearer tokens against the user service.
///
/// # Implementations
///
/// - [`crate::infrastructure::auth::HttpTokenValidator`] - HTTP call to the user service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenValidator: Send + Sync {
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if the user service rejects the
    /// token or cannot be reached.
    async fn validate(&self, token: &str) -> Result<TokenValidation, AppError>;
}
