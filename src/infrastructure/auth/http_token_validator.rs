//! Token validation over HTTP against the user service.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::domain::token_validator::{TokenValidation, TokenValidator};
use crate::error::AppError;

const VALIDATE_PATH: &str = "/api/users/validate";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

/// Calls `GET {base_url}/api/users/validate` with the caller's bearer token.
pub struct HttpTokenValidator {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTokenValidator {
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                AppError::internal(
                    "Failed to build HTTP client",
                    serde_json::json!({ "reason": e.to_string() }),
                )
            })?;

        Ok(Self {
            client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), VALIDATE_PATH),
        })
    }
}

#[async_trait]
impl TokenValidator for HttpTokenValidator {
    async fn validate(&self, token: &str) -> Result<TokenValidation, AppError> {
        let response = self
            .client
            .get(&self.endpoint)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| {
                debug!(error = %e, "User service unreachable");
                AppError::unauthorized("Failed to validate token")
            })?;

        if !response.status().is_success() {
            debug!(status = %response.status(), "User service rejected token");
            return Err(AppError::unauthorized("Invalid token"));
        }

        let validation: TokenValidation = response
            .json()
            .await
            .map_err(|_| AppError::unauthorized("Invalid validation response"))?;

        if !validation.valid {
            return Err(AppError::unauthorized("Invalid token"));
        }

        Ok(validation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let v = HttpTokenValidator::new("http://users:8081/").unwrap();
        assert_eq!(v.endpoint, "http://users:8081/api/users/validate");
    }

    #[tokio::test]
    async fn test_unreachable_service_is_unauthorized() {
        let v = HttpTokenValidator::new("http://127.0.0.1:1").unwrap();
        let err = v.validate("token").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized { .. }));
    }
}
