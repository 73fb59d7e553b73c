//! DTOs for link creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::entities::ShortLink;

/// Request to create a short link.
///
/// ```json
/// { "original_url": "https://example.com/landing", "custom_code": "promo1", "expires_in": 24 }
/// ```
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUrlRequest {
    #[validate(url(message = "Invalid URL format"))]
    pub original_url: String,

    /// Used verbatim when present; code rules are checked by the service.
    #[serde(default)]
    pub custom_code: Option<String>,

    /// Lifetime in hours, at most ten years. Absent means the link never expires.
    #[validate(range(min = 1, max = 87_600, message = "expires_in must be 1-87600 hours"))]
    #[serde(default)]
    pub expires_in: Option<i64>,
}

impl CreateUrlRequest {
    /// Normalizes an empty `custom_code` to "not provided".
    pub fn custom_code(&self) -> Option<String> {
        self.custom_code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(String::from)
    }

    pub fn expires_in(&self) -> Option<chrono::Duration> {
        self.expires_in.map(chrono::Duration::hours)
    }
}

/// A created short link as returned to clients.
#[derive(Debug, Serialize, Deserialize)]
pub struct UrlResponse {
    pub id: i64,
    pub short_code: String,
    pub short_url: String,
    pub original_url: String,
    pub click_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl UrlResponse {
    pub fn new(link: ShortLink, short_url: String) -> Self {
        Self {
            id: link.id,
            short_code: link.code,
            short_url,
            original_url: link.target_url,
            click_count: link.click_count,
            expires_at: link.expires_at,
            created_at: link.created_at,
        }
    }
}
