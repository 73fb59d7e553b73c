//! Short link entity.

use chrono::{DateTime, Utc};

/// A persisted mapping from a short code to its target URL.
///
/// `click_count` only ever grows; it is advanced by the store's atomic
/// increment on every completed redirect and is unrelated to how many click
/// records the analytics consumer managed to write.
#[derive(Debug, Clone, PartialEq)]
pub struct ShortLink {
    pub id: i64,
    pub code: String,
    pub target_url: String,
    pub owner: Option<String>,
    pub click_count: i64,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ShortLink {
    /// Returns true if the link has an expiry at or before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|e| e <= now)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Input data for inserting a new short link.
#[derive(Debug, Clone, PartialEq)]
pub struct NewShortLink {
    pub code: String,
    pub target_url: String,
    pub owner: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}
