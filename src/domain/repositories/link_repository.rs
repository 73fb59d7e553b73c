//! Repository trait for short link data access.

use crate::domain::entities::{NewShortLink, ShortLink};
use crate::error::AppError;
use async_trait::async_trait;

/// Store operations needed by code allocation and redirect resolution.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Inserts a new short link with `click_count = 0`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::DuplicateCode`] if the unique constraint on `code`
    /// rejects the insert. This is the authoritative uniqueness check.
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn insert(&self, new_link: NewShortLink) -> Result<ShortLink, AppError>;

    /// Finds a link by its short code, regardless of expiry.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_code(&self, code: &str) -> Result<Option<ShortLink>, AppError>;

    /// Returns whether any link currently uses `code`.
    ///
    /// Only a fast-path hint: the answer can be stale by the time an insert runs.
    async fn code_exists(&self, code: &str) -> Result<bool, AppError>;

    /// Atomically adds one to `click_count` for `code`.
    ///
    /// Implementations must use a single increment expression so concurrent
    /// redirects never lose updates.
    ///
    /// # Returns
    ///
    /// `Ok(true)` if a row was updated, `Ok(false)` if the code no longer exists.
    async fn increment_click_count(&self, code: &str) -> Result<bool, AppError>;
}
