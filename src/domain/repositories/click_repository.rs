//! Repository trait for click records and their aggregates.

use crate::domain::entities::{ClickRecord, NewClickRecord};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

/// Number of clicks recorded on one UTC calendar date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayCount {
    pub date: NaiveDate,
    pub clicks: i64,
}

/// Number of clicks sharing one value of a categorical field
/// (device, browser or referer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCount {
    pub value: String,
    pub count: i64,
}

/// System-wide click totals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverallStats {
    /// Distinct codes with at least one click record.
    pub total_urls: i64,
    pub total_clicks: i64,
    pub today_clicks: i64,
    /// Distinct codes clicked since the start of the current UTC day.
    pub active_urls: i64,
}

/// Persistence and aggregate queries over click records.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgClickRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
///
/// # Examples
///
/// See integration tests: `tests/repository_click.rs`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClickRepository: Send + Sync {
    /// Appends a click record. No referential check against short links is made.
    async fn insert(&self, record: NewClickRecord) -> Result<ClickRecord, AppError>;

    /// Counts all click records for `code`.
    async fn count_by_code(&self, code: &str) -> Result<i64, AppError>;

    /// Clicks per UTC date at or after `since`, ascending by date.
    ///
    /// Dates without clicks are omitted.
    async fn clicks_by_day(
        &self,
        code: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<DayCount>, AppError>;

    /// Clicks per device class, descending by count.
    async fn clicks_by_device(&self, code: &str) -> Result<Vec<CategoryCount>, AppError>;

    /// Clicks per browser family, descending by count.
    async fn clicks_by_browser(&self, code: &str) -> Result<Vec<CategoryCount>, AppError>;

    /// Most frequent referers, descending by count, ties ordered by referer.
    async fn top_referers(&self, code: &str, limit: i64)
    -> Result<Vec<CategoryCount>, AppError>;

    /// System-wide totals, with "today" meaning at or after `today_start`.
    async fn overall_stats(&self, today_start: DateTime<Utc>) -> Result<OverallStats, AppError>;

    /// The `limit` most recent records across all codes, newest first.
    async fn recent(&self, limit: i64) -> Result<Vec<ClickRecord>, AppError>;
}
