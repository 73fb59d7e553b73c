//! Click statistics and analytics service.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use std::sync::Arc;
use tracing::warn;

use crate::domain::entities::ClickRecord;
use crate::domain::repositories::{CategoryCount, ClickRepository, DayCount, OverallStats};
use crate::error::AppError;

/// Window covered by the per-day breakdown.
pub const BY_DAY_WINDOW_DAYS: i64 = 30;

/// Number of referers returned in the per-link breakdown.
pub const TOP_REFERERS: i64 = 10;

pub const DEFAULT_RECENT_LIMIT: i64 = 20;
pub const MAX_RECENT_LIMIT: i64 = 100;

/// Per-link analytics.
///
/// Only `total_clicks` is guaranteed. Each breakdown is best-effort: if its
/// query fails, it is left empty and its field name is listed in
/// `partial_failures`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UrlStats {
    pub code: String,
    pub total_clicks: i64,
    pub by_day: Vec<DayCount>,
    pub by_device: Vec<CategoryCount>,
    pub by_browser: Vec<CategoryCount>,
    pub by_referer: Vec<CategoryCount>,
    pub partial_failures: Vec<&'static str>,
}

/// Read-only aggregation over recorded clicks.
///
/// Statistics reflect click records written by the consumer, not the
/// per-link `click_count`; the two can diverge when events are dropped.
pub struct StatsService {
    click_repository: Arc<dyn ClickRepository>,
}

impl StatsService {
    pub fn new(click_repository: Arc<dyn ClickRepository>) -> Self {
        Self { click_repository }
    }

    /// Aggregates the clicks recorded for `code`.
    ///
    /// An unknown code yields zero totals and empty breakdowns.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] only if the total count cannot be read.
    pub async fn get_url_stats(&self, code: &str) -> Result<UrlStats, AppError> {
        let since = Utc::now() - Duration::days(BY_DAY_WINDOW_DAYS);
        let repo = self.click_repository.as_ref();

        let (total, by_day, by_device, by_browser, by_referer) = tokio::join!(
            repo.count_by_code(code),
            repo.clicks_by_day(code, since),
            repo.clicks_by_device(code),
            repo.clicks_by_browser(code),
            repo.top_referers(code, TOP_REFERERS),
        );

        let mut stats = UrlStats {
            code: code.to_string(),
            total_clicks: total?,
            ..Default::default()
        };

        stats.by_day = best_effort(code, "by_day", by_day, &mut stats.partial_failures);
        stats.by_device = best_effort(code, "by_device", by_device, &mut stats.partial_failures);
        stats.by_browser =
            best_effort(code, "by_browser", by_browser, &mut stats.partial_failures);
        stats.by_referer =
            best_effort(code, "by_referer", by_referer, &mut stats.partial_failures);

        Ok(stats)
    }

    /// System-wide totals, with "today" starting at the current UTC midnight.
    pub async fn get_overall_stats(&self) -> Result<OverallStats, AppError> {
        self.click_repository
            .overall_stats(utc_midnight(Utc::now()))
            .await
    }

    /// The most recent clicks across all codes, newest first.
    ///
    /// `limit` defaults to 20 and is clamped to 1..=100.
    pub async fn get_recent_clicks(&self, limit: Option<i64>) -> Result<Vec<ClickRecord>, AppError> {
        let limit = limit
            .unwrap_or(DEFAULT_RECENT_LIMIT)
            .clamp(1, MAX_RECENT_LIMIT);
        self.click_repository.recent(limit).await
    }
}

fn best_effort<T>(
    code: &str,
    field: &'static str,
    result: Result<Vec<T>, AppError>,
    failures: &mut Vec<&'static str>,
) -> Vec<T> {
    match result {
        Ok(rows) => rows,
        Err(e) => {
            warn!(%code, field, error = %e, "Stats breakdown failed");
            failures.push(field);
            Vec::new()
        }
    }
}

fn utc_midnight(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockClickRepository;
    use chrono::{NaiveDate, TimeZone};
    use serde_json::json;

    fn category(value: &str, count: i64) -> CategoryCount {
        CategoryCount {
            value: value.to_string(),
            count,
        }
    }

    fn db_failure() -> AppError {
        AppError::internal("Database error", json!({}))
    }

    fn healthy_repo() -> MockClickRepository {
        let mut repo = MockClickRepository::new();
        repo.expect_count_by_code().returning(|_| Ok(3));
        repo.expect_clicks_by_day().returning(|_, _| {
            Ok(vec![DayCount {
                date: NaiveDate::from_ymd_opt(2026, 10, 14).unwrap(),
                clicks: 3,
            }])
        });
        repo.expect_clicks_by_device()
            .returning(|_| Ok(vec![category("Mobile", 2), category("Desktop", 1)]));
        repo.expect_clicks_by_browser()
            .returning(|_| Ok(vec![category("Safari", 2), category("Chrome", 1)]));
        repo
    }

    #[tokio::test]
    async fn test_url_stats_collects_all_breakdowns() {
        let mut repo = healthy_repo();
        repo.expect_top_referers()
            .withf(|_, limit| *limit == TOP_REFERERS)
            .returning(|_, _| Ok(vec![category("https://a.example", 2), category("", 1)]));

        let stats = StatsService::new(Arc::new(repo))
            .get_url_stats("promo1")
            .await
            .unwrap();

        assert_eq!(stats.code, "promo1");
        assert_eq!(stats.total_clicks, 3);
        assert_eq!(stats.by_day.len(), 1);
        assert_eq!(stats.by_device[0], category("Mobile", 2));
        assert_eq!(stats.by_referer.len(), 2);
        assert!(stats.partial_failures.is_empty());
    }

    #[tokio::test]
    async fn test_by_day_window_is_thirty_days() {
        let mut day_repo = MockClickRepository::new();
        day_repo.expect_count_by_code().returning(|_| Ok(0));
        day_repo
            .expect_clicks_by_day()
            .withf(|_, since| {
                let age = Utc::now() - *since;
                age >= Duration::days(30) && age < Duration::days(30) + Duration::minutes(1)
            })
            .times(1)
            .returning(|_, _| Ok(vec![]));
        day_repo.expect_clicks_by_device().returning(|_| Ok(vec![]));
        day_repo.expect_clicks_by_browser().returning(|_| Ok(vec![]));
        day_repo.expect_top_referers().returning(|_, _| Ok(vec![]));

        let stats = StatsService::new(Arc::new(day_repo))
            .get_url_stats("promo1")
            .await
            .unwrap();
        assert!(stats.partial_failures.is_empty());
    }

    #[tokio::test]
    async fn test_failed_breakdown_is_reported_not_fatal() {
        let mut repo = healthy_repo();
        repo.expect_top_referers().returning(|_, _| Err(db_failure()));

        let stats = StatsService::new(Arc::new(repo))
            .get_url_stats("promo1")
            .await
            .unwrap();

        assert_eq!(stats.total_clicks, 3);
        assert!(stats.by_referer.is_empty());
        assert_eq!(stats.by_device.len(), 2);
        assert_eq!(stats.partial_failures, vec!["by_referer"]);
    }

    #[tokio::test]
    async fn test_failed_total_is_fatal() {
        let mut repo = MockClickRepository::new();
        repo.expect_count_by_code().returning(|_| Err(db_failure()));
        repo.expect_clicks_by_day().returning(|_, _| Ok(vec![]));
        repo.expect_clicks_by_device().returning(|_| Ok(vec![]));
        repo.expect_clicks_by_browser().returning(|_| Ok(vec![]));
        repo.expect_top_referers().returning(|_, _| Ok(vec![]));

        let result = StatsService::new(Arc::new(repo)).get_url_stats("promo1").await;
        assert!(matches!(result, Err(AppError::Internal { .. })));
    }

    #[tokio::test]
    async fn test_unknown_code_yields_zero_stats() {
        let mut repo = MockClickRepository::new();
        repo.expect_count_by_code().returning(|_| Ok(0));
        repo.expect_clicks_by_day().returning(|_, _| Ok(vec![]));
        repo.expect_clicks_by_device().returning(|_| Ok(vec![]));
        repo.expect_clicks_by_browser().returning(|_| Ok(vec![]));
        repo.expect_top_referers().returning(|_, _| Ok(vec![]));

        let stats = StatsService::new(Arc::new(repo))
            .get_url_stats("never-clicked")
            .await
            .unwrap();

        assert_eq!(stats.total_clicks, 0);
        assert!(stats.by_day.is_empty());
        assert!(stats.partial_failures.is_empty());
    }

    #[tokio::test]
    async fn test_overall_stats_uses_utc_midnight() {
        let mut repo = MockClickRepository::new();
        repo.expect_overall_stats()
            .withf(|start| *start == utc_midnight(Utc::now()))
            .times(1)
            .returning(|_| Ok(OverallStats::default()));

        let stats = StatsService::new(Arc::new(repo))
            .get_overall_stats()
            .await
            .unwrap();
        assert_eq!(stats, OverallStats::default());
    }

    #[tokio::test]
    async fn test_recent_limit_defaults_and_clamps() {
        for (requested, expected) in [(None, 20), (Some(2), 2), (Some(0), 1), (Some(-5), 1), (Some(500), 100)] {
            let mut repo = MockClickRepository::new();
            repo.expect_recent()
                .withf(move |limit| *limit == expected)
                .times(1)
                .returning(|_| Ok(vec![]));

            StatsService::new(Arc::new(repo))
                .get_recent_clicks(requested)
                .await
                .unwrap();
        }
    }

    #[test]
    fn test_utc_midnight() {
        let now = Utc.with_ymd_and_hms(2026, 10, 14, 23, 59, 59).unwrap();
        assert_eq!(
            utc_midnight(now),
            Utc.with_ymd_and_hms(2026, 10, 14, 0, 0, 0).unwrap()
        );
    }
}
