//! PostgreSQL implementation of click repository.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{ClickRecord, NewClickRecord};
use crate::domain::repositories::{CategoryCount, ClickRepository, DayCount, OverallStats};
use crate::error::AppError;

#[derive(sqlx::FromRow)]
struct ClickRow {
    id: i64,
    code: String,
    user_agent: String,
    ip: String,
    referer: String,
    device: String,
    browser: String,
    created_at: DateTime<Utc>,
}

impl From<ClickRow> for ClickRecord {
    fn from(r: ClickRow) -> Self {
        ClickRecord {
            id: r.id,
            code: r.code,
            user_agent: r.user_agent,
            ip: r.ip,
            referer: r.referer,
            device: r.device,
            browser: r.browser,
            created_at: r.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct DayRow {
    date: NaiveDate,
    clicks: i64,
}

#[derive(sqlx::FromRow)]
struct CategoryRow {
    value: String,
    count: i64,
}

#[derive(sqlx::FromRow)]
struct OverallRow {
    total_urls: i64,
    total_clicks: i64,
    today_clicks: i64,
    active_urls: i64,
}

/// Which categorical column a grouped query runs over.
///
/// Column names are never interpolated from caller input.
#[derive(Clone, Copy)]
enum Category {
    Device,
    Browser,
}

impl Category {
    fn column(self) -> &'static str {
        match self {
            Self::Device => "device",
            Self::Browser => "browser",
        }
    }
}

/// PostgreSQL repository for click records and analytics aggregates.
pub struct PgClickRepository {
    pool: Arc<PgPool>,
}

impl PgClickRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    async fn grouped_by(
        &self,
        category: Category,
        code: &str,
    ) -> Result<Vec<CategoryCount>, AppError> {
        let column = category.column();
        let sql = format!(
            r#"
            SELECT {column} AS value, COUNT(*) AS count
            FROM click_records
            WHERE code = $1
            GROUP BY {column}
            ORDER BY count DESC, value ASC
            "#
        );

        let rows = sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(code)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| CategoryCount {
                value: r.value,
                count: r.count,
            })
            .collect())
    }
}

#[async_trait]
impl ClickRepository for PgClickRepository {
    async fn insert(&self, record: NewClickRecord) -> Result<ClickRecord, AppError> {
        let row = sqlx::query_as::<_, ClickRow>(
            r#"
            INSERT INTO click_records (code, user_agent, ip, referer, device, browser, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, code, user_agent, ip, referer, device, browser, created_at
            "#,
        )
        .bind(&record.code)
        .bind(&record.user_agent)
        .bind(&record.ip)
        .bind(&record.referer)
        .bind(record.device.as_str())
        .bind(record.browser.as_str())
        .bind(record.created_at)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row.into())
    }

    async fn count_by_code(&self, code: &str) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM click_records WHERE code = $1")
            .bind(code)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count)
    }

    async fn clicks_by_day(
        &self,
        code: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<DayCount>, AppError> {
        let rows = sqlx::query_as::<_, DayRow>(
            r#"
            SELECT (created_at AT TIME ZONE 'UTC')::date AS date, COUNT(*) AS clicks
            FROM click_records
            WHERE code = $1 AND created_at >= $2
            GROUP BY 1
            ORDER BY 1 ASC
            "#,
        )
        .bind(code)
        .bind(since)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| DayCount {
                date: r.date,
                clicks: r.clicks,
            })
            .collect())
    }

    async fn clicks_by_device(&self, code: &str) -> Result<Vec<CategoryCount>, AppError> {
        self.grouped_by(Category::Device, code).await
    }

    async fn clicks_by_browser(&self, code: &str) -> Result<Vec<CategoryCount>, AppError> {
        self.grouped_by(Category::Browser, code).await
    }

    async fn top_referers(
        &self,
        code: &str,
        limit: i64,
    ) -> Result<Vec<CategoryCount>, AppError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            r#"
            SELECT referer AS value, COUNT(*) AS count
            FROM click_records
            WHERE code = $1
            GROUP BY referer
            ORDER BY count DESC, value ASC
            LIMIT $2
            "#,
        )
        .bind(code)
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| CategoryCount {
                value: r.value,
                count: r.count,
            })
            .collect())
    }

    async fn overall_stats(&self, today_start: DateTime<Utc>) -> Result<OverallStats, AppError> {
        let row = sqlx::query_as::<_, OverallRow>(
            r#"
            SELECT
                COUNT(DISTINCT code) AS total_urls,
                COUNT(*) AS total_clicks,
                COUNT(*) FILTER (WHERE created_at >= $1) AS today_clicks,
                COUNT(DISTINCT code) FILTER (WHERE created_at >= $1) AS active_urls
            FROM click_records
            "#,
        )
        .bind(today_start)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(OverallStats {
            total_urls: row.total_urls,
            total_clicks: row.total_clicks,
            today_clicks: row.today_clicks,
            active_urls: row.active_urls,
        })
    }

    async fn recent(&self, limit: i64) -> Result<Vec<ClickRecord>, AppError> {
        let rows = sqlx::query_as::<_, ClickRow>(
            r#"
            SELECT id, code, user_agent, ip, referer, device, browser, created_at
            FROM click_records
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(ClickRecord::from).collect())
    }
}
