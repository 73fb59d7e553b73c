//! DTOs for click statistics.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::application::services::UrlStats;
use crate::domain::entities::ClickRecord;
use crate::domain::repositories::{CategoryCount, DayCount, OverallStats};

/// Query parameters for `GET /api/stats/recent`.
///
/// `limit` is kept raw so a value that is not an integer falls back to the
/// default instead of rejecting the request.
#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<String>,
}

impl RecentQuery {
    pub fn limit(&self) -> Option<i64> {
        self.limit.as_deref().and_then(|v| v.trim().parse().ok())
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct DayStats {
    pub date: NaiveDate,
    pub clicks: i64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct DeviceStats {
    pub device: String,
    pub count: i64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct BrowserStats {
    pub browser: String,
    pub count: i64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct RefererStats {
    pub referer: String,
    pub count: i64,
}

/// Per-link analytics.
///
/// `partial_failures` names the breakdowns that could not be computed; those
/// fields are empty rather than missing.
#[derive(Debug, Serialize, Deserialize)]
pub struct UrlStatsResponse {
    pub short_code: String,
    pub total_clicks: i64,
    pub by_day: Vec<DayStats>,
    pub by_device: Vec<DeviceStats>,
    pub by_browser: Vec<BrowserStats>,
    pub by_referer: Vec<RefererStats>,
    pub partial_failures: Vec<String>,
}

impl From<UrlStats> for UrlStatsResponse {
    fn from(s: UrlStats) -> Self {
        Self {
            short_code: s.code,
            total_clicks: s.total_clicks,
            by_day: s
                .by_day
                .into_iter()
                .map(|DayCount { date, clicks }| DayStats { date, clicks })
                .collect(),
            by_device: s
                .by_device
                .into_iter()
                .map(|CategoryCount { value, count }| DeviceStats { device: value, count })
                .collect(),
            by_browser: s
                .by_browser
                .into_iter()
                .map(|CategoryCount { value, count }| BrowserStats { browser: value, count })
                .collect(),
            by_referer: s
                .by_referer
                .into_iter()
                .map(|CategoryCount { value, count }| RefererStats { referer: value, count })
                .collect(),
            partial_failures: s.partial_failures.into_iter().map(String::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct OverallStatsResponse {
    pub total_urls: i64,
    pub total_clicks: i64,
    pub today_clicks: i64,
    pub active_urls: i64,
}

impl From<OverallStats> for OverallStatsResponse {
    fn from(s: OverallStats) -> Self {
        Self {
            total_urls: s.total_urls,
            total_clicks: s.total_clicks,
            today_clicks: s.today_clicks,
            active_urls: s.active_urls,
        }
    }
}

/// One recorded click.
#[derive(Debug, Serialize, Deserialize)]
pub struct ClickResponse {
    pub id: i64,
    pub short_code: String,
    pub user_agent: String,
    pub ip: String,
    pub referer: String,
    pub device: String,
    pub browser: String,
    pub created_at: DateTime<Utc>,
}

impl From<ClickRecord> for ClickResponse {
    fn from(c: ClickRecord) -> Self {
        Self {
            id: c.id,
            short_code: c.code,
            user_agent: c.user_agent,
            ip: c.ip,
            referer: c.referer,
            device: c.device,
            browser: c.browser,
            created_at: c.created_at,
        }
    }
}
