#![allow(dead_code)]

use async_trait::async_trait;
use axum::extract::connect_info::MockConnectInfo;
use axum_test::TestServer;
use chrono::{DateTime, Utc};
use click_relay::application::services::{AuthService, LinkService, RedirectService, StatsService};
use click_relay::domain::click_event::ClickEvent;
use click_relay::domain::click_publisher::ClickPublisher;
use click_relay::domain::entities::{ClickRecord, NewClickRecord, NewShortLink, ShortLink};
use click_relay::domain::repositories::{
    CategoryCount, ClickRepository, DayCount, LinkRepository, OverallStats,
};
use click_relay::error::AppError;
use click_relay::routes::router;
use click_relay::state::AppState;
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

pub const BASE_URL: &str = "http://localhost:8082";
pub const PEER: &str = "127.0.0.1:12345";

/// In-memory store implementing both repository traits.
///
/// Mirrors the PostgreSQL semantics the services rely on: unique codes on
/// insert, an atomic counter increment, and the ordering rules of the
/// aggregate queries.
#[derive(Default)]
pub struct InMemoryStore {
    links: Mutex<HashMap<String, ShortLink>>,
    clicks: Mutex<Vec<ClickRecord>>,
    next_id: Mutex<i64>,
    pub fail_referers: AtomicBool,
    pub fail_click_inserts: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn next_id(&self) -> i64 {
        let mut id = self.next_id.lock().unwrap();
        *id += 1;
        *id
    }

    pub fn seed_link(&self, code: &str, target_url: &str, expires_at: Option<DateTime<Utc>>) {
        let link = ShortLink {
            id: self.next_id(),
            code: code.to_string(),
            target_url: target_url.to_string(),
            owner: None,
            click_count: 0,
            expires_at,
            created_at: Utc::now(),
        };
        self.links.lock().unwrap().insert(code.to_string(), link);
    }

    pub fn link(&self, code: &str) -> Option<ShortLink> {
        self.links.lock().unwrap().get(code).cloned()
    }

    pub fn click_records(&self) -> Vec<ClickRecord> {
        self.clicks.lock().unwrap().clone()
    }

    fn db_error() -> AppError {
        AppError::internal("Database error", json!({}))
    }

    fn grouped(&self, code: &str, field: impl Fn(&ClickRecord) -> String) -> Vec<CategoryCount> {
        let mut counts: BTreeMap<String, i64> = BTreeMap::new();
        for c in self.clicks.lock().unwrap().iter().filter(|c| c.code == code) {
            *counts.entry(field(c)).or_default() += 1;
        }

        let mut rows: Vec<CategoryCount> = counts
            .into_iter()
            .map(|(value, count)| CategoryCount { value, count })
            .collect();
        // BTreeMap iteration is ascending by value, so a stable sort keeps ties ordered.
        rows.sort_by(|a, b| b.count.cmp(&a.count));
        rows
    }
}

#[async_trait]
impl LinkRepository for InMemoryStore {
    async fn insert(&self, new_link: NewShortLink) -> Result<ShortLink, AppError> {
        let id = self.next_id();
        let mut links = self.links.lock().unwrap();
        if links.contains_key(&new_link.code) {
            return Err(AppError::duplicate_code(new_link.code));
        }

        let link = ShortLink {
            id,
            code: new_link.code.clone(),
            target_url: new_link.target_url,
            owner: new_link.owner,
            click_count: 0,
            expires_at: new_link.expires_at,
            created_at: Utc::now(),
        };
        links.insert(new_link.code, link.clone());
        Ok(link)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<ShortLink>, AppError> {
        Ok(self.link(code))
    }

    async fn code_exists(&self, code: &str) -> Result<bool, AppError> {
        Ok(self.links.lock().unwrap().contains_key(code))
    }

    async fn increment_click_count(&self, code: &str) -> Result<bool, AppError> {
        match self.links.lock().unwrap().get_mut(code) {
            Some(link) => {
                link.click_count += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl ClickRepository for InMemoryStore {
    async fn insert(&self, record: NewClickRecord) -> Result<ClickRecord, AppError> {
        if self.fail_click_inserts.load(Ordering::SeqCst) {
            return Err(Self::db_error());
        }

        let stored = ClickRecord {
            id: self.next_id(),
            code: record.code,
            user_agent: record.user_agent,
            ip: record.ip,
            referer: record.referer,
            device: record.device.to_string(),
            browser: record.browser.to_string(),
            created_at: record.created_at,
        };
        self.clicks.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn count_by_code(&self, code: &str) -> Result<i64, AppError> {
        Ok(self
            .clicks
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.code == code)
            .count() as i64)
    }

    async fn clicks_by_day(
        &self,
        code: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<DayCount>, AppError> {
        let mut days = BTreeMap::new();
        for c in self
            .clicks
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.code == code && c.created_at >= since)
        {
            *days.entry(c.created_at.date_naive()).or_insert(0) += 1;
        }

        Ok(days
            .into_iter()
            .map(|(date, clicks)| DayCount { date, clicks })
            .collect())
    }

    async fn clicks_by_device(&self, code: &str) -> Result<Vec<CategoryCount>, AppError> {
        Ok(self.grouped(code, |c| c.device.clone()))
    }

    async fn clicks_by_browser(&self, code: &str) -> Result<Vec<CategoryCount>, AppError> {
        Ok(self.grouped(code, |c| c.browser.clone()))
    }

    async fn top_referers(
        &self,
        code: &str,
        limit: i64,
    ) -> Result<Vec<CategoryCount>, AppError> {
        if self.fail_referers.load(Ordering::SeqCst) {
            return Err(Self::db_error());
        }

        let mut rows = self.grouped(code, |c| c.referer.clone());
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn overall_stats(&self, today_start: DateTime<Utc>) -> Result<OverallStats, AppError> {
        let clicks = self.clicks.lock().unwrap();
        let mut all = std::collections::HashSet::new();
        let mut today = std::collections::HashSet::new();
        let mut today_clicks = 0;

        for c in clicks.iter() {
            all.insert(c.code.as_str());
            if c.created_at >= today_start {
                today.insert(c.code.as_str());
                today_clicks += 1;
            }
        }

        Ok(OverallStats {
            total_urls: all.len() as i64,
            total_clicks: clicks.len() as i64,
            today_clicks,
            active_urls: today.len() as i64,
        })
    }

    async fn recent(&self, limit: i64) -> Result<Vec<ClickRecord>, AppError> {
        let mut rows = self.click_records();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }
}

/// Application state over `store`, plus the receiving end of the click queue.
pub fn create_test_state(
    store: Arc<InMemoryStore>,
    queue_capacity: usize,
) -> (AppState, mpsc::Receiver<ClickEvent>) {
    let (publisher, rx) = ClickPublisher::channel(queue_capacity);

    let state = AppState::new(
        LinkService::new(store.clone(), BASE_URL),
        RedirectService::new(store.clone(), publisher),
        StatsService::new(store),
        AuthService::disabled(),
        false,
    );

    (state, rx)
}

/// Full application router over `state` with a fixed peer address.
pub fn create_test_server(state: AppState) -> TestServer {
    let peer: SocketAddr = PEER.parse().unwrap();
    let app = router(state).layer(MockConnectInfo(peer));
    TestServer::new(app).unwrap()
}

/// Drains every event currently queued.
pub fn drain(rx: &mut mpsc::Receiver<ClickEvent>) -> Vec<ClickEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
