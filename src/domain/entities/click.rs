//! Click record entity and its derived classification fields.

use chrono::{DateTime, Utc};
use std::fmt;

use crate::domain::click_event::ClickEvent;
use crate::domain::user_agent::{classify_browser, classify_device};

/// Device class derived from a user agent string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Device {
    Mobile,
    Tablet,
    Desktop,
}

impl Device {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mobile => "Mobile",
            Self::Tablet => "Tablet",
            Self::Desktop => "Desktop",
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Browser family derived from a user agent string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Browser {
    Chrome,
    Firefox,
    Safari,
    Edge,
    Opera,
    Other,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chrome => "Chrome",
            Self::Firefox => "Firefox",
            Self::Safari => "Safari",
            Self::Edge => "Edge",
            Self::Opera => "Opera",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted, classified click.
///
/// `device` and `browser` are kept as the stored strings: the table is an
/// append-only fact log and rows are returned as written.
#[derive(Debug, Clone, PartialEq)]
pub struct ClickRecord {
    pub id: i64,
    pub code: String,
    pub user_agent: String,
    pub ip: String,
    pub referer: String,
    pub device: String,
    pub browser: String,
    pub created_at: DateTime<Utc>,
}

/// Input data for recording a click.
///
/// `created_at` carries the time of the redirect, taken from the event.
#[derive(Debug, Clone, PartialEq)]
pub struct NewClickRecord {
    pub code: String,
    pub user_agent: String,
    pub ip: String,
    pub referer: String,
    pub device: Device,
    pub browser: Browser,
    pub created_at: DateTime<Utc>,
}

impl From<ClickEvent> for NewClickRecord {
    fn from(event: ClickEvent) -> Self {
        let device = classify_device(&event.user_agent);
        let browser = classify_browser(&event.user_agent);

        Self {
            code: event.code,
            user_agent: event.user_agent,
            ip: event.ip,
            referer: event.referer,
            device,
            browser,
            created_at: event.timestamp,
        }
    }
}
