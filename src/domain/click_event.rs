//! Click event carried over the event bus.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A transient message describing one completed redirect.
///
/// Serialized as JSON on the click topic:
///
/// ```json
/// {
///   "short_code": "promo1",
///   "user_agent": "Mozilla/5.0 ...",
///   "ip": "203.0.113.7",
///   "referer": "https://news.example.com/",
///   "timestamp": "2026-10-14T09:30:00Z"
/// }
/// ```
///
/// Events have no identity. Losing or duplicating one only affects analytics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickEvent {
    #[serde(rename = "short_code")]
    pub code: String,
    #[serde(default)]
    pub user_agent: String,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub referer: String,
    pub timestamp: DateTime<Utc>,
}

/// Request metadata captured by the redirect handler.
///
/// Missing headers are represented as empty strings, matching the wire format.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClickContext {
    pub user_agent: String,
    pub ip: String,
    pub referer: String,
}

impl ClickEvent {
    /// Builds an event for `code` stamped with the current time.
    pub fn now(code: impl Into<String>, context: ClickContext) -> Self {
        Self {
            code: code.into(),
            user_agent: context.user_agent,
            ip: context.ip,
            referer: context.referer,
            timestamp: Utc::now(),
        }
    }

    /// Encodes the event as its JSON wire payload.
    pub fn to_payload(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decodes an event from a JSON wire payload.
    pub fn from_payload(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_wire_field_names() {
        let event = ClickEvent {
            code: "promo1".to_string(),
            user_agent: "curl/8.0".to_string(),
            ip: "127.0.0.1".to_string(),
            referer: String::new(),
            timestamp: Utc.with_ymd_and_hms(2026, 10, 14, 9, 30, 0).unwrap(),
        };

        let value: serde_json::Value = serde_json::from_str(&event.to_payload().unwrap()).unwrap();

        assert_eq!(value["short_code"], "promo1");
        assert_eq!(value["user_agent"], "curl/8.0");
        assert_eq!(value["ip"], "127.0.0.1");
        assert_eq!(value["referer"], "");
        assert_eq!(value["timestamp"], "2026-10-14T09:30:00Z");
    }

    #[test]
    fn test_decode_rfc3339_with_offset_and_fraction() {
        let payload = r#"{
            "short_code": "abc123",
            "user_agent": "Mozilla/5.0",
            "ip": "10.0.0.1",
            "referer": "https://google.com",
            "timestamp": "2026-10-14T11:30:00.123456789+02:00"
        }"#;

        let event = ClickEvent::from_payload(payload).unwrap();

        assert_eq!(event.code, "abc123");
        assert_eq!(
            event.timestamp.timestamp(),
            Utc.with_ymd_and_hms(2026, 10, 14, 9, 30, 0)
                .unwrap()
                .timestamp()
        );
    }

    #[test]
    fn test_decode_tolerates_missing_metadata() {
        let payload = r#"{"short_code":"xyz","timestamp":"2026-10-14T09:30:00Z"}"#;

        let event = ClickEvent::from_payload(payload).unwrap();

        assert_eq!(event.code, "xyz");
        assert!(event.user_agent.is_empty());
        assert!(event.referer.is_empty());
    }

    #[test]
    fn test_decode_rejects_malformed_payloads() {
        assert!(ClickEvent::from_payload("not json").is_err());
        assert!(ClickEvent::from_payload(r#"{"user_agent":"x"}"#).is_err());
        assert!(ClickEvent::from_payload(r#"{"short_code":"a","timestamp":"yesterday"}"#).is_err());
    }

    #[test]
    fn test_now_copies_context() {
        let context = ClickContext {
            user_agent: "Safari".to_string(),
            ip: "1.1.1.1".to_string(),
            referer: "https://example.com".to_string(),
        };

        let before = Utc::now();
        let event = ClickEvent::now("code1", context.clone());

        assert_eq!(event.code, "code1");
        assert_eq!(event.user_agent, context.user_agent);
        assert_eq!(event.ip, context.ip);
        assert_eq!(event.referer, context.referer);
        assert!(event.timestamp >= before);
    }
}
