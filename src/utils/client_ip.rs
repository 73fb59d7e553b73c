//! Client metadata extraction from HTTP request headers.

use axum::http::{HeaderMap, HeaderName, header};
use std::net::{IpAddr, SocketAddr};

use crate::domain::click_event::ClickContext;

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
const X_REAL_IP: HeaderName = HeaderName::from_static("x-real-ip");

/// Determines the client IP address for a request.
///
/// When `behind_proxy` is set, the first parseable address in
/// `X-Forwarded-For` wins, then `X-Real-IP`. Otherwise, and when neither
/// header yields an address, the TCP peer address is used.
///
/// # Examples
///
/// ```ignore
/// let mut headers = HeaderMap::new();
/// headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
///
/// let ip = client_ip(&headers, "10.0.0.1:5000".parse().unwrap(), true);
/// assert_eq!(ip, "203.0.113.7");
/// ```
pub fn client_ip(headers: &HeaderMap, peer: SocketAddr, behind_proxy: bool) -> String {
    if behind_proxy {
        let forwarded = header_str(headers, &X_FORWARDED_FOR)
            .and_then(|v| v.split(',').find_map(|part| part.trim().parse::<IpAddr>().ok()));

        let real_ip =
            || header_str(headers, &X_REAL_IP).and_then(|v| v.trim().parse::<IpAddr>().ok());

        if let Some(ip) = forwarded.or_else(real_ip) {
            return ip.to_string();
        }
    }

    peer.ip().to_string()
}

/// Builds the [`ClickContext`] for a redirect. Missing or non-UTF-8 headers
/// become empty strings.
pub fn click_context(headers: &HeaderMap, peer: SocketAddr, behind_proxy: bool) -> ClickContext {
    ClickContext {
        user_agent: header_str(headers, &header::USER_AGENT)
            .unwrap_or_default()
            .to_string(),
        ip: client_ip(headers, peer, behind_proxy),
        referer: header_str(headers, &header::REFERER)
            .unwrap_or_default()
            .to_string(),
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
