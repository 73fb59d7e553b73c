//! User agent classification.
//!
//! Rules are case-insensitive substring checks evaluated in a fixed order,
//! so the same user agent always yields the same device and browser.

use crate::domain::entities::{Browser, Device};

pub fn classify_device(user_agent: &str) -> Device {
    let ua = user_agent.to_lowercase();

    if ua.contains("mobile") || ua.contains("android") {
        Device::Mobile
    } else if ua.contains("tablet") || ua.contains("ipad") {
        Device::Tablet
    } else {
        Device::Desktop
    }
}

pub fn classify_browser(user_agent: &str) -> Browser {
    let ua = user_agent.to_lowercase();

    if ua.contains("chrome") && !ua.contains("edge") {
        Browser::Chrome
    } else if ua.contains("firefox") {
        Browser::Firefox
    } else if ua.contains("safari") && !ua.contains("chrome") {
        Browser::Safari
    } else if ua.contains("edge") {
        Browser::Edge
    } else if ua.contains("opera") {
        Browser::Opera
    } else {
        Browser::Other
    }
}
