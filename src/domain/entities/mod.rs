//! Core domain entities.
//!
//! - [`ShortLink`] - A short code mapped to a target URL
//! - [`ClickRecord`] - A classified, persisted click
//!
//! Each entity has a matching `New*` struct used for inserts.

pub mod click;
pub mod link;

pub use click::{Browser, ClickRecord, Device, NewClickRecord};
pub use link::{NewShortLink, ShortLink};
