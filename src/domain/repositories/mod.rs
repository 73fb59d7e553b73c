//! Repository trait definitions for the domain layer.
//!
//! Traits define the contract for store operations; PostgreSQL
//! implementations live in `crate::infrastructure::persistence`, and mock
//! implementations are generated via `mockall` for unit tests.
//!
//! - [`LinkRepository`] - Short link allocation, lookup and click counter
//! - [`ClickRepository`] - Click records and analytics aggregates

pub mod click_repository;
pub mod link_repository;

pub use click_repository::{CategoryCount, ClickRepository, DayCount, OverallStats};
pub use link_repository::LinkRepository;

#[cfg(test)]
pub use click_repository::MockClickRepository;
#[cfg(test)]
pub use link_repository::MockLinkRepository;
