//! Redirect resolution.

use std::sync::Arc;
use tracing::warn;

use crate::domain::click_event::{ClickContext, ClickEvent};
use crate::domain::click_publisher::ClickPublisher;
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

/// Resolves short codes to target URLs on the redirect hot path.
///
/// Each successful resolve increments the link's counter in the store and
/// hands a [`ClickEvent`] to the publisher queue. The caller never waits on
/// the event bus.
pub struct RedirectService {
    link_repository: Arc<dyn LinkRepository>,
    publisher: ClickPublisher,
}

impl RedirectService {
    pub fn new(link_repository: Arc<dyn LinkRepository>, publisher: ClickPublisher) -> Self {
        Self {
            link_repository,
            publisher,
        }
    }

    /// Returns the target URL for `code` and records the click.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the code is unknown or the link has
    /// expired. Returns [`AppError::Internal`] on database errors.
    pub async fn resolve(&self, code: &str, context: ClickContext) -> Result<String, AppError> {
        let link = self
            .link_repository
            .find_by_code(code)
            .await?
            .filter(|link| !link.is_expired())
            .ok_or_else(|| AppError::not_found(code))?;

        if !self.link_repository.increment_click_count(code).await? {
            return Err(AppError::not_found(code));
        }

        if let Err(e) = self.publisher.emit(ClickEvent::now(code, context)) {
            metrics::counter!("click_events_dropped_total").increment(1);
            warn!(%code, error = %e, "Click event not queued");
        }

        Ok(link.target_url)
    }
}
