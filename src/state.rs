//! Shared application state injected into handlers.

use std::sync::Arc;

use crate::application::services::{AuthService, LinkService, RedirectService, StatsService};

/// Services shared by all request handlers. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService>,
    pub redirect_service: Arc<RedirectService>,
    pub stats_service: Arc<StatsService>,
    pub auth_service: Arc<AuthService>,
    /// Trust `X-Forwarded-For` / `X-Real-IP` for the client address.
    pub behind_proxy: bool,
}

impl AppState {
    pub fn new(
        link_service: LinkService,
        redirect_service: RedirectService,
        stats_service: StatsService,
        auth_service: AuthService,
        behind_proxy: bool,
    ) -> Self {
        Self {
            link_service: Arc::new(link_service),
            redirect_service: Arc::new(redirect_service),
            stats_service: Arc::new(stats_service),
            auth_service: Arc::new(auth_service),
            behind_proxy,
        }
    }
}
