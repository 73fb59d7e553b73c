//! HTTP server initialization and runtime setup.
//!
//! Handles the database pool, event bus selection, the click pipeline tasks
//! and the Axum server lifecycle including graceful shutdown.

use crate::application::services::{AuthService, LinkService, RedirectService, StatsService};
use crate::config::Config;
use crate::domain::click_consumer::ClickConsumer;
use crate::domain::click_publisher::{ClickPublisher, PublisherSettings, run_click_publisher};
use crate::domain::token_validator::TokenValidator;
use crate::infrastructure::auth::HttpTokenValidator;
use crate::infrastructure::bus::{EventBus, InMemoryEventBus, RedisEventBus};
use crate::infrastructure::persistence::{PgClickRepository, PgLinkRepository};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Upper bound on waiting for queued click events to drain at shutdown.
const PUBLISHER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Time the consumer gets to record the last published events before it is
/// cancelled.
pub const CONSUMER_SETTLE: Duration = Duration::from_millis(250);

/// Runs the service with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool and migrations
/// - Event bus (Redis, or in-process fallback)
/// - Click publisher task and click consumer task
/// - Axum HTTP server
///
/// On Ctrl-C or SIGTERM the server stops accepting connections, the publisher
/// drains what is queued, and then the consumer is cancelled and unsubscribes.
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - The click consumer cannot subscribe
/// - Server bind fails or the server exits with an error
pub async fn run(config: Config) -> Result<()> {
    let pool = connect_database(&config).await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    let bus = connect_event_bus(&config).await;

    let pool = Arc::new(pool);
    let link_repository = Arc::new(PgLinkRepository::new(pool.clone()));
    let click_repository = Arc::new(PgClickRepository::new(pool.clone()));

    let (publisher, click_rx) = ClickPublisher::channel(config.click_queue_capacity);
    let publisher_task = tokio::spawn(run_click_publisher(
        click_rx,
        bus.clone(),
        config.click_topic.clone(),
        PublisherSettings {
            concurrency: config.click_publish_concurrency,
            timeout: config.publish_timeout(),
        },
    ));

    let shutdown = CancellationToken::new();
    let consumer_task = ClickConsumer::new(
        bus.clone(),
        click_repository.clone(),
        config.click_topic.clone(),
    )
    .start(shutdown.child_token())
    .await
    .context("Failed to start click consumer")?;

    let auth_service = match config.auth_service_url.as_deref() {
        Some(url) => {
            let validator: Arc<dyn TokenValidator> = Arc::new(HttpTokenValidator::new(url)?);
            tracing::info!(%url, "Token validation enabled");
            AuthService::new(Some(validator))
        }
        None => AuthService::disabled(),
    };

    let state = AppState::new(
        LinkService::new(link_repository.clone(), config.base_url.clone()),
        RedirectService::new(link_repository, publisher),
        StatsService::new(click_repository),
        auth_service,
        config.behind_proxy,
    );

    let app = app_router(state);

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on http://{addr}");

    let serve_result = axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await;

    tracing::info!("HTTP server stopped, shutting down click pipeline");
    // The router owned the last publisher handle, so the publisher is now
    // draining its queue.
    shutdown_click_pipeline(publisher_task, consumer_task, &shutdown, PUBLISHER_DRAIN_TIMEOUT)
        .await;

    serve_result.context("HTTP server error")?;
    Ok(())
}

/// Stops the click pipeline once every `ClickPublisher` handle is dropped.
///
/// Waits up to `drain_timeout` for the publisher to flush its queue while the
/// consumer is still subscribed, gives the consumer [`CONSUMER_SETTLE`] to
/// record what was just published, then cancels `shutdown` and waits for the
/// consumer to unsubscribe.
pub async fn shutdown_click_pipeline(
    publisher_task: JoinHandle<()>,
    consumer_task: JoinHandle<()>,
    shutdown: &CancellationToken,
    drain_timeout: Duration,
) {
    match tokio::time::timeout(drain_timeout, publisher_task).await {
        Ok(Ok(())) => tokio::time::sleep(CONSUMER_SETTLE).await,
        Ok(Err(e)) => tracing::error!(error = %e, "Click publisher task panicked"),
        Err(_) => tracing::warn!("Click publisher did not drain in time, pending events lost"),
    }

    shutdown.cancel();
    if let Err(e) = consumer_task.await {
        tracing::error!(error = %e, "Click consumer task panicked");
    }
}

async fn connect_database(config: &Config) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!(
        max_connections = config.db_max_connections,
        "Connected to database"
    );
    Ok(pool)
}

/// Selects the event bus. An unreachable Redis degrades to the in-process
/// bus, which only delivers within this process.
async fn connect_event_bus(config: &Config) -> Arc<dyn EventBus> {
    let Some(redis_url) = &config.redis_url else {
        tracing::info!("Event bus: in-process (Redis not configured)");
        return Arc::new(InMemoryEventBus::default());
    };

    match RedisEventBus::connect(redis_url).await {
        Ok(bus) => {
            tracing::info!("Event bus: Redis");
            Arc::new(bus)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to connect to Redis, using in-process event bus");
            Arc::new(InMemoryEventBus::default())
        }
    }
}

/// Completes on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl-C, shutting down gracefully"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down gracefully"),
    }
}
