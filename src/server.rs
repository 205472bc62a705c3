//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, job queue setup, worker spawning, and Axum server lifecycle.

use crate::application::worker::{NotificationWorker, WelcomeMailHandler};
use crate::config::Config;
use crate::domain::clock::SystemClock;
use crate::domain::jobs::WELCOME_MAIL_JOB;
use crate::infrastructure::mail::{HttpMailTransport, LogMailTransport, MailTransport};
use crate::infrastructure::queue::{JobQueue, MemoryJobQueue, RedisJobQueue};
use crate::routes::app_router;
use crate::state::{AppState, Repositories};

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool
/// - Apply migrations
/// - Redis job queue (or in-memory fallback)
/// - Mail transport and the notification worker
/// - Axum HTTP server
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let queue: Arc<dyn JobQueue> = if let Some(redis_url) = &config.redis_url {
        match RedisJobQueue::connect(redis_url, &config.queue_name).await {
            Ok(redis) => {
                tracing::info!("Job queue enabled (Redis)");
                Arc::new(redis)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to connect to Redis: {}. Using in-memory queue, jobs will not survive a restart.",
                    e
                );
                Arc::new(MemoryJobQueue::new())
            }
        }
    } else {
        tracing::warn!("REDIS_URL not set. Using in-memory queue, jobs will not survive a restart.");
        Arc::new(MemoryJobQueue::new())
    };

    let mail: Arc<dyn MailTransport> = match (&config.mail_api_url, &config.mail_api_key) {
        (Some(url), Some(key)) => Arc::new(
            HttpMailTransport::new(url.clone(), key.clone(), config.mail_from.clone())
                .context("Failed to build mail client")?,
        ),
        _ => {
            tracing::info!("Mail API not configured, welcome mails are logged only");
            Arc::new(LogMailTransport::new())
        }
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = NotificationWorker::new(queue.clone(), config.worker_config())
        .register(WELCOME_MAIL_JOB, Arc::new(WelcomeMailHandler::new(mail)));
    let worker_handle = tokio::spawn(worker.run(shutdown_rx));
    tracing::info!("Notification worker started");

    let state = AppState::new(
        Repositories::postgres(Arc::new(pool)),
        queue,
        Arc::new(SystemClock),
        config.token_signing_secret.clone(),
        config.request_timeout(),
    );

    let app = app_router(state, config.behind_proxy);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("HTTP server stopped, waiting for worker");
    let _ = shutdown_tx.send(true);
    if let Err(e) = worker_handle.await {
        tracing::error!(error = %e, "Notification worker terminated abnormally");
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
