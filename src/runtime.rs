//! Engine bootstrap and shutdown.
//!
//! Handles the database pool, migrations, click worker spawning, and wiring
//! of the link service.

use anyhow::{Context, Result};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::application::services::{ClickDispatch, ClickRecorder, LinkService};
use crate::config::{self, ClickRecording, Config};
use crate::domain::click_worker::run_click_worker;
use crate::domain::repositories::{ClickStore, LinkStore};
use crate::infrastructure::persistence::{PgClickStore, PgLinkStore};
use crate::telemetry::init_tracing;

/// Link service backed by PostgreSQL.
pub type PgLinkService = LinkService<PgLinkStore, PgClickStore>;

/// How long [`Engine::shutdown`] waits for queued clicks to drain.
const WORKER_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// A running engine: the service plus the background click worker.
pub struct Engine {
    service: Arc<PgLinkService>,
    pool: PgPool,
    worker: Option<JoinHandle<u64>>,
}

impl Engine {
    /// Shared handle to the link service.
    pub fn service(&self) -> Arc<PgLinkService> {
        self.service.clone()
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Stops accepting clicks, drains the queue and closes the pool.
    ///
    /// The queue only closes once every clone returned by
    /// [`Engine::service`] has been dropped. A worker still running after
    /// the drain timeout is aborted and its pending clicks are lost.
    pub async fn shutdown(self) {
        let Engine {
            service,
            pool,
            worker,
        } = self;
        drop(service);

        if let Some(mut worker) = worker {
            match tokio::time::timeout(WORKER_DRAIN_TIMEOUT, &mut worker).await {
                Ok(Ok(recorded)) => tracing::info!("Click worker drained ({} recorded)", recorded),
                Ok(Err(e)) => tracing::error!("Click worker failed: {}", e),
                Err(_) => {
                    tracing::warn!("Click worker did not drain in time, aborting");
                    worker.abort();
                }
            }
        }

        pool.close().await;
        tracing::info!("Engine stopped");
    }
}

/// Opens the connection pool and applies pending migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn connect(config: &Config) -> Result<PgPool> {
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

    Ok(pool)
}

/// Wires a link service over any pair of stores.
///
/// In [`ClickRecording::Queued`] mode this spawns the click worker and
/// returns its handle; the worker exits once the service is dropped. Must be
/// called within a Tokio runtime.
pub fn build_service<L, C>(
    links: Arc<L>,
    clicks: Arc<C>,
    config: &Config,
) -> (LinkService<L, C>, Option<JoinHandle<u64>>)
where
    L: LinkStore + 'static,
    C: ClickStore + 'static,
{
    let recorder = Arc::new(ClickRecorder::new(clicks, config.click_record_timeout()));

    let (dispatch, worker) = match config.click_recording {
        ClickRecording::Inline => (ClickDispatch::Inline(recorder.clone()), None),
        ClickRecording::Queued => {
            let (click_tx, click_rx) = mpsc::channel(config.click_queue_capacity);
            let handle = tokio::spawn(run_click_worker(click_rx, recorder.clone()));
            tracing::info!("Click worker started");
            (ClickDispatch::Queued(click_tx), Some(handle))
        }
    };

    let service = LinkService::new(links, recorder, dispatch, config.link_service_config());
    (service, worker)
}

/// Starts the engine on PostgreSQL.
///
/// # Errors
///
/// Returns an error if the database connection or migrations fail.
pub async fn bootstrap(config: Config) -> Result<Engine> {
    let pool = connect(&config).await?;

    let pool_arc = Arc::new(pool.clone());
    let links = Arc::new(PgLinkStore::new(pool_arc.clone()));
    let clicks = Arc::new(PgClickStore::new(pool_arc));

    let (service, worker) = build_service(links, clicks, &config);

    Ok(Engine {
        service: Arc::new(service),
        pool,
        worker,
    })
}

/// Loads `.env`, configuration and logging, then starts the engine.
///
/// # Errors
///
/// Returns an error if configuration is invalid or bootstrap fails.
pub async fn bootstrap_from_env() -> Result<Engine> {
    dotenvy::dotenv().ok();

    let config = config::load_from_env()?;
    if let Err(e) = init_tracing(&config.log_level, &config.log_format) {
        tracing::debug!("Keeping existing subscriber: {}", e);
    }
    config.print_summary();

    bootstrap(config).await
}
