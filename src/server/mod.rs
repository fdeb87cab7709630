//! HTTP API.

mod extract;
mod handlers;
mod routes;

pub use extract::CurrentUser;
pub use routes::router;

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use chrono::Duration;
use tokio::net::TcpListener;

use crate::config::Config;
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::sources::{self, SubmissionSource};

/// Shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub secret: Arc<str>,
    pub token_ttl: Duration,
    pub source: Arc<dyn SubmissionSource>,
    pub started: Instant,
}

impl AppState {
    pub fn new(db: Database, config: &Config) -> Self {
        let db = Arc::new(Mutex::new(db));
        let source = sources::select(
            db.clone(),
            config.use_forms_db,
            config.forms_db_path.clone(),
        );
        Self {
            db,
            secret: Arc::from(config.secret_key.as_str()),
            token_ttl: config.token_ttl,
            source,
            started: Instant::now(),
        }
    }

    pub fn db(&self) -> AppResult<MutexGuard<'_, Database>> {
        self.db
            .lock()
            .map_err(|_| AppError::Internal(anyhow!("database lock poisoned")))
    }
}

/// Open the database, bind and serve until Ctrl-C.
pub async fn serve(config: Config) -> Result<()> {
    if config.uses_dev_secret() {
        tracing::warn!("using the development secret key; set LEADCRM_SECRET_KEY");
    }

    let db = match &config.db_path {
        Some(path) => Database::open_at(path.clone())?,
        None => Database::open()?,
    };
    let state = AppState::new(db, &config);
    let source = state.source.name();

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    tracing::info!(addr = %config.bind, source, "leadcrm listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "could not listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
