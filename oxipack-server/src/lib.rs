//! # OxiPack Server
//!
//! HTTP transport for the OxiPack engine.
//!
//! | Method | Path                  | Purpose                                   |
//! |--------|-----------------------|-------------------------------------------|
//! | POST   | `/api/compress`       | multipart `files`, `algorithm`, `level`   |
//! | GET    | `/api/jobs/{id}`      | state and progress of a job               |
//! | DELETE | `/api/jobs/{id}`      | cancel a running job                      |
//! | GET    | `/api/download/{id}`  | the finished archive, retrievable once    |
//!
//! Submission validates the upload, answers `202 Accepted` with the archive
//! id and filename, and compresses on tokio's blocking pool.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod jobs;
pub mod routes;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use oxipack_core::error::Result;
use oxipack_engine::Engine;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

pub use config::ServerConfig;
pub use error::{ApiError, status_for};
pub use jobs::{Job, JobRegistry, JobStatus};

/// Jobs kept per result store slot before finished ones are pruned.
const JOBS_PER_STORE_SLOT: usize = 4;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    /// The compression engine.
    pub engine: Arc<Engine>,
    /// Submitted jobs.
    pub jobs: Arc<JobRegistry>,
}

impl AppState {
    /// Wrap an engine.
    pub fn new(engine: Engine) -> Self {
        let capacity = engine.config().store_capacity.saturating_mul(JOBS_PER_STORE_SLOT);
        Self {
            engine: Arc::new(engine),
            jobs: Arc::new(JobRegistry::new(capacity)),
        }
    }
}

/// Build the router for `config`.
pub fn router(config: &ServerConfig, state: AppState) -> Router {
    let api = Router::new()
        .route("/compress", post(routes::compress))
        .route(
            "/jobs/{id}",
            get(routes::job_status).delete(routes::cancel_job),
        )
        .route("/download/{id}", get(routes::download));

    let prefix = config.api_prefix.trim_end_matches('/');
    let app = if prefix.is_empty() {
        Router::new().merge(api)
    } else {
        Router::new().nest(prefix, api)
    };

    app.layer(DefaultBodyLimit::max(config.body_limit()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind `config.bind` and serve until Ctrl-C.
pub async fn serve(config: ServerConfig) -> Result<()> {
    let engine = Engine::new(config.engine.clone())?;
    let app = router(&config, AppState::new(engine));

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    info!(address = %listener.local_addr()?, prefix = %config.api_prefix, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
