//! HTTP transcoding endpoint.

mod upload;

pub use upload::TrimRequest;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::Method;
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::sync::Semaphore;
use tower_http::cors::{Any, CorsLayer};

use crate::config::ServerConfig;
use crate::error::AppError;
use crate::export::UPLOAD_PATH;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Bounds concurrent FFmpeg processes.
    pub jobs: Arc<Semaphore>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let jobs = Arc::new(Semaphore::new(config.max_jobs.max(1)));
        Self {
            config: Arc::new(config),
            jobs,
        }
    }
}

pub fn router(config: ServerConfig) -> Router {
    let state = AppState::new(config);
    let mut app = Router::new()
        .route(UPLOAD_PATH, post(upload::handle_upload))
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes));

    if state.config.enable_cors {
        app = app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers(Any),
        );
    }

    app.with_state(state)
}

async fn handle_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn run(config: ServerConfig) -> Result<(), AppError> {
    let addr: SocketAddr = config
        .bind_address
        .parse()
        .map_err(|e| AppError::InvalidConfig(format!("Invalid bind address {:?}: {}", config.bind_address, e)))?;

    log::info!(target: "clip_trim::server", "Listening on {}", addr);
    log::info!(
        target: "clip_trim::server",
        "Upload endpoint: {} (limit {} MiB, {} concurrent job(s))",
        UPLOAD_PATH,
        config.max_upload_bytes / (1024 * 1024),
        config.max_jobs
    );

    let router = router(config);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}
