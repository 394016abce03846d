//! Web UI and JSON API around the loop runner.
//!
//! Routes:
//! - `GET /` mission-control page
//! - `POST /run` form submission, renders the finished run
//! - `POST /api/run` JSON in, session record out
//! - `POST /export` report download
//! - `GET /health`

pub mod handlers;
pub mod page;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use log::info;
use tower_http::trace::TraceLayer;

use crate::error::Result;
use crate::runner::LoopRunner;

/// Shared, read-only state built once at startup
#[derive(Clone)]
pub struct AppState {
    pub runner: Arc<LoopRunner>,
}

impl AppState {
    pub fn new(runner: LoopRunner) -> Self {
        Self {
            runner: Arc::new(runner),
        }
    }
}

/// Build the application router
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/run", post(handlers::run_form))
        .route("/api/run", post(handlers::run_api))
        .route("/export", post(handlers::export))
        .route("/health", get(handlers::health_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Bind `addr` and serve until the process is stopped
pub async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, create_app(state)).await?;
    Ok(())
}
