//! Read-only HTTP status surface
//!
//! Exposes the counters of the registered pollers. There is no write path: entries are managed
//! through the library or the schedule file.

use crate::error::{Error, Result};
use crate::registry::{PollerRegistry, StatsReport};
use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared state for the HTTP handlers
pub struct AppState {
  /// Registry of running pollers
  pub registry: Arc<PollerRegistry>,
}

/// Status server
pub struct StatusServer {
  addr: SocketAddr,
  registry: Arc<PollerRegistry>,
}

impl StatusServer {
  pub fn new<A: Into<SocketAddr>>(addr: A, registry: Arc<PollerRegistry>) -> Self {
    Self {
      addr: addr.into(),
      registry,
    }
  }

  /// Build the router
  pub fn router(&self) -> Router {
    router(Arc::new(AppState {
      registry: self.registry.clone(),
    }))
  }

  /// Serve until the token is cancelled
  pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
    let app = self.router();
    let listener = tokio::net::TcpListener::bind(self.addr)
      .await
      .map_err(|e| Error::server(format!("Failed to bind {}: {}", self.addr, e)))?;

    info!("Status server listening on {}", self.addr);

    axum::serve(listener, app)
      .with_graceful_shutdown(async move {
        shutdown.cancelled().await;
        info!("Stopping status server...");
      })
      .await
      .map_err(Error::Io)
  }
}

/// Build the status router over the given state
pub fn router(state: Arc<AppState>) -> Router {
  Router::new()
    .route("/stats", get(stats_handler))
    .route("/health", get(health_handler))
    .layer(CorsLayer::permissive())
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

/// Per-poller counters and their totals
pub async fn stats_handler(State(state): State<Arc<AppState>>) -> Json<StatsReport> {
  Json(state.registry.snapshot())
}

/// Health check handler
pub async fn health_handler() -> impl IntoResponse {
  "ok"
}
