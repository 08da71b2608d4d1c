//! HTTP boundary: axum server for the webhook, health probe and chat UI.
//!
//! ## URL layout
//!
//! ```text
//! POST /api/webhook   {"message"} → {"reply"}
//! GET  /api/health
//! GET  /favicon.ico   → 204
//! GET  /              → chat widget
//! ```
//!
//! CORS is fully permissive. The [`CancellationToken`] passed to [`serve`]
//! is wired to axum's graceful shutdown.

mod api;
mod ui;

use std::sync::Arc;

use axum::{
    Router,
    http::StatusCode,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::AppError;
use crate::subsystems::chat::ChatOrchestrator;

/// Router state injected into every handler via [`axum::extract::State`].
///
/// Cheap to clone; all fields are reference-counted.
#[derive(Clone)]
pub struct AppState {
    pub bot_name: Arc<str>,
    pub model: Arc<str>,
    pub chat: Arc<ChatOrchestrator>,
}

impl AppState {
    pub fn new(bot_name: &str, model: &str, chat: ChatOrchestrator) -> Self {
        Self {
            bot_name: Arc::from(bot_name),
            model: Arc::from(model),
            chat: Arc::new(chat),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/webhook", post(api::webhook))
        .route("/api/health",  get(api::health))
        .route("/favicon.ico", get(|| async { StatusCode::NO_CONTENT }))
        .route("/",            get(ui::root))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `bind_addr` and serve until `shutdown` is cancelled.
pub async fn serve(bind_addr: &str, state: AppState, shutdown: CancellationToken) -> Result<(), AppError> {
    let listener = TcpListener::bind(bind_addr)
        .await
        .map_err(|e| AppError::Server(format!("bind failed on {bind_addr}: {e}")))?;

    let local = listener
        .local_addr()
        .map_err(|e| AppError::Server(format!("local_addr: {e}")))?;
    info!(%local, "http server listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| AppError::Server(format!("axum server error: {e}")))?;

    info!("http server shut down");
    Ok(())
}
