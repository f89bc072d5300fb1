//! Axum router and server loop.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;
use faucet_service::{FaucetService, ShutdownController};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::handlers;

/// Request bodies are a handful of short strings.
const MAX_BODY_BYTES: usize = 16 * 1024;

pub fn build_router(service: Arc<FaucetService>) -> Router {
    Router::new()
        .route("/api/verify-post", post(handlers::verify_post))
        .route("/api/claim", post(handlers::claim))
        .route("/api/eligibility/:wallet", get(handlers::eligibility))
        .route("/api/history/:wallet", get(handlers::history))
        .route("/api/verify-transaction", post(handlers::verify_transaction))
        .route("/api/status", get(handlers::status))
        .route("/admin/posts/:post_id", delete(handlers::reset_post))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(service)
}

/// Bind the configured address and serve until `shutdown` fires. In-flight
/// requests are drained before returning.
pub async fn serve(
    service: Arc<FaucetService>,
    shutdown: &ShutdownController,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(service.config().bind_addr.as_str()).await?;
    info!(addr = %listener.local_addr()?, "faucet api listening");
    axum::serve(listener, build_router(service))
        .with_graceful_shutdown(shutdown.signalled())
        .await?;
    info!("faucet api stopped");
    Ok(())
}
