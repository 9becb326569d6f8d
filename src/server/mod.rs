//! HTTP surface: JSON and multipart routes over a shared [`Pipeline`].

pub mod handlers;

pub use handlers::AppState;

use crate::error::{Result, ToneTwistError};
use crate::pipeline::Pipeline;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;

/// Slack on top of the upload limit for multipart framing.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build the application router.
pub fn router(pipeline: Pipeline) -> Router {
    let body_limit = pipeline.config().limits.max_upload_bytes + MULTIPART_OVERHEAD;
    let state = Arc::new(AppState { pipeline });

    Router::new()
        .route("/api/transcribe", post(handlers::transcribe))
        .route("/api/enhance", post(handlers::enhance))
        .route("/api/synthesize", post(handlers::synthesize))
        .route("/api/styles", get(handlers::styles))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Serve until SIGINT or SIGTERM.
pub async fn serve(pipeline: Pipeline, bind: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| ToneTwistError::Other(format!("Failed to bind {bind}: {e}")))?;
    let local = listener.local_addr()?;
    tracing::info!(address = %local, "ToneTwist API listening");

    axum::serve(listener, router(pipeline))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Failed to listen for SIGINT");
            }
            tracing::info!("Received SIGINT, shutting down");
        }
        result = wait_for_sigterm() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Error setting up signal handler");
                // Keep serving; Ctrl+C still works
                std::future::pending::<()>().await;
            }
            tracing::info!("Received SIGTERM, shutting down");
        }
    }
}

#[cfg(unix)]
async fn wait_for_sigterm() -> Result<()> {
    use tokio::signal::unix::{SignalKind, signal};
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| ToneTwistError::Other(format!("Failed to register SIGTERM handler: {e}")))?;
    sigterm.recv().await;
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_sigterm() -> Result<()> {
    // Ctrl+C still works
    std::future::pending::<()>().await;
    Ok(())
}
