// ============================================================
// Layer 7 — HTTP API (axum)
// ============================================================
// Two small services share one serving helper:
//
//   samples.rs - the Sample Service
//                GET /live   → {content}
//                GET /test   → {content, value, flag}
//                GET /health → "ok"
//
//   predict.rs - model serving
//                POST /predict → {probability, is_member}
//                GET  /health  → "ok"
//
// Handlers hold only read-only state behind an Arc, so any
// number of requests can be served concurrently.

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;

/// Sample Service router
pub mod samples;

/// Prediction router over a loaded checkpoint
pub mod predict;

/// Liveness check shared by both services
async fn health() -> &'static str {
    "ok"
}

/// Serve `app` on `listener` until Ctrl-C.
pub async fn serve(listener: TcpListener, app: Router) -> Result<()> {
    let addr = listener.local_addr().context("listener has no local address")?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server terminated with an error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Cannot listen for Ctrl-C: {}", e);
        // never resolve: the server runs until the process is killed
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
