//! TubeQuiz · YouTube question generator backend
//!
//! - Axum HTTP API + the single-page form (./static/index.html)
//! - Questions generated by Google Gemini from a YouTube URL; the API key is
//!   supplied per submission and only kept in memory
//!
//! Important env variables:
//!   PORT                : u16 (default 3000)
//!   GEMINI_BASE_URL     : default "https://generativelanguage.googleapis.com/v1beta"
//!   GEMINI_TIMEOUT_SECS : per-call HTTP timeout (default 120)
//!   QNA_DEFAULT_MODEL   : model id used when the form omits one
//!   QNA_CONFIG_PATH     : path to TOML config (prompt overrides, temperature)
//!   LOG_LEVEL           : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT          : "pretty" (default) or "json"

mod config;
mod dispatch;
mod domain;
mod engine;
mod error;
mod factory;
mod logic;
mod protocol;
mod render;
mod routes;
mod state;
mod telemetry;
mod util;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    telemetry::init_tracing();

    // Config, engine builder and the (initially empty) client cache.
    let state = Arc::new(AppState::from_env());
    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.port));

    let app = build_router(state);

    let listener = TcpListener::bind(addr).await?;
    info!(target: "tubequiz_backend", %addr, "HTTP server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(target: "tubequiz_backend", error = %e, "Failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!(target: "tubequiz_backend", "Shutdown signal received");
}
