//! HTTP server wiring.
//!
//! Serves the REST API, the WebSocket endpoint, and the embedded frontend
//! assets from a single port.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router,
    http::{StatusCode, Uri, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::api::{AppState, SharedState, api_router};
use crate::db::{DbHandle, LedgerDb};
use crate::embedded::Assets;
use crate::ws;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
    /// Path to the SQLite database
    pub db_path: PathBuf,
    /// Email that is promoted to super admin on first resolution
    pub bootstrap_admin_email: String,
    /// Development mode: permissive CORS, binds to all interfaces
    pub dev_mode: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            db_path: PathBuf::from("data/bugledger.db"),
            bootstrap_admin_email: "admin@bugledger.local".to_string(),
            dev_mode: false,
        }
    }
}

/// Build the axum router with all routes.
pub fn build_router(state: SharedState) -> Router {
    api_router()
        .route("/ws", get(ws::ws_handler))
        .fallback(static_handler)
        .with_state(state)
}

/// Serve embedded static assets with SPA fallback.
async fn static_handler(uri: Uri) -> Response {
    let path = uri.path().trim_start_matches('/');

    if path.is_empty() || path == "index.html" {
        return index_html();
    }

    if let Some(content) = Assets::get(path) {
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        ([(header::CONTENT_TYPE, mime.as_ref())], content.data).into_response()
    } else {
        // Client-side routes like /sprints/abc resolve to the SPA shell
        index_html()
    }
}

fn index_html() -> Response {
    match Assets::get("index.html") {
        Some(content) => Html(content.data).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            "Frontend not found. Run the UI build before packaging the server.",
        )
            .into_response(),
    }
}

/// Start the server and block until shutdown.
pub async fn start_server(config: ServerConfig) -> Result<()> {
    if let Some(parent) = config.db_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let db = LedgerDb::new(&config.db_path)
        .with_context(|| format!("Failed to open database at {}", config.db_path.display()))?;
    info!(db = %config.db_path.display(), "database ready");

    let (ws_tx, _) = broadcast::channel::<String>(256);
    let state: SharedState = Arc::new(AppState {
        db: DbHandle::new(db),
        ws_tx,
        bootstrap_admin_email: config.bootstrap_admin_email.clone(),
    });

    let mut router = build_router(state);
    if config.dev_mode {
        router = router.layer(CorsLayer::permissive());
    }

    let host = if config.dev_mode {
        [0, 0, 0, 0]
    } else {
        [127, 0, 0, 1]
    };
    let addr = SocketAddr::from((host, config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    println!("Bug ledger running at http://localhost:{}", config.port);
    if config.dev_mode {
        println!("Dev mode: CORS open, listening on all interfaces");
    }

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    println!("\nShutting down...");
}
