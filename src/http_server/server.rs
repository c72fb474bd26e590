//! HTTP server wiring: router assembly, bind, and graceful shutdown

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};

use crate::observability::{Logger, Severity};

use super::config::HttpConfig;
use super::routes::{api_routes, AppState};

/// HTTP server for the record API.
pub struct HttpServer {
    config: HttpConfig,
    router: Router,
}

impl HttpServer {
    /// Assembles the full router: API routes, health probe, CORS.
    pub fn new(config: HttpConfig, state: Arc<AppState>) -> Self {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        let router = Router::new()
            .route("/health", get(health))
            .merge(api_routes(state))
            .layer(cors);

        Self { config, router }
    }

    /// Returns the router without serving it (for tests).
    pub fn router(self) -> Router {
        self.router
    }

    /// Binds and serves until `stop` fires.
    pub async fn start(self, mut stop: watch::Receiver<()>) -> io::Result<()> {
        let addr: SocketAddr = self
            .config
            .socket_addr()
            .parse()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, format!("bad address: {e}")))?;

        let listener = TcpListener::bind(addr).await?;

        Logger::log(
            Severity::Info,
            "http.listening",
            &[("addr", &addr.to_string())],
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = stop.changed().await;
            })
            .await
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
