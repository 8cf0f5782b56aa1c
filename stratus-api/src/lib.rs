//! # Stratus API Server
//!
//! HTTP front of the Stratus cache-aside weather service.
//!
//! ## Endpoints
//!
//! - `GET /weather/:city` - Weather document for a city (cached for 12 hours)
//! - `GET /health` - Liveness and cache mode
//!
//! ## Example
//!
//! ```rust,ignore
//! use stratus_api::{ApiConfig, ApiServer, AppState};
//!
//! let config = ApiConfig::from_env()?;
//! let state = AppState::connect(config).await?;
//! ApiServer::new(state).run(([0, 0, 0, 0], 3000)).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod routes;
mod handlers;
mod state;
mod dto;
mod error;

pub use routes::create_router;
pub use state::{connect_cache, ApiConfig, AppState};
pub use dto::{HealthResponse, MessageResponse};
pub use error::ApiError;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// API server for Stratus.
pub struct ApiServer {
    state: Arc<AppState>,
}

impl ApiServer {
    /// Creates a new API server around connected state.
    pub fn new(state: AppState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    /// Creates the router with all routes configured.
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        create_router(self.state.clone())
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    /// Runs the server on the given address until Ctrl+C.
    pub async fn run(self, addr: impl Into<SocketAddr>) -> std::io::Result<()> {
        let addr = addr.into();
        let listener = tokio::net::TcpListener::bind(addr).await?;

        info!("Stratus API server listening on {}", addr);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            warn!(error = %e, "Could not install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    }
}
