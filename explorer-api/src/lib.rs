//! # Explorer API Server
//!
//! HTTP façade for Bitcoin address and transaction lookups. Results come
//! from a pluggable upstream provider and are kept in a shared cache.
//!
//! ## Endpoints
//!
//! - `GET /address/:address` - Balance and transaction count
//! - `GET /transaction/:hash` - Fee, inputs, outputs, confirmation status
//! - `GET /health` - Liveness and cache reachability
//!
//! ## Example
//!
//! ```rust,ignore
//! use explorer_api::{ApiConfig, ApiServer};
//!
//! let server = ApiServer::initialize(ApiConfig::from_env()?).await?;
//! server.run(([0, 0, 0, 0], 8000)).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod dto;
mod error;
mod handlers;
mod routes;
mod service;
mod state;

pub use dto::HealthResponse;
pub use error::ApiError;
pub use routes::create_router;
pub use service::{
    address_cache_ttl, transaction_cache_ttl, Lookup, LookupError, LookupService, LookupSource,
};
pub use state::{open_cache, select_provider, ApiConfig, AppState, CacheBackend};

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use explorer_core::error::Result;

/// API server for Bitcoin lookups.
pub struct ApiServer {
    state: Arc<AppState>,
}

impl ApiServer {
    /// Wraps already-built state.
    pub fn new(state: AppState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    /// Builds provider and cache from configuration.
    ///
    /// Fails if the provider is unknown or the cache cannot be reached.
    pub async fn initialize(config: ApiConfig) -> Result<Self> {
        Ok(Self::new(AppState::initialize(config).await?))
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

    /// Runs the server on the given address until ctrl-c, then closes the cache.
    pub async fn run(self, addr: impl Into<SocketAddr>) -> std::io::Result<()> {
        let addr = addr.into();
        let listener = tokio::net::TcpListener::bind(addr).await?;

        info!(
            provider = self.state.lookup.provider().name(),
            cache = %self.state.config.cache_backend,
            "Explorer API listening on {}",
            addr
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        if let Err(err) = self.state.lookup.cache().close().await {
            warn!(error = %err, "Failed to close cache");
        }
        info!("Explorer API stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
