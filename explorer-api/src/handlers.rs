//! API route handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::HeaderName,
    response::IntoResponse,
    Json,
};
use tracing::{debug, warn};

use explorer_core::constants::CACHE_OPERATION_TIMEOUT;

use crate::dto::HealthResponse;
use crate::error::ApiError;
use crate::service::Lookup;
use crate::state::AppState;

type Result<T> = std::result::Result<T, ApiError>;

/// Reports whether a lookup was served from the cache.
pub const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

const HEALTH_CHECK_KEY: &str = "health:check";

fn lookup_response<T: serde::Serialize>(lookup: Lookup<T>) -> impl IntoResponse {
    ([(X_CACHE, lookup.source.as_header_value())], Json(lookup.value))
}

// ═══════════════════════════════════════════════════════════════════════════
// Lookups
// ═══════════════════════════════════════════════════════════════════════════

/// GET /address/:address
pub async fn get_address(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<impl IntoResponse> {
    let lookup = state.lookup.address_info(&address).await?;
    debug!(address = %address, source = lookup.source.as_header_value(), "Served address lookup");
    Ok(lookup_response(lookup))
}

/// GET /transaction/:hash
pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    Path(hash): Path<String>,
) -> Result<impl IntoResponse> {
    let lookup = state.lookup.transaction_info(&hash).await?;
    debug!(hash = %hash, source = lookup.source.as_header_value(), "Served transaction lookup");
    Ok(lookup_response(lookup))
}

// ═══════════════════════════════════════════════════════════════════════════
// Health
// ═══════════════════════════════════════════════════════════════════════════

/// GET /health
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let check = state.lookup.cache().exists(HEALTH_CHECK_KEY);
    let cache_reachable = match tokio::time::timeout(CACHE_OPERATION_TIMEOUT, check).await {
        Ok(Ok(_)) => true,
        Ok(Err(err)) => {
            warn!(error = %err, "Cache health check failed");
            false
        }
        Err(_) => {
            warn!("Cache health check timed out");
            false
        }
    };

    Json(HealthResponse {
        status: if cache_reachable { "ok" } else { "degraded" }.into(),
        version: env!("CARGO_PKG_VERSION").into(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        provider: state.lookup.provider().name().to_string(),
        cache_backend: state.config.cache_backend.to_string(),
        cache_reachable,
    })
}
