//! DTOs for API responses.
//!
//! Lookup responses serialize the domain types directly; only the health
//! endpoint has its own shape.

use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status
    pub status: String,
    /// Version
    pub version: String,
    /// Uptime in seconds
    pub uptime_seconds: u64,
    /// Name of the active data provider
    pub provider: String,
    /// Configured cache backend
    pub cache_backend: String,
    /// Whether the cache answered a health check
    pub cache_reachable: bool,
}
