//! Error types for the explorer.
//!
//! Provider and configuration failures use [`ExplorerError`]; cache stores
//! report through the narrower [`CacheError`] so callers on the request path
//! can absorb them without inspecting provider variants.

use thiserror::Error;

/// Result type alias using `ExplorerError`.
pub type Result<T> = std::result::Result<T, ExplorerError>;

/// Result type alias for cache store operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Main error type for explorer operations.
#[derive(Debug, Error)]
pub enum ExplorerError {
    // ═══════════════════════════════════════════════════════════════════════════
    // CONFIGURATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// No provider is registered under the requested name.
    #[error("Provider '{0}' not found")]
    UnknownProvider(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // UPSTREAM ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// HTTP request to the upstream provider failed before a response arrived.
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Upstream request exceeded the configured timeout.
    #[error("Upstream timeout after {seconds}s")]
    UpstreamTimeout {
        /// Configured timeout
        seconds: u64,
    },

    /// Upstream answered successfully but the body did not have the expected shape.
    #[error("Unexpected upstream response: {0}")]
    UpstreamSchema(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // STORAGE / SERIALIZATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Cache store failure.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl ExplorerError {
    /// Returns true if the upstream could not be reached or did not answer in time.
    ///
    /// These are reported to clients as "not found", the same as an upstream
    /// that has no record of the identifier.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ExplorerError::HttpError(_) | ExplorerError::UpstreamTimeout { .. }
        )
    }

    /// Returns true if this error should abort startup.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ExplorerError::UnknownProvider(_) | ExplorerError::ConfigError(_)
        )
    }
}

/// Cache store error.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Could not reach the store.
    #[error("Cache connection failed: {0}")]
    Connection(String),

    /// Store answered the handshake with something other than PONG.
    #[error("Cache handshake failed: {0}")]
    Handshake(String),

    /// A command was rejected or failed mid-flight.
    #[error("Cache command '{command}' failed: {reason}")]
    Command {
        /// Command name (GET, SET, ...)
        command: &'static str,
        /// Store-provided reason
        reason: String,
    },

    /// The store did not answer within the configured bound.
    #[error("Cache command '{command}' timed out after {millis}ms")]
    Timeout {
        /// Command name (GET, SET, ...)
        command: &'static str,
        /// Bound that elapsed
        millis: u64,
    },

    /// The handle was closed with [`crate::CacheStore::close`].
    #[error("Cache connection is closed")]
    Closed,
}

impl CacheError {
    /// Builds a [`CacheError::Command`] from any displayable error.
    pub fn command(command: &'static str, reason: impl std::fmt::Display) -> Self {
        CacheError::Command {
            command,
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ExplorerError::UnknownProvider("coinbase".into());
        assert_eq!(err.to_string(), "Provider 'coinbase' not found");

        let err = CacheError::command("GET", "READONLY");
        assert!(err.to_string().contains("GET"));
        assert!(err.to_string().contains("READONLY"));

        let err = CacheError::Timeout { command: "GET", millis: 1000 };
        assert_eq!(err.to_string(), "Cache command 'GET' timed out after 1000ms");
    }

    #[test]
    fn test_error_classification() {
        assert!(ExplorerError::HttpError("reset".into()).is_transport());
        assert!(ExplorerError::UpstreamTimeout { seconds: 10 }.is_transport());
        assert!(!ExplorerError::UpstreamSchema("missing hash".into()).is_transport());

        assert!(ExplorerError::UnknownProvider("x".into()).is_config_error());
        assert!(!ExplorerError::HttpError("x".into()).is_config_error());
    }

    #[test]
    fn test_cache_error_conversion() {
        let err: ExplorerError = CacheError::Closed.into();
        assert!(matches!(err, ExplorerError::Cache(CacheError::Closed)));
        assert_eq!(err.to_string(), "Cache connection is closed");
    }

    #[test]
    fn test_json_error_conversion() {
        let json_result: std::result::Result<serde_json::Value, _> = serde_json::from_str("invalid");
        let result: Result<serde_json::Value> = json_result.map_err(ExplorerError::from);
        assert!(matches!(result, Err(ExplorerError::JsonError(_))));
    }
}
