//! App state: configuration, provider, cache, lookup service.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use explorer_cache::{MemoryCache, RedisCache, RedisConfig};
use explorer_core::constants::DEFAULT_PROVIDER;
use explorer_core::error::{ExplorerError, Result};
use explorer_core::traits::{CacheStore, DataProvider};
use explorer_provider::{ProviderRegistry, ProvidersConfig};

use crate::service::LookupService;

/// Which cache store to run against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CacheBackend {
    /// Shared Redis server
    #[default]
    Redis,
    /// In-process store, for local development
    Memory,
}

impl FromStr for CacheBackend {
    type Err = ExplorerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(CacheBackend::Redis),
            "memory" => Ok(CacheBackend::Memory),
            other => Err(ExplorerError::ConfigError(format!(
                "unknown cache backend '{}', expected 'redis' or 'memory'",
                other
            ))),
        }
    }
}

impl fmt::Display for CacheBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheBackend::Redis => f.write_str("redis"),
            CacheBackend::Memory => f.write_str("memory"),
        }
    }
}

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Name of the provider to serve lookups from
    pub provider: String,
    /// Per-provider settings
    pub providers: ProvidersConfig,
    /// Cache backend
    pub cache_backend: CacheBackend,
    /// Redis settings, used when `cache_backend` is Redis
    pub redis: RedisConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER.into(),
            providers: ProvidersConfig::default(),
            cache_backend: CacheBackend::default(),
            redis: RedisConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Reads configuration from the environment, loading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable source.
    ///
    /// Unset and empty variables fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(provider) = var("PROVIDER") {
            config.provider = provider.trim().to_string();
        }
        if let Some(backend) = var("CACHE_BACKEND") {
            config.cache_backend = backend.parse()?;
        }

        if let Some(host) = var("REDIS_HOST") {
            config.redis.host = host;
        }
        if let Some(port) = var("REDIS_PORT") {
            config.redis.port = port
                .trim()
                .parse()
                .map_err(|_| ExplorerError::ConfigError(format!("invalid REDIS_PORT '{}'", port)))?;
        }
        config.redis.access_key = var("REDIS_ACCESS_KEY");

        let blockcypher = &mut config.providers.blockcypher;
        if let Some(url) = var("BLOCKCYPHER_BASE_URL") {
            blockcypher.base_url = url;
        }
        blockcypher.token = var("BLOCKCYPHER_TOKEN");
        if let Some(secs) = var("UPSTREAM_TIMEOUT_SECS") {
            blockcypher.timeout_seconds = secs.trim().parse().map_err(|_| {
                ExplorerError::ConfigError(format!("invalid UPSTREAM_TIMEOUT_SECS '{}'", secs))
            })?;
        }

        Ok(config)
    }
}

/// Opens the configured cache backend.
///
/// For Redis this includes the PING handshake, so a returned store is known
/// to be reachable.
pub async fn open_cache(config: &ApiConfig) -> Result<Arc<dyn CacheStore>> {
    let cache: Arc<dyn CacheStore> = match config.cache_backend {
        CacheBackend::Redis => Arc::new(RedisCache::connect(&config.redis).await?),
        CacheBackend::Memory => {
            info!("Using in-process memory cache");
            Arc::new(MemoryCache::new())
        }
    };
    Ok(cache)
}

/// Resolves the configured provider from the built-in registry.
pub fn select_provider(config: &ApiConfig) -> Result<Arc<dyn DataProvider>> {
    let registry = ProviderRegistry::with_defaults(&config.providers)?;
    registry.get_provider(&config.provider)
}

/// Shared state handed to every handler.
pub struct AppState {
    /// Configuration the state was built from
    pub config: ApiConfig,
    /// Cache-aside lookups
    pub lookup: LookupService,
    /// When the state was created
    pub started_at: Instant,
}

impl AppState {
    /// Wires already-constructed collaborators together.
    pub fn new(config: ApiConfig, provider: Arc<dyn DataProvider>, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            config,
            lookup: LookupService::new(provider, cache),
            started_at: Instant::now(),
        }
    }

    /// Builds the provider, then connects the cache.
    ///
    /// The provider is resolved first so a misconfigured name fails before
    /// any network connection is attempted. Either failure is fatal.
    pub async fn initialize(config: ApiConfig) -> Result<Self> {
        let provider = select_provider(&config)?;
        info!(provider = provider.name(), "Selected data provider");

        let cache = open_cache(&config).await?;
        info!(backend = %config.cache_backend, "Cache ready");

        Ok(Self::new(config, provider, cache))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn config_from(env: HashMap<String, String>) -> Result<ApiConfig> {
        ApiConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = config_from(HashMap::new()).unwrap();

        assert_eq!(config.provider, "blockcypher");
        assert_eq!(config.cache_backend, CacheBackend::Redis);
        assert_eq!(config.redis.endpoint(), "127.0.0.1:6379");
        assert!(config.redis.access_key.is_none());
        assert_eq!(config.providers.blockcypher.timeout_seconds, 10);
        assert!(config.providers.blockcypher.token.is_none());
    }

    #[test]
    fn test_reads_all_variables() {
        let config = config_from(vars(&[
            ("PROVIDER", "blockcypher"),
            ("CACHE_BACKEND", "Memory"),
            ("REDIS_HOST", "cache.internal"),
            ("REDIS_PORT", "6380"),
            ("REDIS_ACCESS_KEY", "s3cret"),
            ("BLOCKCYPHER_BASE_URL", "http://localhost:9999/v1/btc/test3"),
            ("BLOCKCYPHER_TOKEN", "tok"),
            ("UPSTREAM_TIMEOUT_SECS", "3"),
        ]))
        .unwrap();

        assert_eq!(config.cache_backend, CacheBackend::Memory);
        assert_eq!(config.redis.endpoint(), "cache.internal:6380");
        assert_eq!(config.redis.access_key.as_deref(), Some("s3cret"));
        assert_eq!(config.providers.blockcypher.base_url, "http://localhost:9999/v1/btc/test3");
        assert_eq!(config.providers.blockcypher.token.as_deref(), Some("tok"));
        assert_eq!(config.providers.blockcypher.timeout_seconds, 3);
    }

    #[test]
    fn test_empty_values_use_defaults() {
        let config = config_from(vars(&[("REDIS_HOST", ""), ("REDIS_ACCESS_KEY", "  ")])).unwrap();
        assert_eq!(config.redis.host, "127.0.0.1");
        assert!(config.redis.access_key.is_none());
    }

    #[test]
    fn test_bad_port_is_config_error() {
        let err = config_from(vars(&[("REDIS_PORT", "redis")])).unwrap_err();
        assert!(err.is_config_error());
        assert!(err.to_string().contains("REDIS_PORT"));
    }

    #[test]
    fn test_unknown_backend_rejected() {
        assert!(config_from(vars(&[("CACHE_BACKEND", "memcached")])).is_err());
        assert_eq!("redis".parse::<CacheBackend>().unwrap(), CacheBackend::Redis);
        assert_eq!(CacheBackend::Memory.to_string(), "memory");
    }

    #[tokio::test]
    async fn test_unknown_provider_fails_before_cache() {
        // An unreachable Redis would also fail; the provider error must win.
        let config = ApiConfig {
            provider: "coinbase".into(),
            redis: RedisConfig::new("127.0.0.1", 9),
            ..Default::default()
        };

        let err = AppState::initialize(config).await.err().unwrap();
        assert!(matches!(err, ExplorerError::UnknownProvider(ref name) if name == "coinbase"));
    }

    #[tokio::test]
    async fn test_unreachable_redis_is_fatal() {
        let config = ApiConfig {
            redis: RedisConfig::new("127.0.0.1", 9),
            ..Default::default()
        };

        let err = AppState::initialize(config).await.err().unwrap();
        assert!(matches!(err, ExplorerError::Cache(_)));
    }

    #[tokio::test]
    async fn test_memory_backend_initializes() {
        let config = ApiConfig {
            cache_backend: CacheBackend::Memory,
            ..Default::default()
        };

        let state = AppState::initialize(config).await.unwrap();
        assert_eq!(state.lookup.provider().name(), "blockcypher");
    }
}
