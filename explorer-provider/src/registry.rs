//! Provider registry.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use explorer_core::constants::PROVIDER_BLOCKCYPHER;
use explorer_core::error::{ExplorerError, Result};
use explorer_core::traits::DataProvider;

use crate::blockcypher::{BlockCypherConfig, BlockCypherProvider};

/// Settings for every built-in provider.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// BlockCypher settings
    pub blockcypher: BlockCypherConfig,
}

/// Maps provider names to constructed providers.
///
/// Populated once at startup; lookups hand out shared handles.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn DataProvider>>,
}

impl ProviderRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every built-in provider.
    pub fn with_defaults(config: &ProvidersConfig) -> Result<Self> {
        let mut registry = Self::new();
        registry.register(
            PROVIDER_BLOCKCYPHER,
            Arc::new(BlockCypherProvider::with_config(config.blockcypher.clone())?),
        );
        Ok(registry)
    }

    /// Adds or replaces a provider.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn DataProvider>) {
        let name = name.into();
        debug!(name = %name, "Registered data provider");
        self.providers.insert(name, provider);
    }

    /// Looks up a provider by name.
    ///
    /// Returns [`ExplorerError::UnknownProvider`] if nothing is registered under `name`.
    pub fn get_provider(&self, name: &str) -> Result<Arc<dyn DataProvider>> {
        self.providers
            .get(name)
            .cloned()
            .ok_or_else(|| ExplorerError::UnknownProvider(name.to_string()))
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use explorer_core::types::{AddressInfo, TransactionInfo};

    struct NullProvider;

    #[async_trait]
    impl DataProvider for NullProvider {
        fn name(&self) -> &str {
            "null"
        }

        async fn get_address_info(&self, _address: &str) -> Result<Option<AddressInfo>> {
            Ok(None)
        }

        async fn get_transaction_info(&self, _hash: &str) -> Result<Option<TransactionInfo>> {
            Ok(None)
        }
    }

    #[test]
    fn test_defaults_include_blockcypher() {
        let registry = ProviderRegistry::with_defaults(&ProvidersConfig::default()).unwrap();
        let provider = registry.get_provider("blockcypher").unwrap();
        assert_eq!(provider.name(), "blockcypher");
        assert_eq!(registry.names(), vec!["blockcypher"]);
    }

    #[test]
    fn test_unknown_provider() {
        let registry = ProviderRegistry::with_defaults(&ProvidersConfig::default()).unwrap();
        let err = registry.get_provider("coinbase").err().unwrap();

        assert!(matches!(err, ExplorerError::UnknownProvider(ref name) if name == "coinbase"));
        assert!(err.is_config_error());
        assert_eq!(err.to_string(), "Provider 'coinbase' not found");
    }

    #[test]
    fn test_register_extends_registry() {
        let mut registry = ProviderRegistry::with_defaults(&ProvidersConfig::default()).unwrap();
        registry.register("null", Arc::new(NullProvider));

        assert_eq!(registry.names(), vec!["blockcypher", "null"]);
        assert_eq!(registry.get_provider("null").unwrap().name(), "null");
    }

    #[test]
    fn test_invalid_config_fails_construction() {
        let config = ProvidersConfig {
            blockcypher: BlockCypherConfig::with_base_url("::not-a-url::"),
        };
        assert!(ProviderRegistry::with_defaults(&config).is_err());
    }

    #[test]
    fn test_lookup_shares_instance() {
        let registry = ProviderRegistry::with_defaults(&ProvidersConfig::default()).unwrap();
        let a = registry.get_provider("blockcypher").unwrap();
        let b = registry.get_provider("blockcypher").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
