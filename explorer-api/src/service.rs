//! Cache-aside lookups.
//!
//! Every lookup follows the same steps: validate the identifier, try the
//! cache, fall back to the provider, store what the provider returned.
//! Cache failures never fail a request; they only cost an upstream call.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, instrument, warn};

use explorer_core::constants::{ADDRESS_CACHE_TTL, CACHE_OPERATION_TIMEOUT, UNCONFIRMED_TX_CACHE_TTL};
use explorer_core::error::{ExplorerError, Result as ExplorerResult};
use explorer_core::traits::{CacheStore, DataProvider};
use explorer_core::types::{AddressInfo, TransactionInfo};
use explorer_core::validation::{is_valid_address, is_valid_transaction_hash};

/// Outcome of a failed lookup, as seen by clients.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The address does not have a valid shape.
    #[error("Invalid Bitcoin address")]
    InvalidAddress,

    /// The transaction hash is not 64 hex characters.
    #[error("Invalid transaction hash")]
    InvalidTransactionHash,

    /// The provider had no data for the address, or could not be reached.
    #[error("Address information could not be retrieved")]
    AddressNotFound,

    /// The provider had no data for the transaction, or could not be reached.
    #[error("Transaction information could not be retrieved")]
    TransactionNotFound,

    /// The provider answered with data that could not be interpreted.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LookupError {
    /// Returns true for errors caused by a malformed identifier.
    pub fn is_validation(&self) -> bool {
        matches!(self, LookupError::InvalidAddress | LookupError::InvalidTransactionHash)
    }

    /// Returns true for "nothing to return" outcomes.
    pub fn is_not_found(&self) -> bool {
        matches!(self, LookupError::AddressNotFound | LookupError::TransactionNotFound)
    }
}

/// Where a lookup result came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LookupSource {
    /// Served from the cache store
    Cache,
    /// Fetched from the upstream provider
    Provider,
}

impl LookupSource {
    /// Value for the `x-cache` response header.
    pub fn as_header_value(&self) -> &'static str {
        match self {
            LookupSource::Cache => "HIT",
            LookupSource::Provider => "MISS",
        }
    }
}

/// A successful lookup.
#[derive(Clone, Debug)]
pub struct Lookup<T> {
    /// The entity
    pub value: T,
    /// Whether it came from the cache
    pub source: LookupSource,
}

/// Cache lifetime for a transaction.
///
/// Mempool transactions may still be replaced or dropped, so they are only
/// kept for a short while; mined transactions never change.
pub fn transaction_cache_ttl(tx: &TransactionInfo) -> Option<Duration> {
    if tx.is_confirmed() {
        None
    } else {
        Some(UNCONFIRMED_TX_CACHE_TTL)
    }
}

/// Cache lifetime for an address snapshot.
pub fn address_cache_ttl(_info: &AddressInfo) -> Option<Duration> {
    Some(ADDRESS_CACHE_TTL)
}

/// Address and transaction lookups over a provider and a cache store.
///
/// Both collaborators are shared handles created at startup; the service
/// itself holds no per-request state.
#[derive(Clone)]
pub struct LookupService {
    provider: Arc<dyn DataProvider>,
    cache: Arc<dyn CacheStore>,
    cache_timeout: Duration,
}

impl LookupService {
    /// Creates a service over the given provider and cache.
    pub fn new(provider: Arc<dyn DataProvider>, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            provider,
            cache,
            cache_timeout: CACHE_OPERATION_TIMEOUT,
        }
    }

    /// Bounds each cache read and write; a slower store counts as a miss.
    pub fn with_cache_timeout(mut self, timeout: Duration) -> Self {
        self.cache_timeout = timeout;
        self
    }

    /// The provider lookups delegate to on a cache miss.
    pub fn provider(&self) -> &Arc<dyn DataProvider> {
        &self.provider
    }

    /// The cache store.
    pub fn cache(&self) -> &Arc<dyn CacheStore> {
        &self.cache
    }

    /// Looks up an address.
    #[instrument(skip(self))]
    pub async fn address_info(&self, address: &str) -> Result<Lookup<AddressInfo>, LookupError> {
        if !is_valid_address(address) {
            return Err(LookupError::InvalidAddress);
        }

        if let Some(info) = self.read_cached(address, AddressInfo::from_json).await {
            debug!(address, "Retrieved address info from cache");
            return Ok(Lookup {
                value: info,
                source: LookupSource::Cache,
            });
        }

        match self.provider.get_address_info(address).await {
            Ok(Some(info)) => {
                debug!(address, provider = self.provider.name(), "Retrieved address info from provider");
                self.write_cached(address, info.to_json(), address_cache_ttl(&info)).await;
                Ok(Lookup {
                    value: info,
                    source: LookupSource::Provider,
                })
            }
            Ok(None) => Err(LookupError::AddressNotFound),
            Err(err) => Err(self.provider_failure(address, err, LookupError::AddressNotFound)),
        }
    }

    /// Looks up a transaction by hash.
    #[instrument(skip(self))]
    pub async fn transaction_info(&self, hash: &str) -> Result<Lookup<TransactionInfo>, LookupError> {
        if !is_valid_transaction_hash(hash) {
            return Err(LookupError::InvalidTransactionHash);
        }

        if let Some(tx) = self.read_cached(hash, TransactionInfo::from_json).await {
            debug!(hash, "Retrieved transaction info from cache");
            return Ok(Lookup {
                value: tx,
                source: LookupSource::Cache,
            });
        }

        match self.provider.get_transaction_info(hash).await {
            Ok(Some(tx)) => {
                debug!(
                    hash,
                    provider = self.provider.name(),
                    confirmed = tx.is_confirmed(),
                    "Retrieved transaction info from provider"
                );
                self.write_cached(hash, tx.to_json(), transaction_cache_ttl(&tx)).await;
                Ok(Lookup {
                    value: tx,
                    source: LookupSource::Provider,
                })
            }
            Ok(None) => Err(LookupError::TransactionNotFound),
            Err(err) => Err(self.provider_failure(hash, err, LookupError::TransactionNotFound)),
        }
    }

    /// Unreachable upstreams look the same as unknown identifiers to clients.
    fn provider_failure(&self, key: &str, err: ExplorerError, not_found: LookupError) -> LookupError {
        if err.is_transport() {
            warn!(key, provider = self.provider.name(), error = %err, "Upstream request failed");
            not_found
        } else {
            error!(key, provider = self.provider.name(), error = %err, "Upstream returned unusable data");
            LookupError::Internal(err.to_string())
        }
    }

    async fn read_cached<T>(&self, key: &str, decode: fn(&str) -> ExplorerResult<T>) -> Option<T> {
        let raw = match tokio::time::timeout(self.cache_timeout, self.cache.get(key)).await {
            Ok(Ok(Some(raw))) => raw,
            Ok(Ok(None)) => return None,
            Ok(Err(err)) => {
                warn!(key, error = %err, "Failed to get key from cache");
                return None;
            }
            Err(_) => {
                warn!(key, timeout_ms = self.cache_timeout.as_millis() as u64, "Cache read timed out");
                return None;
            }
        };

        match decode(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(key, error = %err, "Discarding undecodable cache entry");
                None
            }
        }
    }

    async fn write_cached(&self, key: &str, json: ExplorerResult<String>, ttl: Option<Duration>) {
        let json = match json {
            Ok(json) => json,
            Err(err) => {
                warn!(key, error = %err, "Failed to serialize cache entry");
                return;
            }
        };

        match tokio::time::timeout(self.cache_timeout, self.cache.set(key, &json, ttl)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(key, error = %err, "Failed to set key in cache"),
            Err(_) => {
                warn!(key, timeout_ms = self.cache_timeout.as_millis() as u64, "Cache write timed out")
            }
        }
    }
}
