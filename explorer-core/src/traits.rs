//! Common traits for the explorer.
//!
//! These traits define the interfaces that different implementations can satisfy,
//! keeping the HTTP layer independent of a specific upstream vendor or cache backend.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{CacheResult, Result};
use crate::types::{AddressInfo, TransactionInfo};

// ═══════════════════════════════════════════════════════════════════════════════
// DATA PROVIDER TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Source of truth for address and transaction data.
///
/// Each method issues exactly one upstream request. `Ok(None)` means the
/// upstream had nothing usable for the identifier; `Err` carries the reason a
/// request could not be completed (transport failure, timeout, malformed body).
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Name the provider is registered under.
    fn name(&self) -> &str;

    /// Fetches the balance and transaction count of an address.
    async fn get_address_info(&self, address: &str) -> Result<Option<AddressInfo>>;

    /// Fetches a transaction by its hash.
    async fn get_transaction_info(&self, hash: &str) -> Result<Option<TransactionInfo>>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE STORE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// String key/value store with optional per-entry expiration.
///
/// Implementations must be safe to share between concurrent requests.
/// Only [`get`](CacheStore::get) and [`set`](CacheStore::set) are used on the
/// request path; the remaining operations exist for maintenance tooling.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the stored value, or `None` if the key is absent or expired.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Stores a value. `ttl = None` means the entry never expires.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> CacheResult<()>;

    /// Removes a key. Returns true if it existed.
    async fn delete(&self, key: &str) -> CacheResult<bool>;

    /// Checks whether a key is present.
    async fn exists(&self, key: &str) -> CacheResult<bool>;

    /// Lists keys matching a glob-style pattern (`*`, `?`).
    async fn keys(&self, pattern: &str) -> CacheResult<Vec<String>>;

    /// Removes every key.
    async fn flush(&self) -> CacheResult<()>;

    /// Releases the handle. Later calls fail with [`crate::CacheError::Closed`].
    async fn close(&self) -> CacheResult<()>;
}
