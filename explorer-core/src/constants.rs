//! Constants for the explorer.
//!
//! Cache lifetimes, currency scaling and identifier shape limits. Values match
//! what the upstream API and the deployed cache already rely on, so changing
//! any of them changes observable behavior.

use std::time::Duration;

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE POLICY
// ═══════════════════════════════════════════════════════════════════════════════

/// TTL for address snapshots (1 hour).
/// Balances move with every new block, so address data is always short-lived.
pub const ADDRESS_CACHE_TTL: Duration = Duration::from_secs(3600);

/// TTL for transactions that have not been mined yet (10 minutes).
pub const UNCONFIRMED_TX_CACHE_TTL: Duration = Duration::from_secs(600);

/// Upper bound on a single cache read or write made while serving a lookup.
pub const CACHE_OPERATION_TIMEOUT: Duration = Duration::from_secs(2);

/// `transaction_index` value reported for transactions still in the mempool.
/// Any other value is a block height and the transaction is cached forever.
pub const UNCONFIRMED_TX_INDEX: i64 = -1;

// ═══════════════════════════════════════════════════════════════════════════════
// CURRENCY
// ═══════════════════════════════════════════════════════════════════════════════

/// Number of satoshis in one bitcoin.
pub const SATOSHIS_PER_BTC: f64 = 100_000_000.0;

// ═══════════════════════════════════════════════════════════════════════════════
// IDENTIFIER SHAPES
// ═══════════════════════════════════════════════════════════════════════════════

/// Minimum length of a base58 (P2PKH / P2SH) address.
pub const BASE58_ADDRESS_MIN_LEN: usize = 26;

/// Maximum length of a base58 (P2PKH / P2SH) address.
pub const BASE58_ADDRESS_MAX_LEN: usize = 35;

/// Human-readable prefix of mainnet segwit addresses.
pub const BECH32_PREFIX: &str = "bc1";

/// Minimum length of a bech32 address, prefix included.
pub const BECH32_ADDRESS_MIN_LEN: usize = 28;

/// Maximum length of a bech32 address, prefix included.
pub const BECH32_ADDRESS_MAX_LEN: usize = 42;

/// Length of a hex-encoded transaction id.
pub const TX_HASH_LEN: usize = 64;

// ═══════════════════════════════════════════════════════════════════════════════
// PROVIDERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Registry name of the BlockCypher provider.
pub const PROVIDER_BLOCKCYPHER: &str = "blockcypher";

/// Provider used when none is configured.
pub const DEFAULT_PROVIDER: &str = PROVIDER_BLOCKCYPHER;

/// Default BlockCypher endpoint for Bitcoin mainnet.
pub const DEFAULT_BLOCKCYPHER_BASE_URL: &str = "https://api.blockcypher.com/v1/btc/main";

/// Default timeout for upstream requests, in seconds.
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_ttls() {
        assert_eq!(ADDRESS_CACHE_TTL.as_secs(), 3600);
        assert_eq!(UNCONFIRMED_TX_CACHE_TTL.as_secs(), 600);
        assert!(UNCONFIRMED_TX_CACHE_TTL < ADDRESS_CACHE_TTL);
    }

    #[test]
    fn test_bech32_bounds_include_prefix() {
        assert!(BECH32_ADDRESS_MIN_LEN > BECH32_PREFIX.len());
        assert!(BECH32_ADDRESS_MAX_LEN > BASE58_ADDRESS_MAX_LEN);
    }
}
