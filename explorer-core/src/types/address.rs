//! Address snapshot type.

use serde::{Deserialize, Serialize};

use super::satoshis_to_btc;
use crate::error::Result;

/// Balance and transaction count of an address at the time it was fetched.
///
/// This is both the HTTP response body and the cached value, so the serde
/// field names are part of the public contract.
///
/// # Example
/// ```
/// use explorer_core::AddressInfo;
///
/// let info = AddressInfo::from_satoshis("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa", 5_000_000_000, 3);
/// assert_eq!(info.balance, 50.0);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AddressInfo {
    /// The address as reported by the upstream provider
    pub address: String,
    /// Confirmed balance in BTC
    pub balance: f64,
    /// Number of transactions involving the address
    pub transaction_count: u64,
}

impl AddressInfo {
    /// Creates a snapshot from an upstream satoshi balance.
    pub fn from_satoshis(address: impl Into<String>, balance_sats: u64, transaction_count: u64) -> Self {
        Self {
            address: address.into(),
            balance: satoshis_to_btc(balance_sats),
            transaction_count,
        }
    }

    /// Serializes to the JSON form stored in the cache.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses the JSON form stored in the cache.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape() {
        let info = AddressInfo::from_satoshis("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa", 5_000_000_000, 3);
        let value: serde_json::Value = serde_json::from_str(&info.to_json().unwrap()).unwrap();

        assert_eq!(value["address"], "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa");
        assert_eq!(value["balance"], 50.0);
        assert_eq!(value["transaction_count"], 3);
    }

    #[test]
    fn test_json_roundtrip() {
        let info = AddressInfo::from_satoshis("bc1qar0srrr7xfkvy5l643lydnw9re59gtzzwf5mdq", 123_456, 7);
        let parsed = AddressInfo::from_json(&info.to_json().unwrap()).unwrap();
        assert_eq!(parsed, info);
    }

    #[test]
    fn test_from_json_rejects_missing_field() {
        assert!(AddressInfo::from_json(r#"{"address":"1abc","balance":1.0}"#).is_err());
    }
}
