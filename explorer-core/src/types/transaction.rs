//! Transaction types.

use serde::{Deserialize, Serialize};

use crate::constants::UNCONFIRMED_TX_INDEX;
use crate::error::Result;

/// One input or output leg of a transaction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransactionEndpoint {
    /// Primary address of the leg
    pub address: String,
    /// Amount in BTC
    pub value: f64,
}

impl TransactionEndpoint {
    /// Creates a new endpoint.
    pub fn new(address: impl Into<String>, value: f64) -> Self {
        Self {
            address: address.into(),
            value,
        }
    }
}

/// A Bitcoin transaction as served to clients.
///
/// `transaction_index` carries the block height for mined transactions and
/// [`UNCONFIRMED_TX_INDEX`] while the transaction sits in the mempool. Mined
/// transactions never change, which is what lets them be cached without expiry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransactionInfo {
    /// Transaction id (hex)
    pub hash: String,
    /// Fee paid, in BTC
    pub fee: f64,
    /// Inputs, in upstream order
    pub inputs: Vec<TransactionEndpoint>,
    /// Outputs, in upstream order
    pub outputs: Vec<TransactionEndpoint>,
    /// Block height, or `-1` when unconfirmed
    pub transaction_index: i64,
    /// Time the upstream first saw the transaction
    pub block_time: String,
}

impl TransactionInfo {
    /// Returns true once the transaction has been included in a block.
    pub fn is_confirmed(&self) -> bool {
        self.transaction_index != UNCONFIRMED_TX_INDEX
    }

    /// Sum of all input values, in BTC.
    pub fn total_input(&self) -> f64 {
        self.inputs.iter().map(|i| i.value).sum()
    }

    /// Sum of all output values, in BTC.
    pub fn total_output(&self) -> f64 {
        self.outputs.iter().map(|o| o.value).sum()
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
