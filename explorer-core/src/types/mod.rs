//! Domain types for the explorer.
//!
//! - [`AddressInfo`]: Balance and activity snapshot for one address
//! - [`TransactionInfo`]: A transaction with its input and output legs
//! - [`TransactionEndpoint`]: One input or output leg

mod address;
mod transaction;

pub use address::*;
pub use transaction::*;

use crate::constants::SATOSHIS_PER_BTC;

/// Converts an integer satoshi amount to whole bitcoin.
pub fn satoshis_to_btc(satoshis: u64) -> f64 {
    satoshis as f64 / SATOSHIS_PER_BTC
}
