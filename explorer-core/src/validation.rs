//! Structural validation of Bitcoin identifiers.
//!
//! These checks only look at the shape of a string: prefix, alphabet and
//! length. No checksum is verified, so a well-formed address with a bad
//! checksum passes here and is rejected later by the upstream provider.

use crate::constants::{
    BASE58_ADDRESS_MAX_LEN, BASE58_ADDRESS_MIN_LEN, BECH32_ADDRESS_MAX_LEN,
    BECH32_ADDRESS_MIN_LEN, BECH32_PREFIX, TX_HASH_LEN,
};

/// Kind of identifier a lookup string refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdentifierKind {
    /// A legacy, script-hash or segwit address
    Address,
    /// A 64-character transaction id
    TransactionHash,
}

/// Returns true if `address` has the shape of a mainnet Bitcoin address.
///
/// Accepted shapes:
/// - P2PKH / P2SH: starts with `1` or `3`, base58 alphabet, 26–35 characters
/// - Segwit: starts with `bc1`, alphanumeric without uppercase `I`/`O`, 28–42 characters
pub fn is_valid_address(address: &str) -> bool {
    is_base58_address(address) || is_bech32_address(address)
}

/// Returns true if `hash` is exactly 64 hexadecimal characters (any case).
pub fn is_valid_transaction_hash(hash: &str) -> bool {
    hash.len() == TX_HASH_LEN && hash.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Classifies a free-form query string.
///
/// The two shapes never overlap: a transaction hash is longer than any
/// accepted address.
pub fn classify(query: &str) -> Option<IdentifierKind> {
    if is_valid_transaction_hash(query) {
        Some(IdentifierKind::TransactionHash)
    } else if is_valid_address(query) {
        Some(IdentifierKind::Address)
    } else {
        None
    }
}

fn is_base58_address(address: &str) -> bool {
    let bytes = address.as_bytes();
    if !(BASE58_ADDRESS_MIN_LEN..=BASE58_ADDRESS_MAX_LEN).contains(&bytes.len()) {
        return false;
    }
    matches!(bytes[0], b'1' | b'3') && bytes[1..].iter().copied().all(is_base58_char)
}

fn is_bech32_address(address: &str) -> bool {
    if !(BECH32_ADDRESS_MIN_LEN..=BECH32_ADDRESS_MAX_LEN).contains(&address.len()) {
        return false;
    }
    match address.strip_prefix(BECH32_PREFIX) {
        Some(data) => data.bytes().all(is_bech32_char),
        None => false,
    }
}

// Base58 drops 0, O, I and l.
fn is_base58_char(b: u8) -> bool {
    match b {
        b'1'..=b'9' => true,
        b'A'..=b'Z' => b != b'I' && b != b'O',
        b'a'..=b'z' => b != b'l',
        _ => false,
    }
}

// Lowercase is unrestricted; uppercase I and O are rejected.
fn is_bech32_char(b: u8) -> bool {
    match b {
        b'0'..=b'9' | b'a'..=b'z' => true,
        b'A'..=b'Z' => b != b'I' && b != b'O',
        _ => false,
    }
}
