//! # Explorer Core
//!
//! Core types, errors, and traits for the Bitcoin explorer caching API.
//!
//! This crate provides the foundational building blocks used by all other explorer crates:
//!
//! - **Types**: Address and transaction snapshots returned to clients and stored in the cache
//! - **Errors**: Error types for providers and cache stores
//! - **Constants**: Cache TTL policy, unit conversion, provider names
//! - **Traits**: [`DataProvider`] and [`CacheStore`] seams for swapping implementations
//! - **Validation**: Structural checks for addresses and transaction hashes
//!
//! ## Example
//!
//! ```rust
//! use explorer_core::{is_valid_address, is_valid_transaction_hash};
//!
//! assert!(is_valid_address("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa"));
//! assert!(!is_valid_transaction_hash("deadbeef"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;
pub mod validation;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{CacheError, CacheResult, ExplorerError, Result};
pub use traits::*;
pub use types::*;
pub use validation::{classify, is_valid_address, is_valid_transaction_hash, IdentifierKind};
