//! # Explorer Providers
//!
//! Upstream data providers and the registry that selects one by name.
//!
//! - [`BlockCypherProvider`]: BlockCypher REST API (Bitcoin mainnet)
//! - [`ProviderRegistry`]: name → provider lookup used at startup

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod blockcypher;
mod registry;

pub use blockcypher::{BlockCypherConfig, BlockCypherProvider};
pub use registry::{ProviderRegistry, ProvidersConfig};
