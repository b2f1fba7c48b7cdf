//! Cache store backends for the Bitcoin explorer.
//!
//! - [`RedisCache`]: production backend shared by every API instance
//! - [`MemoryCache`]: process-local backend for development and tests
//!
//! Both implement [`explorer_core::CacheStore`].

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod memory;
mod redis_cache;

pub use memory::{glob_match, CacheConfig, CacheStats, MemoryCache};
pub use redis_cache::{RedisCache, RedisConfig};
