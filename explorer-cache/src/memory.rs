//! In-memory TTL cache.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use explorer_core::error::{CacheError, CacheResult};
use explorer_core::traits::CacheStore;

/// Cache entry with optional TTL.
#[derive(Clone)]
struct CacheEntry {
    value: String,
    inserted_at: Instant,
    ttl: Option<Duration>,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.ttl
            .map(|ttl| self.inserted_at.elapsed() > ttl)
            .unwrap_or(false)
    }
}

/// Cache configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of entries
    pub max_entries: usize,
    /// Whether to drop expired entries before evicting live ones
    pub auto_cleanup: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            auto_cleanup: true,
        }
    }
}

/// Process-local cache store.
///
/// Thread-safe, supports per-entry expiration and evicts the oldest entry
/// when full. Expired entries are dropped lazily.
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    config: CacheConfig,
    closed: AtomicBool,
}

impl MemoryCache {
    /// Creates a new cache with default configuration.
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    /// Creates a cache with custom configuration.
    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            config,
            closed: AtomicBool::new(false),
        }
    }

    /// Returns the TTL an entry was stored with.
    ///
    /// `None` if the key is absent or expired, `Some(None)` for an entry that never expires.
    pub fn configured_ttl(&self, key: &str) -> Option<Option<Duration>> {
        let entries = self.entries.read();
        entries
            .get(key)
            .filter(|e| !e.is_expired())
            .map(|e| e.ttl)
    }

    /// Removes all expired entries.
    pub fn cleanup_expired(&self) {
        self.entries.write().retain(|_, e| !e.is_expired());
    }

    /// Returns the number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.read();
        let expired = entries.values().filter(|e| e.is_expired()).count();
        let persistent = entries.values().filter(|e| e.ttl.is_none()).count();
        CacheStats {
            total_entries: entries.len(),
            expired_entries: expired,
            valid_entries: entries.len().saturating_sub(expired),
            persistent_entries: persistent,
            capacity: self.config.max_entries,
        }
    }

    fn ensure_open(&self) -> CacheResult<()> {
        if self.closed.load(Ordering::Acquire) {
            Err(CacheError::Closed)
        } else {
            Ok(())
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        self.ensure_open()?;
        let entries = self.entries.read();
        Ok(entries.get(key).and_then(|e| {
            if e.is_expired() {
                None
            } else {
                Some(e.value.clone())
            }
        }))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> CacheResult<()> {
        self.ensure_open()?;
        let mut entries = self.entries.write();

        if !entries.contains_key(key) {
            if self.config.auto_cleanup && entries.len() >= self.config.max_entries {
                entries.retain(|_, e| !e.is_expired());
            }
            if entries.len() >= self.config.max_entries {
                if let Some(oldest_key) = entries
                    .iter()
                    .min_by_key(|(_, e)| e.inserted_at)
                    .map(|(k, _)| k.clone())
                {
                    debug!(key = %oldest_key, "Evicting oldest cache entry");
                    entries.remove(&oldest_key);
                }
            }
        }

        entries.insert(
            key.to_string(),
            CacheEntry {
                value: value.to_string(),
                inserted_at: Instant::now(),
                ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        self.ensure_open()?;
        Ok(self.entries.write().remove(key).is_some())
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        self.ensure_open()?;
        Ok(self
            .entries
            .read()
            .get(key)
            .map(|e| !e.is_expired())
            .unwrap_or(false))
    }

    async fn keys(&self, pattern: &str) -> CacheResult<Vec<String>> {
        self.ensure_open()?;
        let entries = self.entries.read();
        let mut keys: Vec<String> = entries
            .iter()
            .filter(|(k, e)| !e.is_expired() && glob_match(pattern, k))
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn flush(&self) -> CacheResult<()> {
        self.ensure_open()?;
        self.entries.write().clear();
        Ok(())
    }

    async fn close(&self) -> CacheResult<()> {
        self.closed.store(true, Ordering::Release);
        self.entries.write().clear();
        Ok(())
    }
}

/// Matches `text` against a Redis-style glob pattern.
///
/// Supports `*` (any run), `?` (any single character), `[...]` classes with
/// `^` negation and `a-z` ranges, and `\` to escape the next character.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    // Position of the last `*` seen and the text index it was tried at
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        if pattern.get(p) == Some(&'*') {
            backtrack = Some((p, t));
            p += 1;
            continue;
        }
        if let Some(next) = match_token(&pattern, p, text[t]) {
            p = next;
            t += 1;
            continue;
        }

        match backtrack {
            Some((star_p, star_t)) => {
                p = star_p + 1;
                t = star_t + 1;
                backtrack = Some((star_p, star_t + 1));
            }
            None => return false,
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}

/// Matches one non-`*` token at `p` against `c`, returning the next pattern index.
fn match_token(pattern: &[char], p: usize, c: char) -> Option<usize> {
    match *pattern.get(p)? {
        '?' => Some(p + 1),
        '\\' if p + 1 < pattern.len() => (pattern[p + 1] == c).then_some(p + 2),
        '[' => match_class(pattern, p + 1, c),
        other => (other == c).then_some(p + 1),
    }
}

/// Matches a bracket class starting just after `[`.
///
/// An unterminated class extends to the end of the pattern, as in Redis.
fn match_class(pattern: &[char], mut p: usize, c: char) -> Option<usize> {
    let negate = pattern.get(p) == Some(&'^');
    if negate {
        p += 1;
    }

    let mut matched = false;
    while p < pattern.len() && pattern[p] != ']' {
        if pattern[p] == '\\' && p + 1 < pattern.len() {
            matched |= pattern[p + 1] == c;
            p += 2;
        } else if p + 2 < pattern.len() && pattern[p + 1] == '-' && pattern[p + 2] != ']' {
            let (lo, hi) = if pattern[p] <= pattern[p + 2] {
                (pattern[p], pattern[p + 2])
            } else {
                (pattern[p + 2], pattern[p])
            };
            matched |= (lo..=hi).contains(&c);
            p += 3;
        } else {
            matched |= pattern[p] == c;
            p += 1;
        }
    }

    let next = (p + 1).min(pattern.len());
    (matched != negate).then_some(next)
}

/// Cache statistics.
#[derive(Clone, Debug)]
pub struct CacheStats {
    /// Total entries (including expired)
    pub total_entries: usize,
    /// Expired entries not yet dropped
    pub expired_entries: usize,
    /// Valid (non-expired) entries
    pub valid_entries: usize,
    /// Entries stored without a TTL
    pub persistent_entries: usize,
    /// Maximum capacity
    pub capacity: usize,
}
