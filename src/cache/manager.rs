//! In-memory cache manager with per-entry TTL
//!
//! Provides a `CacheManager` that keeps API responses in a process-local map with
//! expiry timestamps. Expiry is lazy: nothing runs in the background, and an
//! expired entry is removed the first time a read touches it.

use chrono::{DateTime, Utc};
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use super::clock::{add_saturating, Clock, SystemClock};

/// Default time-to-live for entries stored without an explicit TTL (5 minutes)
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Errors that can occur when operating on the cache
#[derive(Debug, Error)]
pub enum CacheError {
    /// The invalidation pattern is not a valid regular expression
    #[error("Invalid cache key pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Configuration for a cache manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// TTL applied when `set` is called without one
    pub default_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_TTL,
        }
    }
}

/// A stored value and the instant after which it is stale
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

impl<V> CacheEntry<V> {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        now <= self.expires_at
    }
}

/// Process-local key/value store with lazy TTL expiry
///
/// The map sits behind a single mutex, so a manager can be shared across tasks
/// through an `Arc`. The lock is never held across an `.await`.
///
/// `keys()` and `size()` do not filter expired entries; they may report entries
/// that are logically gone but have not been touched since expiring.
pub struct CacheManager<V, C = SystemClock> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
    clock: C,
    default_ttl: Duration,
}

impl<V: Clone> CacheManager<V, SystemClock> {
    /// Creates an empty cache using wall-clock time and the default TTL
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl<V: Clone> Default for CacheManager<V, SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone, C: Clock> CacheManager<V, C> {
    /// Creates an empty cache driven by the given clock
    pub fn with_clock(clock: C) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
            default_ttl: DEFAULT_TTL,
        }
    }

    /// Creates an empty cache from configuration
    pub fn from_config(config: &CacheConfig, clock: C) -> Self {
        Self::with_clock(clock).with_default_ttl(config.default_ttl)
    }

    /// Overrides the TTL used when `set` is called without one
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Returns the TTL used when `set` is called without one
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Returns the clock driving expiry decisions
    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry<V>>> {
        // Every mutation is a single map call, so a poisoned map is still consistent.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Stores a value under `key`, replacing any previous entry
    ///
    /// # Arguments
    /// * `key` - Unique identifier for the entry (e.g., "vehicles", "vehicle_42")
    /// * `value` - The value to cache
    /// * `ttl` - How long the entry stays live; `None` uses the default TTL
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        let key = key.into();
        let ttl = ttl.unwrap_or(self.default_ttl);
        let expires_at = add_saturating(self.clock.now(), ttl);
        debug!(key = %key, ttl_ms = ttl.as_millis() as u64, "Cache set");
        self.lock().insert(key, CacheEntry { value, expires_at });
    }

    /// Reads a live value
    ///
    /// Returns `None` if the key is missing or expired. An expired entry is
    /// removed as a side effect.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.lock();
        let live = entries.get(key).map(|entry| entry.is_live(now));
        match live {
            Some(true) => entries.get(key).map(|entry| entry.value.clone()),
            Some(false) => {
                debug!(key = %key, "Cache entry expired, removing");
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Returns whether a live entry exists, with the same lazy cleanup as `get`
    pub fn has(&self, key: &str) -> bool {
        let now = self.clock.now();
        let mut entries = self.lock();
        let live = entries.get(key).map(|entry| entry.is_live(now));
        match live {
            Some(true) => true,
            Some(false) => {
                debug!(key = %key, "Cache entry expired, removing");
                entries.remove(key);
                false
            }
            None => false,
        }
    }

    /// Removes an entry, returning whether one was present
    pub fn delete(&self, key: &str) -> bool {
        self.lock().remove(key).is_some()
    }

    /// Removes every entry
    pub fn clear(&self) {
        let mut entries = self.lock();
        debug!(removed = entries.len(), "Cache cleared");
        entries.clear();
    }

    /// Removes every entry whose key matches `pattern`, returning how many were removed
    ///
    /// Matching uses `Regex::is_match`, so patterns are unanchored unless they
    /// say otherwise (`^vehicle_` vs `vehicle_`).
    pub fn clear_by_pattern(&self, pattern: &Regex) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|key, _| !pattern.is_match(key));
        let removed = before - entries.len();
        debug!(pattern = %pattern, removed, "Cache cleared by pattern");
        removed
    }

    /// Compiles `pattern` and removes every matching entry
    ///
    /// A malformed pattern is reported before anything is removed.
    pub fn clear_by_pattern_str(&self, pattern: &str) -> Result<usize, CacheError> {
        let regex = Regex::new(pattern)?;
        Ok(self.clear_by_pattern(&regex))
    }

    /// Removes every expired entry, returning how many were removed
    ///
    /// Never called automatically; hosts with high key churn can call it
    /// periodically to bound memory.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        let removed = before - entries.len();
        if removed > 0 {
            debug!(removed, "Purged expired cache entries");
        }
        removed
    }

    /// Returns a snapshot of the stored key names, including expired-but-unswept ones
    pub fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    /// Returns the number of stored entries, including expired-but-unswept ones
    pub fn size(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if nothing is stored
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Returns the expiry instant of a stored entry without touching it
    pub fn expires_at(&self, key: &str) -> Option<DateTime<Utc>> {
        self.lock().get(key).map(|entry| entry.expires_at)
    }
}

impl<V, C> std::fmt::Debug for CacheManager<V, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let size = self.entries.lock().map(|e| e.len()).unwrap_or_default();
        f.debug_struct("CacheManager")
            .field("size", &size)
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}
