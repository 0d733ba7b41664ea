//! Verdict cache keyed by a fingerprint of the statement.
//!
//! [`JudgementCache`] applies the TTL policy on top of a pluggable
//! [`CacheStore`]; the store only keeps the newest entry per key. An entry
//! older than the TTL is treated as absent and is overwritten by the next
//! write for the same key.
//!
//! The in-memory store grows without bound: nothing is evicted, stale entries
//! are only superseded. Keys are content-addressed and volume is low, so this
//! is acceptable for a single chat deployment but not beyond.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};

/// Default lifetime of a cached verdict.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

// ---------------------------------------------------------------------------
// Fingerprint
// ---------------------------------------------------------------------------

/// Normalization applied before fingerprinting and the empty-input check.
pub fn normalize(text: &str) -> &str {
    text.trim()
}

/// Stable SHA-256 hex digest of the normalized statement.
pub fn fingerprint(text: &str) -> String {
    format!("{:x}", Sha256::digest(normalize(text).as_bytes()))
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Source of "now" in whole seconds since the Unix epoch.
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// CacheStore
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub verdict: String,
    /// Seconds since the Unix epoch.
    pub created_at: u64,
}

/// Backing store for cached verdicts. Last write wins per key.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Option<CacheEntry>;
    fn put(&self, key: &str, verdict: String, created_at: u64);
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for InMemoryStore {
    fn get(&self, key: &str) -> Option<CacheEntry> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn put(&self, key: &str, verdict: String, created_at: u64) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(
                key.to_string(),
                CacheEntry {
                    verdict,
                    created_at,
                },
            );
        }
    }
}

// ---------------------------------------------------------------------------
// JudgementCache
// ---------------------------------------------------------------------------

/// TTL policy over a [`CacheStore`].
#[derive(Clone)]
pub struct JudgementCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl JudgementCache {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// In-memory cache with the default one-hour TTL.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryStore::new()), DEFAULT_TTL)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Live verdict for `key` at time `now`, if any.
    pub fn lookup(&self, key: &str, now: u64) -> Option<String> {
        let entry = self.store.get(key)?;
        let age = now.saturating_sub(entry.created_at);
        if age < self.ttl.as_secs() {
            Some(entry.verdict)
        } else {
            log::debug!("cache entry {key} expired ({age}s old)");
            None
        }
    }

    pub fn insert(&self, key: &str, verdict: String, now: u64) {
        self.store.put(key, verdict, now);
    }
}

impl Default for JudgementCache {
    fn default() -> Self {
        Self::in_memory()
    }
}
