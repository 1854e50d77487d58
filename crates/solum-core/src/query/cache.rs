//! TTL-keyed memoization for expensive derived queries.
//!
//! Entries hold owned values, never snapshot positions, so a cached result
//! stays valid across corpus reloads (at the cost of bounded staleness).

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

use crate::time::{Clock, SystemClock};

/// TTL for memoized derived-analysis results (aggregate views go stale
/// faster than plain filtered pages).
pub const FRACTION_RESULT_TTL: Duration = Duration::from_secs(2 * 60);

/// TTL for memoized filtered-query pages.
pub const QUERY_RESULT_TTL: Duration = Duration::from_secs(3 * 60);

/// How often the background sweeper purges expired one-shot entries.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

struct CacheEntry<T> {
    value: T,
    inserted_at: Instant,
    ttl: Duration,
}

/// Generic TTL result cache.
///
/// Expiry is lazy on `get`; `sweep` (normally driven by [`spawn_sweeper`])
/// bounds memory growth from one-shot queries. The lock is scoped to
/// individual key operations.
pub struct ResultCache<T> {
    default_ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, CacheEntry<T>>>,
}

impl<T: Clone> ResultCache<T> {
    pub fn new(default_ttl: Duration) -> Self {
        Self::with_clock(default_ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            default_ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Cached value for `key`, dropping it first if expired.
    pub fn get(&self, key: &str) -> Option<T> {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if now.duration_since(entry.inserted_at) <= entry.ttl => {
                Some(entry.value.clone())
            }
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn set(&self, key: String, value: T) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    pub fn set_with_ttl(&self, key: String, value: T, ttl: Duration) {
        let entry = CacheEntry {
            value,
            inserted_at: self.clock.now(),
            ttl,
        };
        self.entries.lock().insert(key, entry);
    }

    /// Drop every expired entry; returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| now.duration_since(entry.inserted_at) <= entry.ttl);
        let removed = before - entries.len();
        if removed > 0 {
            debug!(removed, remaining = entries.len(), "result cache sweep");
        }
        removed
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

/// Periodically sweep `cache` on a background thread.
///
/// The thread holds only a `Weak` reference and exits on its own once every
/// strong handle to the cache is gone.
pub fn spawn_sweeper<T>(cache: &Arc<ResultCache<T>>, every: Duration) -> std::thread::JoinHandle<()>
where
    T: Clone + Send + Sync + 'static,
{
    let weak: Weak<ResultCache<T>> = Arc::downgrade(cache);
    std::thread::spawn(move || loop {
        std::thread::sleep(every);
        match weak.upgrade() {
            Some(cache) => {
                cache.sweep();
            }
            None => break,
        }
    })
}

/// Canonical cache key for a set of named predicate values.
///
/// Names are sorted lexicographically and concatenated as `name:json(value)`
/// pairs, so two logically identical queries supplied in different field
/// order collide to the same key.
pub fn cache_key(pairs: &[(String, serde_json::Value)]) -> String {
    let mut pairs: Vec<&(String, serde_json::Value)> = pairs.iter().collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    pairs
        .iter()
        .map(|(name, value)| format!("{name}:{value}"))
        .collect::<Vec<_>>()
        .join("|")
}
