//! Request deduplication and TTL cache guard
//!
//! Polling screens fire the same read over and over; the guard keeps one
//! fetch per key in flight and serves a short-lived cached value in
//! between. Callers that arrive while a fetch is running get the last
//! known value immediately instead of blocking behind it.
//!
//! All operations are O(1) on DashMap. The in-flight latch is released by
//! an RAII guard, so a fetch that errors or is cancelled never wedges its
//! key.

use crate::error::Result;
use dashmap::DashMap;
use serde_json::Value;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Cache freshness window used when callers have no better number
pub const DEFAULT_TTL: Duration = Duration::from_secs(10);

// ============================================================================
// Outcome
// ============================================================================

/// How a guarded call was satisfied
#[derive(Debug, Clone, PartialEq)]
pub enum GuardOutcome {
    /// Fresh cached value; the fetcher was not invoked
    Cached(Value),
    /// The fetcher ran and its result was stored
    Fetched(Value),
    /// Another call holds this key; carries the last known value, if any
    InFlight(Option<Value>),
}

impl GuardOutcome {
    /// The carried value, when there is one
    pub fn value(&self) -> Option<&Value> {
        match self {
            GuardOutcome::Cached(v) | GuardOutcome::Fetched(v) => Some(v),
            GuardOutcome::InFlight(v) => v.as_ref(),
        }
    }

    /// Consume into the carried value, when there is one
    pub fn into_value(self) -> Option<Value> {
        match self {
            GuardOutcome::Cached(v) | GuardOutcome::Fetched(v) => Some(v),
            GuardOutcome::InFlight(v) => v,
        }
    }
}

// ============================================================================
// Entries and statistics
// ============================================================================

struct CacheEntry {
    value: Value,
    stored_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() < ttl
    }
}

/// Counters for the guard
#[derive(Debug, Clone, Default)]
pub struct GuardStats {
    /// Cached values currently stored
    pub entries: usize,
    /// Keys with a fetch in flight right now
    pub in_flight: usize,
    /// Calls served from a fresh cache entry
    pub hits: u64,
    /// Calls that ran their fetcher
    pub misses: u64,
    /// Calls answered with a last-known value while a fetch was running
    pub coalesced: u64,
    /// Explicit invalidations
    pub invalidations: u64,
}

impl GuardStats {
    /// Hit rate as a percentage of all resolved calls
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses + self.coalesced;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

// ============================================================================
// Guard
// ============================================================================

/// Keyed single-flight guard with a TTL value cache
pub struct FetchGuard {
    entries: DashMap<String, CacheEntry>,
    in_flight: DashMap<String, ()>,
    hits: AtomicU64,
    misses: AtomicU64,
    coalesced: AtomicU64,
    invalidations: AtomicU64,
}

/// Clears the in-flight mark for a key when dropped
struct InFlightLatch<'a> {
    map: &'a DashMap<String, ()>,
    key: String,
}

impl Drop for InFlightLatch<'_> {
    fn drop(&mut self) {
        self.map.remove(&self.key);
    }
}

impl Default for FetchGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchGuard {
    /// Create an empty guard
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            in_flight: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            coalesced: AtomicU64::new(0),
            invalidations: AtomicU64::new(0),
        }
    }

    /// Run `fetcher` at most once per `key` per `ttl` window.
    ///
    /// - fresh cache entry: returns it without fetching;
    /// - fetch already in flight for `key`: returns the last stored value
    ///   immediately, without blocking on the other call;
    /// - otherwise: marks the key, runs the fetcher, stores the result.
    ///
    /// Fetcher errors propagate unchanged and cache nothing. The in-flight
    /// mark clears on every exit, including cancellation.
    pub async fn guarded<F, Fut>(&self, key: &str, ttl: Duration, fetcher: F) -> Result<GuardOutcome>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        if let Some(entry) = self.entries.get(key) {
            if entry.is_fresh(ttl) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key = key, "Guard cache hit");
                return Ok(GuardOutcome::Cached(entry.value.clone()));
            }
        }

        // Take the latch without holding any shard lock across an await
        let acquired = {
            use dashmap::mapref::entry::Entry;
            match self.in_flight.entry(key.to_string()) {
                Entry::Occupied(_) => false,
                Entry::Vacant(slot) => {
                    slot.insert(());
                    true
                }
            }
        };

        if !acquired {
            self.coalesced.fetch_add(1, Ordering::Relaxed);
            let last_known = self.entries.get(key).map(|e| e.value.clone());
            debug!(
                key = key,
                has_last_known = last_known.is_some(),
                "Guard fetch already in flight"
            );
            return Ok(GuardOutcome::InFlight(last_known));
        }

        let _latch = InFlightLatch {
            map: &self.in_flight,
            key: key.to_string(),
        };

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(key = key, "Guard fetching");

        match fetcher().await {
            Ok(value) => {
                self.entries.insert(
                    key.to_string(),
                    CacheEntry {
                        value: value.clone(),
                        stored_at: Instant::now(),
                    },
                );
                Ok(GuardOutcome::Fetched(value))
            }
            Err(e) => {
                warn!(key = key, error = %e, "Guard fetch failed");
                Err(e)
            }
        }
    }

    /// Drop one cached entry immediately
    pub fn invalidate(&self, key: &str) {
        if self.entries.remove(key).is_some() {
            self.invalidations.fetch_add(1, Ordering::Relaxed);
            debug!(key = key, "Guard entry invalidated");
        }
    }

    /// Drop every cached entry (in-flight marks stay with their calls)
    pub fn clear(&self) {
        let count = self.entries.len();
        self.entries.clear();
        debug!(count = count, "Guard cache cleared");
    }

    /// Current counters
    pub fn stats(&self) -> GuardStats {
        GuardStats {
            entries: self.entries.len(),
            in_flight: self.in_flight.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
        }
    }
}
