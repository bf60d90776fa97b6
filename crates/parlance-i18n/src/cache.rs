//! Bounded TTL cache of rendered messages.

use crate::fingerprint::Fingerprint;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

/// Share of `max_entries` removed when a full cache has nothing expired.
const EVICTION_FRACTION: f64 = 0.2;

/// Cache counters and gauges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Lookups that returned a value.
    pub hits: u64,
    /// Lookups that found nothing usable.
    pub misses: u64,
    /// Entries removed by expiry sweeps or capacity eviction.
    pub evictions: u64,
    /// Entries currently stored, including not yet purged expired ones.
    pub entries: usize,
    /// `hits / (hits + misses)`, or 0 before any lookup.
    pub hit_rate: f64,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// In-memory storage behind [`ResponseCache::Memory`].
#[derive(Debug)]
pub struct MemoryCache {
    entries: RwLock<HashMap<Fingerprint, CacheEntry>>,
    max_entries: usize,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    /// Bumped by every `clear` while the write lock is held.
    generation: AtomicU64,
}

impl MemoryCache {
    fn insert(
        &self,
        entries: &mut HashMap<Fingerprint, CacheEntry>,
        key: Fingerprint,
        value: String,
    ) {
        let now = Instant::now();

        if entries.len() >= self.max_entries && !entries.contains_key(&key) {
            let before = entries.len();
            entries.retain(|_, entry| entry.is_live(now));
            let mut evicted = before - entries.len();

            if entries.len() >= self.max_entries {
                let batch = eviction_batch(self.max_entries);
                let victims: Vec<Fingerprint> = entries.keys().take(batch).cloned().collect();
                for victim in &victims {
                    entries.remove(victim);
                }
                evicted += victims.len();
            }

            self.evictions.fetch_add(evicted as u64, Ordering::Relaxed);
            debug!("Evicted {} cache entries", evicted);
        }

        entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: now + self.ttl,
            },
        );
    }
}

/// Rendered-string cache used by the translator.
#[derive(Debug)]
pub enum ResponseCache {
    /// Bounded map with per-entry expiry.
    Memory(MemoryCache),
    /// Always misses; stores nothing.
    Disabled,
}

impl ResponseCache {
    /// A cache holding at most `max_entries` values for `ttl` each.
    pub fn memory(max_entries: usize, ttl: Duration) -> Self {
        Self::Memory(MemoryCache {
            entries: RwLock::new(HashMap::with_capacity(max_entries.min(4096))),
            max_entries: max_entries.max(1),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            generation: AtomicU64::new(0),
        })
    }

    /// The cached value for `key`, if present and not expired.
    pub fn get(&self, key: &Fingerprint) -> Option<String> {
        let Self::Memory(cache) = self else {
            return None;
        };
        let now = Instant::now();

        let found = {
            let entries = cache.entries.read();
            entries.get(key).map(|entry| {
                if entry.is_live(now) {
                    Ok(entry.value.clone())
                } else {
                    Err(())
                }
            })
        };

        match found {
            Some(Ok(value)) => {
                cache.hits.fetch_add(1, Ordering::Relaxed);
                Some(value)
            }
            Some(Err(())) => {
                let mut entries = cache.entries.write();
                if entries.get(key).is_some_and(|e| !e.is_live(now)) {
                    entries.remove(key);
                    cache.evictions.fetch_add(1, Ordering::Relaxed);
                }
                cache.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                cache.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Stores `value` under `key` with a fresh expiry.
    ///
    /// A full cache first drops expired entries and, if still full, a fifth
    /// of its capacity in arbitrary order.
    pub fn set(&self, key: Fingerprint, value: String) {
        if let Self::Memory(cache) = self {
            let mut entries = cache.entries.write();
            cache.insert(&mut entries, key, value);
        }
    }

    /// Number of times the cache has been cleared.
    ///
    /// Read it before rendering from a bundle snapshot and pass it to
    /// [`ResponseCache::set_if_generation`].
    pub fn generation(&self) -> u64 {
        match self {
            Self::Memory(cache) => cache.generation.load(Ordering::SeqCst),
            Self::Disabled => 0,
        }
    }

    /// Stores `value` only if no `clear` happened since `generation` was
    /// read. Returns whether the value was stored.
    ///
    /// A value rendered from a bundle that a reload has since replaced is
    /// dropped instead of outliving the reload.
    pub fn set_if_generation(&self, key: Fingerprint, value: String, generation: u64) -> bool {
        let Self::Memory(cache) = self else {
            return false;
        };
        let mut entries = cache.entries.write();
        if cache.generation.load(Ordering::SeqCst) != generation {
            debug!("Dropping value rendered before the last cache clear");
            return false;
        }
        cache.insert(&mut entries, key, value);
        true
    }

    /// Removes one entry.
    pub fn remove(&self, key: &Fingerprint) {
        if let Self::Memory(cache) = self {
            cache.entries.write().remove(key);
        }
    }

    /// Removes every entry. Counters are kept.
    pub fn clear(&self) {
        if let Self::Memory(cache) = self {
            let mut entries = cache.entries.write();
            let removed = entries.len();
            entries.clear();
            cache.generation.fetch_add(1, Ordering::SeqCst);
            debug!("Cleared {} cache entries", removed);
        }
    }

    /// Removes every entry and resets the counters.
    pub fn reset(&self) {
        self.clear();
        if let Self::Memory(cache) = self {
            cache.hits.store(0, Ordering::Relaxed);
            cache.misses.store(0, Ordering::Relaxed);
            cache.evictions.store(0, Ordering::Relaxed);
        }
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        match self {
            Self::Memory(cache) => cache.entries.read().len(),
            Self::Disabled => 0,
        }
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether values are retained at all.
    pub const fn is_enabled(&self) -> bool {
        matches!(self, Self::Memory(_))
    }

    /// Current counters.
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> CacheStats {
        let Self::Memory(cache) = self else {
            return CacheStats::default();
        };
        let hits = cache.hits.load(Ordering::Relaxed);
        let misses = cache.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        CacheStats {
            hits,
            misses,
            evictions: cache.evictions.load(Ordering::Relaxed),
            entries: cache.entries.read().len(),
            hit_rate: if total == 0 {
                0.0
            } else {
                hits as f64 / total as f64
            },
        }
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn eviction_batch(max_entries: usize) -> usize {
    ((max_entries as f64 * EVICTION_FRACTION) as usize).max(1)
}
