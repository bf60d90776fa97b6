//! Translation metrics.
//!
//! Counters are plain atomics. Latency percentiles are computed from a
//! bounded ring of the most recent timings.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Number of recent timings kept for percentile estimates.
pub const TIMING_WINDOW: usize = 1024;

/// Translation counters and recent timings for one service.
#[derive(Debug)]
pub struct TranslationMetrics {
    translations: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    fallbacks: AtomicU64,
    missing: AtomicU64,
    total_nanos: AtomicU64,
    recent: Mutex<VecDeque<Duration>>,
}

impl Default for TranslationMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl TranslationMetrics {
    /// Empty metrics.
    pub fn new() -> Self {
        Self {
            translations: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            fallbacks: AtomicU64::new(0),
            missing: AtomicU64::new(0),
            total_nanos: AtomicU64::new(0),
            recent: Mutex::new(VecDeque::with_capacity(TIMING_WINDOW)),
        }
    }

    /// Records the wall-clock time of one translate call.
    pub fn record_translation(&self, elapsed: Duration) {
        self.translations.fetch_add(1, Ordering::Relaxed);
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.total_nanos.fetch_add(nanos, Ordering::Relaxed);

        let mut recent = self.recent.lock();
        if recent.len() == TIMING_WINDOW {
            recent.pop_front();
        }
        recent.push_back(elapsed);
    }

    /// Record a cache hit.
    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a cache miss.
    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a message served from the fallback language.
    pub fn record_fallback(&self) {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a message missing from both languages.
    pub fn record_missing(&self) {
        self.missing.fetch_add(1, Ordering::Relaxed);
    }

    /// Current values.
    #[allow(clippy::cast_precision_loss)]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let translations = self.translations.load(Ordering::Relaxed);
        let cache_hits = self.cache_hits.load(Ordering::Relaxed);
        let cache_misses = self.cache_misses.load(Ordering::Relaxed);
        let lookups = cache_hits + cache_misses;

        let average = if translations == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos(self.total_nanos.load(Ordering::Relaxed) / translations)
        };

        let mut sorted: Vec<Duration> = self.recent.lock().iter().copied().collect();
        sorted.sort_unstable();

        MetricsSnapshot {
            total_translations: translations,
            cache_hits,
            cache_misses,
            cache_hit_rate: if lookups == 0 {
                0.0
            } else {
                cache_hits as f64 / lookups as f64 * 100.0
            },
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
            missing: self.missing.load(Ordering::Relaxed),
            avg_translation_time: average,
            p95_translation_time: percentile(&sorted, 95),
            p99_translation_time: percentile(&sorted, 99),
        }
    }

    /// Reset everything to zero.
    pub fn reset(&self) {
        self.translations.store(0, Ordering::Relaxed);
        self.cache_hits.store(0, Ordering::Relaxed);
        self.cache_misses.store(0, Ordering::Relaxed);
        self.fallbacks.store(0, Ordering::Relaxed);
        self.missing.store(0, Ordering::Relaxed);
        self.total_nanos.store(0, Ordering::Relaxed);
        self.recent.lock().clear();
    }
}

/// Nearest-rank percentile of an ascending slice.
fn percentile(sorted: &[Duration], pct: usize) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let rank = (pct * sorted.len()).div_ceil(100).max(1);
    sorted[rank.min(sorted.len()) - 1]
}

/// Point-in-time view of [`TranslationMetrics`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    /// Translate calls recorded.
    pub total_translations: u64,
    /// Calls answered from the cache.
    pub cache_hits: u64,
    /// Calls that had to render.
    pub cache_misses: u64,
    /// Cache hit rate as a percentage (0-100).
    pub cache_hit_rate: f64,
    /// Messages served from the fallback language.
    pub fallbacks: u64,
    /// Messages missing everywhere.
    pub missing: u64,
    /// Mean call time.
    pub avg_translation_time: Duration,
    /// 95th percentile over the recent window.
    pub p95_translation_time: Duration,
    /// 99th percentile over the recent window.
    pub p99_translation_time: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_and_average() {
        let metrics = TranslationMetrics::new();
        metrics.record_translation(Duration::from_micros(10));
        metrics.record_translation(Duration::from_micros(30));
        metrics.record_cache_hit();
        metrics.record_cache_miss();
        metrics.record_cache_miss();
        metrics.record_cache_miss();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_translations, 2);
        assert_eq!(snapshot.avg_translation_time, Duration::from_micros(20));
        assert!((snapshot.cache_hit_rate - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_percentiles() {
        let metrics = TranslationMetrics::new();
        for micros in 1..=100 {
            metrics.record_translation(Duration::from_micros(micros));
        }

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.p95_translation_time, Duration::from_micros(95));
        assert_eq!(snapshot.p99_translation_time, Duration::from_micros(99));
    }

    #[test]
    fn test_window_is_bounded() {
        let metrics = TranslationMetrics::new();
        for _ in 0..TIMING_WINDOW {
            metrics.record_translation(Duration::from_secs(1));
        }
        for _ in 0..TIMING_WINDOW {
            metrics.record_translation(Duration::from_millis(1));
        }

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.p99_translation_time, Duration::from_millis(1));
        assert_eq!(snapshot.total_translations, 2 * TIMING_WINDOW as u64);
    }

    #[test]
    fn test_empty_and_reset() {
        let metrics = TranslationMetrics::new();
        assert_eq!(metrics.snapshot().p95_translation_time, Duration::ZERO);

        metrics.record_translation(Duration::from_millis(5));
        metrics.record_fallback();
        metrics.reset();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_translations, 0);
        assert_eq!(snapshot.fallbacks, 0);
    }
}
