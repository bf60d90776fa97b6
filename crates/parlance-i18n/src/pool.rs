//! Per-language pool of reusable localizers.

use crate::bundle::BundleHandle;
use crate::language::LanguageTag;
use crate::localizer::Localizer;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

/// Idle localizers created per language by [`LocalizerPool::warm_up`],
/// capped at the pool's per-language capacity.
pub const WARM_UP_PER_LANGUAGE: usize = 5;

/// Pool counters and gauges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Localizers handed out.
    pub gets: u64,
    /// Localizers returned to an idle bucket.
    pub puts: u64,
    /// Localizers constructed.
    pub creates: u64,
    /// Localizers dropped on release because their bucket was full.
    pub discards: u64,
    /// Localizers currently idle across all languages.
    pub idle: usize,
}

/// Builds localizers sharing one bundle and fallback language.
#[derive(Debug, Clone)]
pub struct LocalizerFactory {
    bundle: BundleHandle,
    fallback_language: LanguageTag,
}

impl LocalizerFactory {
    /// Creates a factory.
    pub const fn new(bundle: BundleHandle, fallback_language: LanguageTag) -> Self {
        Self {
            bundle,
            fallback_language,
        }
    }

    /// A fresh localizer for `language`.
    pub fn create(&self, language: &LanguageTag) -> Localizer {
        Localizer::new(
            language.clone(),
            self.fallback_language.clone(),
            self.bundle.clone(),
        )
    }

    /// The shared bundle handle.
    pub const fn bundle(&self) -> &BundleHandle {
        &self.bundle
    }

    /// The fallback language given to every localizer.
    pub const fn fallback_language(&self) -> &LanguageTag {
        &self.fallback_language
    }
}

/// Idle buckets plus counters.
#[derive(Debug)]
pub struct PooledLocalizers {
    factory: LocalizerFactory,
    max_idle_per_language: usize,
    idle: Mutex<HashMap<LanguageTag, Vec<Localizer>>>,
    gets: AtomicU64,
    puts: AtomicU64,
    creates: AtomicU64,
    discards: AtomicU64,
}

/// Source of localizers for the translator.
///
/// The pooled variant keeps at most `max_idle_per_language` idle instances
/// per language. Acquiring never waits: a miss constructs a new localizer.
#[derive(Debug)]
pub enum LocalizerPool {
    /// Reuses idle localizers.
    Pooled(PooledLocalizers),
    /// Constructs a localizer per request.
    Disabled(LocalizerFactory),
}

impl LocalizerPool {
    /// A pool keeping up to `max_idle_per_language` idle localizers.
    pub fn pooled(factory: LocalizerFactory, max_idle_per_language: usize) -> Self {
        Self::Pooled(PooledLocalizers {
            factory,
            max_idle_per_language,
            idle: Mutex::new(HashMap::new()),
            gets: AtomicU64::new(0),
            puts: AtomicU64::new(0),
            creates: AtomicU64::new(0),
            discards: AtomicU64::new(0),
        })
    }

    /// A pass-through that never retains localizers.
    pub const fn disabled(factory: LocalizerFactory) -> Self {
        Self::Disabled(factory)
    }

    /// The factory used for misses.
    pub const fn factory(&self) -> &LocalizerFactory {
        match self {
            Self::Pooled(pool) => &pool.factory,
            Self::Disabled(factory) => factory,
        }
    }

    /// Checks out a localizer for `language`.
    pub fn acquire(&self, language: &LanguageTag) -> Localizer {
        let Self::Pooled(pool) = self else {
            return self.factory().create(language);
        };

        pool.gets.fetch_add(1, Ordering::Relaxed);
        let reused = pool.idle.lock().get_mut(language).and_then(Vec::pop);

        reused.unwrap_or_else(|| {
            pool.creates.fetch_add(1, Ordering::Relaxed);
            debug!("Creating localizer for {}", language);
            pool.factory.create(language)
        })
    }

    /// Returns a localizer. `None` is ignored.
    pub fn release(&self, localizer: impl Into<Option<Localizer>>) {
        let Some(localizer) = localizer.into() else {
            return;
        };
        let Self::Pooled(pool) = self else {
            return;
        };

        let mut idle = pool.idle.lock();
        let bucket = idle.entry(localizer.language().clone()).or_default();
        if bucket.len() < pool.max_idle_per_language {
            bucket.push(localizer);
            pool.puts.fetch_add(1, Ordering::Relaxed);
        } else {
            drop(idle);
            pool.discards.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Tops each language's bucket up to `min(WARM_UP_PER_LANGUAGE, capacity)`.
    pub fn warm_up(&self, languages: &[LanguageTag]) {
        let Self::Pooled(pool) = self else {
            return;
        };
        let target = WARM_UP_PER_LANGUAGE.min(pool.max_idle_per_language);

        for language in languages {
            let missing = {
                let idle = pool.idle.lock();
                target.saturating_sub(idle.get(language).map_or(0, Vec::len))
            };
            if missing == 0 {
                continue;
            }

            let fresh: Vec<Localizer> = (0..missing).map(|_| pool.factory.create(language)).collect();

            let mut idle = pool.idle.lock();
            let bucket = idle.entry(language.clone()).or_default();
            let room = target.saturating_sub(bucket.len());
            let created = fresh.len().min(room);
            bucket.extend(fresh.into_iter().take(room));
            pool.creates.fetch_add(created as u64, Ordering::Relaxed);
        }

        info!(
            "Warmed up localizer pool for {} languages ({} per language)",
            languages.len(),
            target
        );
    }

    /// Drops every idle localizer and resets the counters. The pool remains usable.
    pub fn close(&self) {
        let Self::Pooled(pool) = self else {
            return;
        };
        let drained: usize = pool.idle.lock().drain().map(|(_, bucket)| bucket.len()).sum();
        pool.gets.store(0, Ordering::Relaxed);
        pool.puts.store(0, Ordering::Relaxed);
        pool.creates.store(0, Ordering::Relaxed);
        pool.discards.store(0, Ordering::Relaxed);
        debug!("Closed localizer pool, dropped {} idle localizers", drained);
    }

    /// Idle localizers held for `language`.
    pub fn idle_count(&self, language: &LanguageTag) -> usize {
        match self {
            Self::Pooled(pool) => pool.idle.lock().get(language).map_or(0, Vec::len),
            Self::Disabled(_) => 0,
        }
    }

    /// Current counters.
    pub fn stats(&self) -> PoolStats {
        match self {
            Self::Pooled(pool) => PoolStats {
                gets: pool.gets.load(Ordering::Relaxed),
                puts: pool.puts.load(Ordering::Relaxed),
                creates: pool.creates.load(Ordering::Relaxed),
                discards: pool.discards.load(Ordering::Relaxed),
                idle: pool.idle.lock().values().map(Vec::len).sum(),
            },
            Self::Disabled(_) => PoolStats::default(),
        }
    }

    /// Whether localizers are retained.
    pub const fn is_enabled(&self) -> bool {
        matches!(self, Self::Pooled(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(s: &str) -> LanguageTag {
        LanguageTag::parse(s).unwrap()
    }

    fn factory() -> LocalizerFactory {
        LocalizerFactory::new(BundleHandle::default(), tag("en"))
    }

    #[test]
    fn test_acquire_reuses_released_localizer() {
        let pool = LocalizerPool::pooled(factory(), 4);
        let en = tag("en");

        let localizer = pool.acquire(&en);
        pool.release(localizer);
        let _again = pool.acquire(&en);

        let stats = pool.stats();
        assert_eq!(stats.gets, 2);
        assert_eq!(stats.creates, 1);
        assert_eq!(stats.puts, 1);
        assert_eq!(stats.idle, 0);
    }

    #[test]
    fn test_release_discards_when_bucket_full() {
        let pool = LocalizerPool::pooled(factory(), 1);
        let en = tag("en");

        let a = pool.acquire(&en);
        let b = pool.acquire(&en);
        pool.release(a);
        pool.release(b);
        pool.release(None);

        let stats = pool.stats();
        assert_eq!(stats.puts, 1);
        assert_eq!(stats.discards, 1);
        assert_eq!(pool.idle_count(&en), 1);
    }

    #[test]
    fn test_warm_up_is_capped_and_idempotent() {
        let pool = LocalizerPool::pooled(factory(), 3);
        let languages = [tag("en"), tag("zh-CN")];

        pool.warm_up(&languages);
        pool.warm_up(&languages);

        assert_eq!(pool.idle_count(&tag("en")), 3);
        assert_eq!(pool.idle_count(&tag("zh-CN")), 3);
        assert_eq!(pool.stats().creates, 6);

        let large = LocalizerPool::pooled(factory(), 100);
        large.warm_up(&languages[..1]);
        assert_eq!(large.idle_count(&tag("en")), WARM_UP_PER_LANGUAGE);
    }

    #[test]
    fn test_close_drains_and_pool_stays_usable() {
        let pool = LocalizerPool::pooled(factory(), 10);
        pool.warm_up(&[tag("en")]);
        pool.close();

        assert_eq!(pool.stats(), PoolStats::default());
        let localizer = pool.acquire(&tag("en"));
        assert_eq!(localizer.language(), &tag("en"));
        assert_eq!(pool.stats().creates, 1);
    }

    #[test]
    fn test_disabled_pool_keeps_nothing() {
        let pool = LocalizerPool::disabled(factory());
        pool.warm_up(&[tag("en")]);
        let localizer = pool.acquire(&tag("en"));
        pool.release(localizer);

        assert_eq!(pool.stats(), PoolStats::default());
        assert_eq!(pool.idle_count(&tag("en")), 0);
        assert!(!pool.is_enabled());
    }
}
