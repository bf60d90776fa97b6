//! The i18n service: owns the bundle, pool, cache, resolver and watcher.

use crate::bundle::{BundleHandle, LocaleBundle, LocaleSource};
use crate::cache::{CacheStats, ResponseCache};
use crate::error::I18nResult;
use crate::fingerprint::TemplateData;
use crate::language::LanguageTag;
use crate::loader::LocaleLoader;
use crate::metrics::{MetricsSnapshot, TranslationMetrics};
use crate::pool::{LocalizerFactory, LocalizerPool, PoolStats};
use crate::resolver::{LanguageResolver, RequestLocale};
use crate::translator::Translator;
use crate::watcher::LocaleWatcher;
use parking_lot::Mutex;
use parlance_config::Config;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Runtime statistics of an [`I18nService`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceStats {
    /// Response cache counters.
    pub cache: CacheStats,
    /// Localizer pool counters.
    pub pool: PoolStats,
    /// Time since construction.
    pub uptime: Duration,
    /// Languages with at least one message.
    pub num_locales: usize,
}

/// Translation entry point for an application.
///
/// Build one per process with [`I18nService::new`] and share it as
/// `Arc<I18nService>`. [`I18nService::close`] tears down the watcher, drains
/// the pool and empties the cache.
#[derive(Debug)]
pub struct I18nService {
    config: Config,
    default_language: LanguageTag,
    translator: Arc<Translator>,
    resolver: LanguageResolver,
    loader: LocaleLoader,
    watcher: Mutex<Option<LocaleWatcher>>,
    started: Instant,
}

impl I18nService {
    /// Loads the configured locale files and builds the service.
    ///
    /// Starts the file watcher when `watch` is enabled.
    #[instrument(skip_all, fields(path = %config.locales.path.display()))]
    pub fn new(config: Config) -> I18nResult<Self> {
        let loader = LocaleLoader::from_config(&config.locales);
        let sources = loader.load()?;
        let service = Self::build(config, loader, &sources)?;

        if service.config.watch {
            service.start_watching()?;
        }
        Ok(service)
    }

    /// Builds the service from in-memory sources, bypassing the disk.
    ///
    /// The watcher is not started; [`I18nService::reload_from_disk`] still
    /// reads from the configured locale path.
    pub fn with_sources(config: Config, sources: &[LocaleSource]) -> I18nResult<Self> {
        let loader = LocaleLoader::from_config(&config.locales);
        Self::build(config, loader, sources)
    }

    fn build(config: Config, loader: LocaleLoader, sources: &[LocaleSource]) -> I18nResult<Self> {
        let default_language = LanguageTag::parse(&config.default_language)?;
        let fallback_language = LanguageTag::parse(&config.fallback_language)?;

        let bundle = LocaleBundle::load(sources)?;
        info!(
            "Loaded {} messages across {} languages",
            bundle.message_count(),
            bundle.language_count()
        );

        let factory = LocalizerFactory::new(BundleHandle::new(bundle), fallback_language);
        let pool = if config.pool.enabled {
            LocalizerPool::pooled(factory, config.pool.max_idle_per_language)
        } else {
            LocalizerPool::disabled(factory)
        };
        let cache = if config.cache.enabled {
            ResponseCache::memory(config.cache.max_entries, config.cache.ttl)
        } else {
            ResponseCache::Disabled
        };
        let metrics = config
            .enable_metrics
            .then(|| Arc::new(TranslationMetrics::new()));

        let translator = Arc::new(Translator::new(pool, cache, metrics, config.debug));
        let resolver = LanguageResolver::from_config(&config)?;

        let service = Self {
            default_language,
            translator,
            resolver,
            loader,
            watcher: Mutex::new(None),
            started: Instant::now(),
            config,
        };

        if service.config.pool.warm_up {
            service.warm_up();
        }
        Ok(service)
    }

    fn warm_up(&self) {
        let languages: Vec<LanguageTag> = self
            .config
            .effective_warm_up_languages()
            .iter()
            .filter_map(|language| match LanguageTag::parse(language) {
                Ok(tag) => Some(tag),
                Err(e) => {
                    warn!("Skipping warm-up for {}: {}", language, e);
                    None
                }
            })
            .collect();

        self.translator.pool().warm_up(&languages);
    }

    /// Starts reloading from disk on locale file changes. No-op when already
    /// watching.
    pub fn start_watching(&self) -> I18nResult<()> {
        let mut slot = self.watcher.lock();
        if slot.is_some() {
            return Ok(());
        }

        let translator = Arc::clone(&self.translator);
        let loader = self.loader.clone();
        let watcher = LocaleWatcher::spawn(self.loader.root(), move || {
            translator.reload_with(|| loader.load())
        })?;
        *slot = Some(watcher);
        Ok(())
    }

    /// Whether the file watcher is running.
    pub fn is_watching(&self) -> bool {
        self.watcher.lock().as_ref().is_some_and(LocaleWatcher::is_running)
    }

    /// Translates `id` into `language`.
    ///
    /// An unparseable language falls back to the default language.
    pub fn translate(&self, language: &str, id: &str, data: &TemplateData) -> String {
        self.translator.translate(&self.language_or_default(language), id, data)
    }

    /// Translates a plural message for `count`.
    pub fn translate_plural(
        &self,
        language: &str,
        id: &str,
        count: i64,
        data: &TemplateData,
    ) -> String {
        self.translator
            .translate_plural(&self.language_or_default(language), id, count, data)
    }

    /// Translates `id` into the language resolved for a request.
    pub fn translate_for(&self, locale: &RequestLocale, id: &str, data: &TemplateData) -> String {
        self.translator.translate(&locale.language, id, data)
    }

    /// Translates a plural message into the language resolved for a request.
    pub fn translate_plural_for(
        &self,
        locale: &RequestLocale,
        id: &str,
        count: i64,
        data: &TemplateData,
    ) -> String {
        self.translator.translate_plural(&locale.language, id, count, data)
    }

    /// Substitutes `data` into an ad-hoc `template`.
    pub fn translate_template(&self, language: &str, template: &str, data: &TemplateData) -> String {
        self.translator
            .translate_template(&self.language_or_default(language), template, data)
    }

    /// Whether `id` resolves in `language` or the fallback language.
    pub fn has_message(&self, language: &str, id: &str) -> bool {
        self.translator
            .has_message(&self.language_or_default(language), id)
    }

    /// Replaces the bundle with one built from `sources` and clears the cache.
    ///
    /// Reloads from any caller, the watcher included, run one at a time.
    pub fn reload(&self, sources: &[LocaleSource]) -> I18nResult<()> {
        self.translator.reload(sources)
    }

    /// Re-reads the configured locale files and reloads.
    pub fn reload_from_disk(&self) -> I18nResult<()> {
        self.translator.reload_with(|| self.loader.load())
    }

    /// Cache, pool and uptime statistics.
    pub fn stats(&self) -> ServiceStats {
        ServiceStats {
            cache: self.translator.cache().stats(),
            pool: self.translator.pool().stats(),
            uptime: self.started.elapsed(),
            num_locales: self.bundle().language_count(),
        }
    }

    /// Translation metrics. All zero when metrics are disabled.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.translator
            .metrics()
            .map_or_else(|| TranslationMetrics::new().snapshot(), TranslationMetrics::snapshot)
    }

    /// Snapshot of the current bundle.
    pub fn bundle(&self) -> Arc<LocaleBundle> {
        self.translator.pool().factory().bundle().snapshot()
    }

    /// The request language resolver.
    pub const fn resolver(&self) -> &LanguageResolver {
        &self.resolver
    }

    /// The locale file loader.
    pub const fn loader(&self) -> &LocaleLoader {
        &self.loader
    }

    /// The underlying translator.
    pub fn translator(&self) -> &Translator {
        &self.translator
    }

    /// Configuration the service was built with.
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Language used when a request names none.
    pub const fn default_language(&self) -> &LanguageTag {
        &self.default_language
    }

    /// Language consulted when a message is missing.
    pub fn fallback_language(&self) -> &LanguageTag {
        self.translator.fallback_language()
    }

    /// Stops the watcher, drains the pool and empties the cache.
    ///
    /// The service remains usable afterwards; translation simply starts cold.
    pub fn close(&self) {
        if let Some(mut watcher) = self.watcher.lock().take() {
            watcher.close();
        }
        self.translator.pool().close();
        self.translator.cache().clear();
        info!("I18n service closed");
    }

    fn language_or_default(&self, language: &str) -> LanguageTag {
        LanguageTag::parse(language).unwrap_or_else(|e| {
            debug!("{}; using {}", e, self.default_language);
            self.default_language.clone()
        })
    }
}
