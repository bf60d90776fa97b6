//! Cached, pooled translation with a language fallback chain.

use crate::bundle::LocaleSource;
use crate::cache::ResponseCache;
use crate::error::{I18nError, I18nResult};
use crate::fingerprint::{Fingerprint, TemplateData};
use crate::language::LanguageTag;
use crate::metrics::TranslationMetrics;
use crate::pool::LocalizerPool;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

/// Text returned for an empty message id.
pub const UNKNOWN_MESSAGE: &str = "Unknown message";

/// Resolves message ids to rendered strings.
///
/// Translation never fails: a message missing from both the requested and
/// the fallback language renders as a readable form of its id.
#[derive(Debug)]
pub struct Translator {
    pool: LocalizerPool,
    cache: ResponseCache,
    metrics: Option<Arc<TranslationMetrics>>,
    debug: bool,
    /// Held across load, swap and cache clear so reloads publish in order.
    reload_lock: Mutex<()>,
}

impl Translator {
    /// Creates a translator. Passing `metrics` enables timing of every call.
    pub fn new(
        pool: LocalizerPool,
        cache: ResponseCache,
        metrics: Option<Arc<TranslationMetrics>>,
        debug: bool,
    ) -> Self {
        Self {
            pool,
            cache,
            metrics,
            debug,
            reload_lock: Mutex::new(()),
        }
    }

    /// The localizer pool.
    pub const fn pool(&self) -> &LocalizerPool {
        &self.pool
    }

    /// The response cache.
    pub const fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Metrics sink, when enabled.
    pub fn metrics(&self) -> Option<&TranslationMetrics> {
        self.metrics.as_deref()
    }

    /// The fallback language consulted on a miss.
    pub const fn fallback_language(&self) -> &LanguageTag {
        self.pool.factory().fallback_language()
    }

    /// Translates `id` into `language`.
    pub fn translate(&self, language: &LanguageTag, id: &str, data: &TemplateData) -> String {
        let started = Instant::now();
        let result = self.translate_untimed(language, id, data);
        if let Some(metrics) = &self.metrics {
            metrics.record_translation(started.elapsed());
        }
        result
    }

    /// Translates a plural message, exposing `count` to the template as `Count`.
    pub fn translate_plural(
        &self,
        language: &LanguageTag,
        id: &str,
        count: i64,
        data: &TemplateData,
    ) -> String {
        let mut data = data.clone();
        data.insert("Count".to_string(), Value::from(count));
        self.translate(language, id, &data)
    }

    /// Substitutes `data` into `template` using a localizer for `language`,
    /// without consulting the catalog. The result is not cached.
    pub fn translate_template(
        &self,
        language: &LanguageTag,
        template: &str,
        data: &TemplateData,
    ) -> String {
        let started = Instant::now();
        let localizer = self.pool.acquire(language);
        let rendered = localizer.render_str(template, data);
        self.pool.release(localizer);
        if let Some(metrics) = &self.metrics {
            metrics.record_translation(started.elapsed());
        }
        rendered
    }

    /// Whether `id` resolves in `language` or the fallback language.
    pub fn has_message(&self, language: &LanguageTag, id: &str) -> bool {
        let bundle = self.pool.factory().bundle().snapshot();
        bundle.lookup(language, id).is_some()
            || bundle.lookup(self.fallback_language(), id).is_some()
    }

    /// Publishes a bundle built from `sources` and clears the cache.
    ///
    /// A failed build leaves both the current bundle and the cache intact.
    #[instrument(skip_all, fields(sources = sources.len()))]
    pub fn reload(&self, sources: &[LocaleSource]) -> I18nResult<()> {
        let _guard = self.reload_lock.lock();
        self.publish(sources)
    }

    /// Runs `load` and publishes its sources as one step with respect to
    /// other reloads. A failing `load` changes nothing.
    #[instrument(skip_all)]
    pub fn reload_with<F>(&self, load: F) -> I18nResult<()>
    where
        F: FnOnce() -> I18nResult<Vec<LocaleSource>>,
    {
        let _guard = self.reload_lock.lock();
        let sources = load().inspect_err(|e| {
            error!("Reading locales failed, keeping current bundle: {}", e);
        })?;
        self.publish(&sources)
    }

    fn publish(&self, sources: &[LocaleSource]) -> I18nResult<()> {
        if let Err(e) = self.pool.factory().bundle().reload(sources) {
            error!("Locale reload failed, keeping current bundle: {}", e);
            return Err(e);
        }
        self.cache.clear();

        let bundle = self.pool.factory().bundle().snapshot();
        info!(
            "Reloaded {} messages across {} languages",
            bundle.message_count(),
            bundle.language_count()
        );
        Ok(())
    }

    fn translate_untimed(&self, language: &LanguageTag, id: &str, data: &TemplateData) -> String {
        let fingerprint = Fingerprint::compute(language, id, data);

        if let Some(cached) = self.cache.get(&fingerprint) {
            if let Some(metrics) = &self.metrics {
                metrics.record_cache_hit();
            }
            return cached;
        }
        if let Some(metrics) = &self.metrics {
            metrics.record_cache_miss();
        }

        let localizer = self.pool.acquire(language);
        let generation = self.cache.generation();
        let bundle = localizer.bundle().snapshot();

        let rendered = match localizer.render(&bundle, id, data) {
            Ok(text) => Some(text),
            Err(I18nError::MessageNotFound { .. }) => {
                let fallback_language = localizer.fallback_language();
                if fallback_language == language {
                    None
                } else {
                    let fallback = self.pool.factory().create(fallback_language);
                    let text = fallback.render(&bundle, id, data).ok();
                    if text.is_some() {
                        if let Some(metrics) = &self.metrics {
                            metrics.record_fallback();
                        }
                        debug!(
                            "Message '{}' missing in {}, served from {}",
                            id, language, fallback_language
                        );
                    }
                    text
                }
            }
            Err(e) => {
                warn!("Failed to render '{}' for {}: {}", id, language, e);
                None
            }
        };

        self.pool.release(localizer);

        if let Some(text) = rendered {
            self.cache.set_if_generation(fingerprint, text.clone(), generation);
            return text;
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_missing();
        }
        if self.debug {
            warn!("No translation for '{}' in {} or its fallback", id, language);
        } else {
            debug!("No translation for '{}' in {} or its fallback", id, language);
        }
        humanize_message_id(id)
    }
}

/// Turns a message id into readable text: `USER_NOT_FOUND` becomes
/// `User not found`. Separators `_`, `-` and `.` become spaces.
pub fn humanize_message_id(id: &str) -> String {
    let spaced: String = id
        .chars()
        .map(|c| if matches!(c, '_' | '-' | '.') { ' ' } else { c })
        .collect::<String>()
        .to_lowercase();
    let trimmed = spaced.trim();

    let mut chars = trimmed.chars();
    match chars.next() {
        None => UNKNOWN_MESSAGE.to_string(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::{BundleHandle, LocaleBundle, LocaleSource};
    use crate::pool::LocalizerFactory;
    use serde_json::json;
    use std::time::Duration;

    fn tag(s: &str) -> LanguageTag {
        LanguageTag::parse(s).unwrap()
    }

    fn translator(bundle: LocaleBundle) -> Translator {
        let factory = LocalizerFactory::new(BundleHandle::new(bundle), tag("en"));
        Translator::new(
            LocalizerPool::pooled(factory, 4),
            ResponseCache::memory(100, Duration::from_secs(60)),
            Some(Arc::new(TranslationMetrics::new())),
            false,
        )
    }

    fn sample_bundle() -> LocaleBundle {
        LocaleBundle::load(&[
            LocaleSource::from_pairs("en", [("WELCOME", "Hello"), ("BYE", "Goodbye")]),
            LocaleSource::from_pairs("zh-CN", [("BYE", "再见")]),
        ])
        .unwrap()
    }

    #[test]
    fn test_humanize() {
        assert_eq!(humanize_message_id("USER_NOT_FOUND"), "User not found");
        assert_eq!(humanize_message_id("errors.file-too-large"), "Errors file too large");
        assert_eq!(humanize_message_id(""), UNKNOWN_MESSAGE);
        assert_eq!(humanize_message_id("__"), UNKNOWN_MESSAGE);
    }

    #[test]
    fn test_primary_then_fallback_then_default() {
        let translator = translator(sample_bundle());
        let zh = tag("zh-CN");
        let data = TemplateData::new();

        assert_eq!(translator.translate(&zh, "BYE", &data), "再见");
        assert_eq!(translator.translate(&zh, "WELCOME", &data), "Hello");
        assert_eq!(translator.translate(&zh, "NO_SUCH_KEY", &data), "No such key");

        let metrics = translator.metrics().unwrap().snapshot();
        assert_eq!(metrics.total_translations, 3);
        assert_eq!(metrics.fallbacks, 1);
        assert_eq!(metrics.missing, 1);
    }

    #[test]
    fn test_only_rendered_messages_are_cached() {
        let translator = translator(sample_bundle());
        let en = tag("en");
        let data = TemplateData::new();

        translator.translate(&en, "WELCOME", &data);
        translator.translate(&en, "WELCOME", &data);
        translator.translate(&en, "MISSING", &data);

        let stats = translator.cache().stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn test_localizer_is_always_released() {
        let translator = translator(sample_bundle());
        let en = tag("en");

        translator.translate(&en, "WELCOME", &TemplateData::new());
        translator.translate(&en, "MISSING", &TemplateData::new());

        let stats = translator.pool().stats();
        assert_eq!(stats.gets, 2);
        assert_eq!(stats.puts, 2);
        assert_eq!(stats.creates, 1);
    }

    #[test]
    fn test_plural_and_ad_hoc_templates() {
        let bundle = LocaleBundle::load(&[LocaleSource::from_json_str(
            "en",
            r#"{"ITEMS": {"one": "{{.Count}} item", "other": "{{.Count}} items"}}"#,
        )
        .unwrap()])
        .unwrap();
        let translator = translator(bundle);
        let en = tag("en");

        assert_eq!(translator.translate_plural(&en, "ITEMS", 1, &TemplateData::new()), "1 item");
        assert_eq!(translator.translate_plural(&en, "ITEMS", 7, &TemplateData::new()), "7 items");

        let mut data = TemplateData::new();
        data.insert("who".into(), json!("team"));
        assert_eq!(translator.translate_template(&en, "Hi {{.who}}", &data), "Hi team");
    }

    #[test]
    fn test_overlapping_reloads_publish_in_order() {
        let translator = Arc::new(translator(sample_bundle()));
        let en = tag("en");

        let (loading, started) = std::sync::mpsc::channel();
        let slow = {
            let translator = Arc::clone(&translator);
            std::thread::spawn(move || {
                translator
                    .reload_with(|| {
                        loading.send(()).unwrap();
                        std::thread::sleep(Duration::from_millis(100));
                        Ok(vec![LocaleSource::from_pairs("en", [("WELCOME", "first")])])
                    })
                    .unwrap();
            })
        };
        started.recv().unwrap();
        translator
            .reload(&[LocaleSource::from_pairs("en", [("WELCOME", "second")])])
            .unwrap();
        slow.join().unwrap();

        assert_eq!(translator.translate(&en, "WELCOME", &TemplateData::new()), "second");
    }

    #[test]
    fn test_failed_load_keeps_bundle_and_cache() {
        let translator = translator(sample_bundle());
        let en = tag("en");
        translator.translate(&en, "WELCOME", &TemplateData::new());

        let result = translator.reload_with(|| Err(I18nError::InvalidLanguage("??".to_string())));

        assert!(result.is_err());
        assert_eq!(translator.cache().len(), 1);
        assert_eq!(translator.translate(&en, "WELCOME", &TemplateData::new()), "Hello");
    }

    #[test]
    fn test_reload_clears_cache_only_on_success() {
        let translator = translator(sample_bundle());
        let en = tag("en");
        assert_eq!(translator.translate(&en, "WELCOME", &TemplateData::new()), "Hello");

        let broken = LocaleSource::from_json_str("en", r#"{"X": {"one": "only one"}}"#).unwrap();
        assert!(translator.reload(&[broken]).is_err());
        assert_eq!(translator.cache().len(), 1);

        translator
            .reload(&[LocaleSource::from_pairs("en", [("WELCOME", "Welcome back")])])
            .unwrap();
        assert!(translator.cache().is_empty());
        assert_eq!(
            translator.translate(&en, "WELCOME", &TemplateData::new()),
            "Welcome back"
        );
    }
}
