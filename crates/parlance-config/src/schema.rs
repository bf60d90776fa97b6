//! Configuration schema definitions.

use parlance_common::LoggingOptions;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Logging section of the configuration file.
pub type LoggingConfig = LoggingOptions;

/// Main configuration structure for Parlance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Language used when a request expresses no usable preference.
    pub default_language: String,
    /// Language consulted when a message is missing in the requested one.
    pub fallback_language: String,
    /// Locale file location and layout.
    pub locales: LocalesConfig,
    /// Rendered-string cache.
    pub cache: CacheConfig,
    /// Localizer pool.
    pub pool: PoolConfig,
    /// Request language negotiation.
    pub resolver: ResolverConfig,
    /// Reload locales when files under `locales.path` change.
    pub watch: bool,
    /// Record translation timings.
    pub enable_metrics: bool,
    /// Verbose diagnostics for missing translations.
    pub debug: bool,
    /// Log output.
    pub logging: LoggingConfig,
}

/// On-disk organisation of locale files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocaleMode {
    /// `locales/en.json`, `locales/zh-CN.json`
    #[default]
    Flat,
    /// `locales/en/common.json`, `locales/en/errors.json`
    Nested,
    /// Detect from the directory contents at load time.
    Auto,
}

/// Locale file configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalesConfig {
    /// Root directory of the locale files.
    pub path: PathBuf,
    /// File layout below `path`.
    pub mode: LocaleMode,
    /// Languages to load.
    pub languages: Vec<String>,
    /// Module file names for the nested layout; empty means the defaults.
    pub modules: Vec<String>,
}

/// Response cache configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether rendered strings are cached.
    pub enabled: bool,
    /// Maximum number of cached entries.
    pub max_entries: usize,
    /// Entry lifetime; accepts seconds or strings such as `"30m"`.
    #[serde(with = "duration_secs")]
    pub ttl: Duration,
}

/// Localizer pool configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Whether localizers are pooled.
    pub enabled: bool,
    /// Idle localizers kept per language.
    pub max_idle_per_language: usize,
    /// Pre-create localizers at startup.
    pub warm_up: bool,
    /// Languages to warm up; empty means the default language.
    pub warm_up_languages: Vec<String>,
}

/// Language resolution configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Header carrying an explicit language choice.
    pub header_name: String,
    /// Cookie carrying a remembered language choice.
    pub cookie_name: String,
    /// Query parameter carrying a language choice.
    pub query_key: String,
    /// Consult the cookie.
    pub enable_cookie: bool,
    /// Consult the query parameter.
    pub enable_query: bool,
    /// Languages a request may resolve to.
    pub supported_languages: Vec<String>,
}

impl Config {
    /// Languages the pool should warm up, defaulting to the default language.
    pub fn effective_warm_up_languages(&self) -> Vec<String> {
        if self.pool.warm_up_languages.is_empty() {
            vec![self.default_language.clone()]
        } else {
            self.pool.warm_up_languages.clone()
        }
    }

    /// Overlays every setting of `overlay` that differs from the built-in
    /// default onto `self`.
    ///
    /// Deserialized layers fill unset keys with defaults, so a layer can only
    /// change a value, never reset it to its default.
    #[must_use]
    pub fn merge(mut self, overlay: Self) -> Self {
        let base = Self::default();

        take(&mut self.default_language, overlay.default_language, &base.default_language);
        take(&mut self.fallback_language, overlay.fallback_language, &base.fallback_language);

        take(&mut self.locales.path, overlay.locales.path, &base.locales.path);
        take(&mut self.locales.mode, overlay.locales.mode, &base.locales.mode);
        take(&mut self.locales.languages, overlay.locales.languages, &base.locales.languages);
        take(&mut self.locales.modules, overlay.locales.modules, &base.locales.modules);

        take(&mut self.cache.enabled, overlay.cache.enabled, &base.cache.enabled);
        take(&mut self.cache.max_entries, overlay.cache.max_entries, &base.cache.max_entries);
        take(&mut self.cache.ttl, overlay.cache.ttl, &base.cache.ttl);

        let pool = overlay.pool;
        take(&mut self.pool.enabled, pool.enabled, &base.pool.enabled);
        take(
            &mut self.pool.max_idle_per_language,
            pool.max_idle_per_language,
            &base.pool.max_idle_per_language,
        );
        take(&mut self.pool.warm_up, pool.warm_up, &base.pool.warm_up);
        take(
            &mut self.pool.warm_up_languages,
            pool.warm_up_languages,
            &base.pool.warm_up_languages,
        );

        let resolver = overlay.resolver;
        take(&mut self.resolver.header_name, resolver.header_name, &base.resolver.header_name);
        take(&mut self.resolver.cookie_name, resolver.cookie_name, &base.resolver.cookie_name);
        take(&mut self.resolver.query_key, resolver.query_key, &base.resolver.query_key);
        take(
            &mut self.resolver.enable_cookie,
            resolver.enable_cookie,
            &base.resolver.enable_cookie,
        );
        take(&mut self.resolver.enable_query, resolver.enable_query, &base.resolver.enable_query);
        take(
            &mut self.resolver.supported_languages,
            resolver.supported_languages,
            &base.resolver.supported_languages,
        );

        take(&mut self.watch, overlay.watch, &base.watch);
        take(&mut self.enable_metrics, overlay.enable_metrics, &base.enable_metrics);
        take(&mut self.debug, overlay.debug, &base.debug);
        take(&mut self.logging, overlay.logging, &base.logging);

        self
    }
}

fn take<T: PartialEq>(target: &mut T, value: T, default: &T) {
    if value != *default {
        *target = value;
    }
}

/// Serde adapter storing a [`Duration`] as whole seconds.
///
/// Deserialization also accepts the string forms understood by
/// [`parlance_common::parse_duration`].
pub mod duration_secs {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Seconds(u64),
        Text(String),
    }

    /// Serialize as seconds.
    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    /// Deserialize from seconds or a duration string.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Seconds(secs) => Ok(Duration::from_secs(secs)),
            Raw::Text(text) => parlance_common::parse_duration(&text)
                .ok_or_else(|| D::Error::custom(format!("invalid duration '{text}'"))),
        }
    }
}
