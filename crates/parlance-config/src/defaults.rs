//! Default values and environment presets.

use crate::schema::*;
use parlance_common::LoggingOptions;
use std::path::PathBuf;
use std::time::Duration;

/// Languages shipped with the default configuration.
pub const DEFAULT_LANGUAGES: [&str; 3] = ["en", "zh-CN", "zh-TW"];

/// Module files read in the nested layout when none are configured.
pub const DEFAULT_MODULES: [&str; 3] = ["common", "errors", "ui"];

fn default_languages() -> Vec<String> {
    DEFAULT_LANGUAGES.iter().map(ToString::to_string).collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_language: "en".to_string(),
            fallback_language: "en".to_string(),
            locales: LocalesConfig::default(),
            cache: CacheConfig::default(),
            pool: PoolConfig::default(),
            resolver: ResolverConfig::default(),
            watch: false,
            enable_metrics: false,
            debug: false,
            logging: LoggingOptions::default(),
        }
    }
}

impl Default for LocalesConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("locales"),
            mode: LocaleMode::Flat,
            languages: default_languages(),
            modules: Vec::new(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 1000,
            ttl: Duration::from_secs(60 * 60),
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_idle_per_language: 100,
            warm_up: true,
            warm_up_languages: default_languages(),
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            header_name: "X-Language".to_string(),
            cookie_name: "lang".to_string(),
            query_key: "lang".to_string(),
            enable_cookie: true,
            enable_query: true,
            supported_languages: default_languages(),
        }
    }
}

impl Config {
    /// Returns a preset tuned for the named environment.
    ///
    /// Recognises `development`/`dev`, `testing`/`test`,
    /// `production`/`prod` and `staging`/`stage`; anything else yields the
    /// plain defaults.
    pub fn for_environment(environment: &str) -> Self {
        let mut config = Self::default();

        match environment.to_lowercase().as_str() {
            "development" | "dev" => {
                config.debug = true;
                config.watch = true;
                config.cache.ttl = Duration::from_secs(30 * 60);
                config.pool.warm_up = false;
                config.logging = LoggingOptions::development();
            }
            "testing" | "test" => {
                config.cache.max_entries = 100;
                config.pool.max_idle_per_language = 10;
                config.pool.warm_up = false;
            }
            "production" | "prod" => {
                config.enable_metrics = true;
                config.cache.max_entries = 10_000;
                config.pool.max_idle_per_language = 500;
                config.logging = LoggingOptions::production();
            }
            "staging" | "stage" => {
                config.debug = true;
                config.enable_metrics = true;
                config.watch = true;
                config.cache.max_entries = 5000;
                config.pool.max_idle_per_language = 200;
            }
            _ => {}
        }

        config
    }
}
