//! Configuration validation.

use crate::loader::ConfigError;
use crate::schema::Config;
use unic_langid::LanguageIdentifier;

/// Minimum cache size accepted by [`Config::validate_strict`].
pub const STRICT_MIN_CACHE_ENTRIES: usize = 100;

/// Minimum per-language pool size accepted by [`Config::validate_strict`].
pub const STRICT_MIN_POOL_SIZE: usize = 10;

/// Returns true when `tag` is a well-formed BCP 47 language identifier.
pub fn is_valid_language_tag(tag: &str) -> bool {
    !tag.trim().is_empty() && tag.parse::<LanguageIdentifier>().is_ok()
}

fn check_language(field: &str, tag: &str) -> Result<(), ConfigError> {
    if tag.trim().is_empty() {
        return Err(ConfigError::validation(field, "cannot be empty"));
    }
    if !is_valid_language_tag(tag) {
        return Err(ConfigError::validation(
            field,
            format!("invalid language code '{tag}'"),
        ));
    }
    Ok(())
}

impl Config {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_language("default_language", &self.default_language)?;
        check_language("fallback_language", &self.fallback_language)?;

        if self.locales.path.as_os_str().is_empty() {
            return Err(ConfigError::validation("locales.path", "cannot be empty"));
        }

        for language in &self.locales.languages {
            check_language("locales.languages", language)?;
        }

        if self.cache.enabled {
            if self.cache.max_entries == 0 {
                return Err(ConfigError::validation(
                    "cache.max_entries",
                    "must be positive when the cache is enabled",
                ));
            }
            if self.cache.ttl.is_zero() {
                return Err(ConfigError::validation(
                    "cache.ttl",
                    "must be positive when the cache is enabled",
                ));
            }
        }

        if self.pool.enabled && self.pool.max_idle_per_language == 0 {
            return Err(ConfigError::validation(
                "pool.max_idle_per_language",
                "must be positive when pooling is enabled",
            ));
        }

        for language in &self.pool.warm_up_languages {
            check_language("pool.warm_up_languages", language)?;
        }

        if self.resolver.header_name.trim().is_empty() {
            return Err(ConfigError::validation(
                "resolver.header_name",
                "cannot be empty",
            ));
        }

        Ok(())
    }

    /// Additional checks intended for production deployments.
    ///
    /// Requires the locales directory to exist and rejects caches and pools
    /// too small to be useful under load.
    pub fn validate_strict(&self) -> Result<(), ConfigError> {
        self.validate()?;

        if !self.locales.path.exists() {
            return Err(ConfigError::validation(
                "locales.path",
                format!("path does not exist: {}", self.locales.path.display()),
            ));
        }

        if self.cache.enabled && self.cache.max_entries < STRICT_MIN_CACHE_ENTRIES {
            return Err(ConfigError::validation(
                "cache.max_entries",
                format!("too small for production use (minimum {STRICT_MIN_CACHE_ENTRIES})"),
            ));
        }

        if self.pool.enabled && self.pool.max_idle_per_language < STRICT_MIN_POOL_SIZE {
            return Err(ConfigError::validation(
                "pool.max_idle_per_language",
                format!("too small for production use (minimum {STRICT_MIN_POOL_SIZE})"),
            ));
        }

        Ok(())
    }

    /// Fills derived defaults: an empty warm-up list becomes the default language.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if self.pool.warm_up_languages.is_empty() {
            self.pool.warm_up_languages = vec![self.default_language.clone()];
        }
        self
    }
}
