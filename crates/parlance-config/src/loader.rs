//! Configuration loading with environment variable overrides.

use crate::schema::Config;
use parlance_common::{parse_bool, parse_duration, ParlanceError};
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Environment variable naming an explicit configuration file.
pub const CONFIG_PATH_VAR: &str = "PARLANCE_CONFIG_PATH";

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error when reading or writing a configuration file
    #[error("Failed to access configuration file '{}': {source}", path.display())]
    Io {
        /// File that could not be accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// YAML parsing error
    #[error("Failed to parse YAML configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Environment variable parsing error
    #[error("Failed to parse environment variable '{var}': {source}")]
    EnvParse {
        /// Variable name
        var: String,
        /// Underlying parse error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Environment variable with a value outside the accepted set
    #[error("Invalid value '{value}' for environment variable '{var}'")]
    InvalidEnvValue {
        /// Variable name
        var: String,
        /// Rejected value
        value: String,
    },

    /// Configuration validation error
    #[error("Invalid configuration for '{field}': {message}")]
    Validation {
        /// Offending field path
        field: String,
        /// Description of the problem
        message: String,
    },
}

impl ConfigError {
    /// Creates a validation error for `field`.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<ConfigError> for ParlanceError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, message } => {
                Self::validation_field(message, field)
            }
            other => Self::config_with_source(other.to_string(), other),
        }
    }
}

/// Configuration loader for Parlance
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a YAML file with environment variable overrides.
    ///
    /// A missing file is not an error: the defaults are used instead.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let config = Self::read_file(path.as_ref())?.unwrap_or_default();
        Self::finish(config)
    }

    /// Load several YAML files, each overriding what the previous ones set,
    /// then apply environment overrides. Missing files are skipped.
    ///
    /// See [`Config::merge`] for what counts as set.
    pub fn load_layered<P: AsRef<Path>>(paths: &[P]) -> Result<Config, ConfigError> {
        let mut config = Config::default();
        for path in paths {
            if let Some(layer) = Self::read_file(path.as_ref())? {
                config = config.merge(layer);
            }
        }
        Self::finish(config)
    }

    fn read_file(path: &Path) -> Result<Option<Config>, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                info!("Loading configuration from {}", path.display());
                Ok(Some(serde_yaml::from_str(&content)?))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No configuration file at {}, using defaults", path.display());
                Ok(None)
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    fn finish(mut config: Config) -> Result<Config, ConfigError> {
        Self::apply_env_overrides(&mut config)?;
        let config = config.normalized();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `PARLANCE_CONFIG_PATH`, `parlance.yaml` or
    /// `parlance.yml`, in that order, falling back to defaults.
    pub fn load() -> Result<Config, ConfigError> {
        if let Ok(path) = env::var(CONFIG_PATH_VAR) {
            return Self::load_from_file(path);
        }

        let candidate = ["parlance.yaml", "parlance.yml"]
            .into_iter()
            .map(Path::new)
            .find(|p| p.exists())
            .unwrap_or_else(|| Path::new("parlance.yaml"));

        Self::load_from_file(candidate)
    }

    /// Load the defaults with environment overrides applied.
    pub fn from_env() -> Result<Config, ConfigError> {
        Self::finish(Config::default())
    }

    /// Serialize `config` as YAML to `path`.
    pub fn save_to_file<P: AsRef<Path>>(config: &Config, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let yaml = serde_yaml::to_string(config)?;
        std::fs::write(path, yaml).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `PARLANCE_*` environment variable overrides to configuration
    pub fn apply_env_overrides(config: &mut Config) -> Result<(), ConfigError> {
        if let Some(language) = non_empty_var("PARLANCE_DEFAULT_LANGUAGE") {
            config.default_language = language;
        }

        if let Some(language) = non_empty_var("PARLANCE_FALLBACK_LANGUAGE") {
            config.fallback_language = language;
        }

        if let Some(path) = non_empty_var("PARLANCE_LOCALES_PATH") {
            config.locales.path = PathBuf::from(path);
        }

        // Cache
        if let Some(enabled) = bool_var("PARLANCE_CACHE_ENABLED")? {
            config.cache.enabled = enabled;
        }

        if let Some(size) = non_empty_var("PARLANCE_CACHE_SIZE") {
            config.cache.max_entries = size.trim().parse().map_err(|e| ConfigError::EnvParse {
                var: "PARLANCE_CACHE_SIZE".to_string(),
                source: Box::new(e),
            })?;
        }

        if let Some(ttl) = non_empty_var("PARLANCE_CACHE_TTL") {
            config.cache.ttl =
                parse_duration(&ttl).ok_or_else(|| ConfigError::InvalidEnvValue {
                    var: "PARLANCE_CACHE_TTL".to_string(),
                    value: ttl.clone(),
                })?;
        }

        // Pool
        if let Some(enabled) = bool_var("PARLANCE_POOL_ENABLED")? {
            config.pool.enabled = enabled;
        }

        if let Some(size) = non_empty_var("PARLANCE_POOL_SIZE") {
            config.pool.max_idle_per_language =
                size.trim().parse().map_err(|e| ConfigError::EnvParse {
                    var: "PARLANCE_POOL_SIZE".to_string(),
                    source: Box::new(e),
                })?;
        }

        if let Some(warm_up) = bool_var("PARLANCE_POOL_WARMUP")? {
            config.pool.warm_up = warm_up;
        }

        if let Some(languages) = non_empty_var("PARLANCE_POOL_LANGUAGES") {
            config.pool.warm_up_languages = languages
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Switches
        if let Some(watch) = bool_var("PARLANCE_WATCH")? {
            config.watch = watch;
        }

        if let Some(metrics) = bool_var("PARLANCE_METRICS")? {
            config.enable_metrics = metrics;
        }

        if let Some(debug) = bool_var("PARLANCE_DEBUG")? {
            config.debug = debug;
        }

        Ok(())
    }
}

fn non_empty_var(var: &str) -> Option<String> {
    env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn bool_var(var: &str) -> Result<Option<bool>, ConfigError> {
    match non_empty_var(var) {
        None => Ok(None),
        Some(value) => parse_bool(&value)
            .map(Some)
            .ok_or_else(|| ConfigError::InvalidEnvValue {
                var: var.to_string(),
                value,
            }),
    }
}
