//! Structured logging infrastructure for Parlance

use crate::error::{ParlanceError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Output format of the log layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, human oriented output
    #[default]
    Pretty,
    /// Single-line output
    Compact,
    /// Newline-delimited JSON records
    Json,
}

/// Configuration for the logging system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingOptions {
    /// Log level filter (e.g., "info", "parlance_i18n=debug")
    pub level: String,
    /// Output format
    pub format: LogFormat,
    /// Optional file path for log output
    pub file_path: Option<PathBuf>,
    /// Whether to emit span open/close events
    pub include_spans: bool,
    /// Whether to include target module information
    pub include_targets: bool,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            file_path: None,
            include_spans: false,
            include_targets: true,
        }
    }
}

impl LoggingOptions {
    /// Options for local development (pretty, debug level, spans on)
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            include_spans: true,
            ..Self::default()
        }
    }

    /// Options for production (json, info level)
    pub fn production() -> Self {
        Self {
            format: LogFormat::Json,
            ..Self::default()
        }
    }
}

/// Initialize the tracing subscriber with the given configuration.
///
/// `RUST_LOG` takes precedence over `options.level` when set. Fails if a
/// global subscriber is already installed or the log file cannot be opened.
pub fn init_logging(options: &LoggingOptions) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&options.level))
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| ParlanceError::config_with_source("invalid log filter", e))?;

    let span_events = if options.include_spans {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let file_writer = options.file_path.as_deref().map(file_appender);
    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = match (options.format, file_writer) {
        (LogFormat::Json, Some(writer)) => registry
            .with(
                fmt::layer()
                    .json()
                    .with_span_events(span_events)
                    .with_target(options.include_targets)
                    .with_writer(writer),
            )
            .try_init(),
        (LogFormat::Json, None) => registry
            .with(
                fmt::layer()
                    .json()
                    .with_span_events(span_events)
                    .with_target(options.include_targets),
            )
            .try_init(),
        (LogFormat::Compact, Some(writer)) => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_ansi(false)
                    .with_span_events(span_events)
                    .with_target(options.include_targets)
                    .with_writer(writer),
            )
            .try_init(),
        (LogFormat::Compact, None) => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_span_events(span_events)
                    .with_target(options.include_targets),
            )
            .try_init(),
        (LogFormat::Pretty, Some(writer)) => registry
            .with(
                fmt::layer()
                    .pretty()
                    .with_ansi(false)
                    .with_span_events(span_events)
                    .with_target(options.include_targets)
                    .with_writer(writer),
            )
            .try_init(),
        (LogFormat::Pretty, None) => registry
            .with(
                fmt::layer()
                    .pretty()
                    .with_span_events(span_events)
                    .with_target(options.include_targets)
                    .with_thread_ids(true),
            )
            .try_init(),
    };

    installed.map_err(|e| ParlanceError::with_source("failed to install log subscriber", e))
}

fn file_appender(path: &Path) -> tracing_appender::rolling::RollingFileAppender {
    let directory = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .map_or_else(|| "parlance.log".into(), |name| name.to_owned());
    tracing_appender::rolling::never(directory, file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = LoggingOptions::default();
        assert_eq!(options.level, "info");
        assert_eq!(options.format, LogFormat::Pretty);
        assert!(options.file_path.is_none());
        assert!(!options.include_spans);
        assert!(options.include_targets);
    }

    #[test]
    fn test_presets() {
        assert_eq!(LoggingOptions::development().level, "debug");
        assert!(LoggingOptions::development().include_spans);
        assert_eq!(LoggingOptions::production().format, LogFormat::Json);
    }

    #[test]
    fn test_format_deserializes_lowercase() {
        let options: LoggingOptions =
            serde_json::from_str(r#"{"level":"warn","format":"json"}"#).unwrap();
        assert_eq!(options.format, LogFormat::Json);
        assert_eq!(options.level, "warn");
        assert!(options.include_targets);
    }
}
