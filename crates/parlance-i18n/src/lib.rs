//! # Parlance I18n
//!
//! Translation resolution and caching for Parlance.
//!
//! A [`LocaleBundle`] holds the parsed catalogs. Rendering happens through
//! [`Localizer`]s borrowed from a [`LocalizerPool`], and rendered strings are
//! kept in a [`ResponseCache`] keyed by a [`Fingerprint`] of the language,
//! message id and template data. The [`Translator`] ties these together and
//! walks the fallback chain; [`I18nService`] owns everything and exposes
//! reload, stats and metrics.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod bundle;
pub mod cache;
pub mod error;
pub mod fingerprint;
pub mod language;
pub mod loader;
pub mod localizer;
pub mod metrics;
pub mod plural;
pub mod pool;
pub mod resolver;
pub mod service;
pub mod template;
pub mod translator;
pub mod watcher;

pub use bundle::{BundleHandle, LocaleBundle, LocaleSource};
pub use cache::{CacheStats, ResponseCache};
pub use error::{I18nError, I18nResult};
pub use fingerprint::{Fingerprint, TemplateData};
pub use language::LanguageTag;
pub use loader::{detect_mode, LocaleFileStats, LocaleLoader};
pub use localizer::Localizer;
pub use metrics::{MetricsSnapshot, TranslationMetrics};
pub use plural::{CldrPluralRules, PluralCategory, PluralRules, SimplePluralRules};
pub use pool::{LocalizerFactory, LocalizerPool, PoolStats, WARM_UP_PER_LANGUAGE};
pub use resolver::{
    is_valid_language_code, language_name, normalize_language_code, parse_accept_language,
    LanguageHints, LanguageResolver, LanguageSource, RequestLocale, SUPPORTED_LANGUAGES,
};
pub use service::{I18nService, ServiceStats};
pub use template::MessageTemplate;
pub use translator::{humanize_message_id, Translator, UNKNOWN_MESSAGE};
pub use watcher::LocaleWatcher;
