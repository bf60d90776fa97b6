//! Per-request language negotiation.
//!
//! A request can name its language explicitly (header, cookie, query) or
//! implicitly through `Accept-Language`. The first usable signal wins; the
//! configured default applies when none is usable.

use crate::error::I18nResult;
use crate::language::{LanguageTag, MAX_TAG_LEN};
use parlance_config::{Config, ResolverConfig};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use tracing::{debug, warn};
use unic_langid::LanguageIdentifier;

/// Languages with a known native display name, in presentation order.
pub const SUPPORTED_LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("zh-CN", "简体中文"),
    ("zh-TW", "繁體中文"),
    ("ja", "日本語"),
    ("ko", "한국어"),
    ("fr", "Français"),
    ("de", "Deutsch"),
    ("es", "Español"),
    ("ru", "Русский"),
    ("pt", "Português"),
    ("it", "Italiano"),
    ("ar", "العربية"),
    ("hi", "हिन्दी"),
    ("th", "ไทย"),
    ("vi", "Tiếng Việt"),
];

/// Native display name of `code`, after alias normalisation.
pub fn language_name(code: &str) -> Option<&'static str> {
    let code = normalize_language_code(code);
    SUPPORTED_LANGUAGES
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(&code))
        .map(|(_, name)| *name)
}

/// Where the resolved language came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LanguageSource {
    /// Explicit language header.
    Header,
    /// Language cookie.
    Cookie,
    /// Query parameter.
    Query,
    /// `Accept-Language` negotiation.
    AcceptLanguage,
    /// Configured default.
    Default,
}

impl fmt::Display for LanguageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Header => "header",
            Self::Cookie => "cookie",
            Self::Query => "query",
            Self::AcceptLanguage => "accept-language",
            Self::Default => "default",
        })
    }
}

/// The language chosen for one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestLocale {
    /// Language to translate into.
    pub language: LanguageTag,
    /// Signal it was taken from.
    pub source: LanguageSource,
    /// `Accept-Language` weight, 1.0 for every other source.
    pub quality: f32,
}

impl RequestLocale {
    /// A locale with full weight.
    pub const fn new(language: LanguageTag, source: LanguageSource) -> Self {
        Self {
            language,
            source,
            quality: 1.0,
        }
    }
}

/// Raw language signals extracted from a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageHints {
    /// Value of the explicit language header.
    pub header: Option<String>,
    /// Value of the language cookie.
    pub cookie: Option<String>,
    /// Value of the language query parameter.
    pub query: Option<String>,
    /// Value of `Accept-Language`.
    pub accept_language: Option<String>,
}

impl LanguageHints {
    /// No signals.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the explicit header value.
    #[must_use]
    pub fn with_header(mut self, value: impl Into<String>) -> Self {
        self.header = Some(value.into());
        self
    }

    /// Sets the cookie value.
    #[must_use]
    pub fn with_cookie(mut self, value: impl Into<String>) -> Self {
        self.cookie = Some(value.into());
        self
    }

    /// Sets the query parameter value.
    #[must_use]
    pub fn with_query(mut self, value: impl Into<String>) -> Self {
        self.query = Some(value.into());
        self
    }

    /// Sets the `Accept-Language` value.
    #[must_use]
    pub fn with_accept_language(mut self, value: impl Into<String>) -> Self {
        self.accept_language = Some(value.into());
        self
    }
}

/// Chooses a supported language for each request.
#[derive(Debug, Clone)]
pub struct LanguageResolver {
    config: ResolverConfig,
    supported: Vec<LanguageTag>,
    default_language: LanguageTag,
}

impl LanguageResolver {
    /// Creates a resolver. Unparseable supported languages are skipped.
    pub fn new(config: ResolverConfig, default_language: LanguageTag) -> Self {
        let supported = config
            .supported_languages
            .iter()
            .filter_map(|code| {
                let tag = LanguageTag::parse(&normalize_language_code(code)).ok();
                if tag.is_none() {
                    warn!("Ignoring unsupported language code '{}'", code);
                }
                tag
            })
            .collect();

        Self {
            config,
            supported,
            default_language,
        }
    }

    /// Builds a resolver from the full configuration.
    pub fn from_config(config: &Config) -> I18nResult<Self> {
        let default_language =
            LanguageTag::parse(&normalize_language_code(&config.default_language))?;
        Ok(Self::new(config.resolver.clone(), default_language))
    }

    /// Name of the explicit language header.
    pub fn header_name(&self) -> &str {
        &self.config.header_name
    }

    /// Name of the language cookie.
    pub fn cookie_name(&self) -> &str {
        &self.config.cookie_name
    }

    /// Name of the language query parameter.
    pub fn query_key(&self) -> &str {
        &self.config.query_key
    }

    /// Languages requests may resolve to.
    pub fn supported(&self) -> &[LanguageTag] {
        &self.supported
    }

    /// Supported languages paired with their display names; the name is empty
    /// for languages missing from [`SUPPORTED_LANGUAGES`].
    pub fn supported_with_names(&self) -> Vec<(LanguageTag, &'static str)> {
        self.supported
            .iter()
            .map(|tag| (tag.clone(), language_name(tag.as_str()).unwrap_or("")))
            .collect()
    }

    /// Resolves `hints` in priority order: header, cookie, query,
    /// `Accept-Language`, default.
    pub fn resolve(&self, hints: &LanguageHints) -> RequestLocale {
        let explicit = [
            (hints.header.as_deref(), LanguageSource::Header, true),
            (
                hints.cookie.as_deref(),
                LanguageSource::Cookie,
                self.config.enable_cookie,
            ),
            (
                hints.query.as_deref(),
                LanguageSource::Query,
                self.config.enable_query,
            ),
        ];

        for (value, source, enabled) in explicit {
            if !enabled {
                continue;
            }
            if let Some(language) = value.and_then(|v| self.match_explicit(v)) {
                debug!("Resolved language {} from {}", language, source);
                return RequestLocale::new(language, source);
            }
        }

        if let Some(locale) = hints
            .accept_language
            .as_deref()
            .and_then(|header| self.negotiate(header))
        {
            return locale;
        }

        RequestLocale::new(self.default_language.clone(), LanguageSource::Default)
    }

    /// The supported language named by an explicit value, if any.
    pub fn match_explicit(&self, value: &str) -> Option<LanguageTag> {
        if !is_plausible_code(value) {
            return None;
        }
        self.find_exact(&normalize_language_code(value))
    }

    /// Best supported language for an `Accept-Language` value.
    pub fn negotiate(&self, accept_language: &str) -> Option<RequestLocale> {
        for (range, quality) in parse_accept_language(accept_language) {
            let normalized = normalize_language_code(&range);
            let matched = self
                .find_exact(&normalized)
                .or_else(|| self.find_primary(&normalized));
            if let Some(language) = matched {
                return Some(RequestLocale {
                    language,
                    source: LanguageSource::AcceptLanguage,
                    quality,
                });
            }
        }
        None
    }

    fn find_exact(&self, code: &str) -> Option<LanguageTag> {
        self.supported
            .iter()
            .find(|tag| tag.as_str().eq_ignore_ascii_case(code))
            .cloned()
    }

    fn find_primary(&self, code: &str) -> Option<LanguageTag> {
        let primary = code.split(['-', '_']).next()?;
        self.supported
            .iter()
            .find(|tag| tag.primary().eq_ignore_ascii_case(primary))
            .cloned()
    }
}

/// Parses `Accept-Language` into ranges ordered by descending weight.
///
/// `*` and ranges with `q=0` are dropped; ties keep header order.
pub fn parse_accept_language(value: &str) -> Vec<(String, f32)> {
    let mut ranges: Vec<(String, f32)> = value
        .split(',')
        .filter_map(|part| {
            let mut components = part.split(';');
            let range = components.next()?.trim();
            if range.is_empty() || range == "*" {
                return None;
            }
            let quality = components
                .filter_map(|param| param.trim().strip_prefix("q="))
                .find_map(|q| q.trim().parse::<f32>().ok())
                .unwrap_or(1.0)
                .clamp(0.0, 1.0);
            (quality > 0.0).then(|| (range.to_string(), quality))
        })
        .collect();

    ranges.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    ranges
}

/// Canonical form of a language code, resolving common Chinese aliases.
///
/// `zh`, `zh_cn` and `zh-chs` map to `zh-CN`; `zh_tw` and `zh-cht` map to
/// `zh-TW`. Other valid codes are canonicalised; invalid ones are returned
/// trimmed but otherwise unchanged.
pub fn normalize_language_code(code: &str) -> String {
    let trimmed = code.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "zh" | "zh_cn" | "zh-cn" | "zh-chs" | "zh-hans" => "zh-CN".to_string(),
        "zh_tw" | "zh-tw" | "zh-cht" | "zh-hant" => "zh-TW".to_string(),
        _ => trimmed
            .parse::<LanguageIdentifier>()
            .map_or_else(|_| trimmed.to_string(), |id| id.to_string()),
    }
}

/// Whether `code` is a well-formed language identifier.
pub fn is_valid_language_code(code: &str) -> bool {
    is_plausible_code(code) && code.trim().parse::<LanguageIdentifier>().is_ok()
}

fn is_plausible_code(code: &str) -> bool {
    let code = code.trim();
    !code.is_empty()
        && code.len() <= MAX_TAG_LEN
        && code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> LanguageResolver {
        LanguageResolver::new(
            ResolverConfig::default(),
            LanguageTag::parse("en").unwrap(),
        )
    }

    #[test]
    fn test_priority_order() {
        let resolver = resolver();
        let hints = LanguageHints::new()
            .with_header("zh-TW")
            .with_cookie("zh-CN")
            .with_accept_language("en");

        let locale = resolver.resolve(&hints);
        assert_eq!(locale.language.as_str(), "zh-TW");
        assert_eq!(locale.source, LanguageSource::Header);

        let locale = resolver.resolve(&LanguageHints {
            header: Some("klingon!".into()),
            ..hints
        });
        assert_eq!(locale.language.as_str(), "zh-CN");
        assert_eq!(locale.source, LanguageSource::Cookie);
    }

    #[test]
    fn test_disabled_sources_are_skipped() {
        let config = ResolverConfig {
            enable_cookie: false,
            enable_query: false,
            ..ResolverConfig::default()
        };
        let resolver = LanguageResolver::new(config, LanguageTag::parse("en").unwrap());
        let hints = LanguageHints::new().with_cookie("zh-CN").with_query("zh-TW");

        let locale = resolver.resolve(&hints);
        assert_eq!(locale.source, LanguageSource::Default);
        assert_eq!(locale.language.as_str(), "en");
    }

    #[test]
    fn test_aliases_and_case() {
        let resolver = resolver();
        assert_eq!(resolver.match_explicit("zh").unwrap().as_str(), "zh-CN");
        assert_eq!(resolver.match_explicit("ZH_TW").unwrap().as_str(), "zh-TW");
        assert_eq!(resolver.match_explicit("zh-chs").unwrap().as_str(), "zh-CN");
        assert!(resolver.match_explicit("fr").is_none());
    }

    #[test]
    fn test_accept_language_weights() {
        let resolver = resolver();
        let locale = resolver
            .negotiate("fr;q=0.9, zh-TW;q=0.5, en;q=0.8, *;q=1")
            .unwrap();
        assert_eq!(locale.language.as_str(), "en");
        assert!((locale.quality - 0.8).abs() < f32::EPSILON);
        assert_eq!(locale.source, LanguageSource::AcceptLanguage);
    }

    #[test]
    fn test_accept_language_primary_match_and_zero_weight() {
        let resolver = resolver();
        assert_eq!(
            resolver.negotiate("en-GB,en;q=0.5").unwrap().language.as_str(),
            "en"
        );
        assert!(resolver.negotiate("en;q=0, fr").is_none());
    }

    #[test]
    fn test_parse_accept_language() {
        let parsed = parse_accept_language("da, en-GB;q=0.8, en;q=0.7, *;q=0.1, de;q=0");
        let ranges: Vec<&str> = parsed.iter().map(|(r, _)| r.as_str()).collect();
        assert_eq!(ranges, vec!["da", "en-GB", "en"]);
    }

    #[test]
    fn test_normalize_and_validate() {
        assert_eq!(normalize_language_code("en-us"), "en-US");
        assert_eq!(normalize_language_code(" zh_cn "), "zh-CN");
        assert_eq!(normalize_language_code("???"), "???");
        assert!(is_valid_language_code("pt-BR"));
        assert!(!is_valid_language_code("pt BR"));
        assert!(!is_valid_language_code(""));
    }

    #[test]
    fn test_language_names() {
        assert_eq!(language_name("en"), Some("English"));
        assert_eq!(language_name("zh_cn"), Some("简体中文"));
        assert_eq!(language_name("zh-hant"), Some("繁體中文"));
        assert_eq!(language_name("JA"), Some("日本語"));
        assert_eq!(language_name("tlh"), None);
        assert!(SUPPORTED_LANGUAGES
            .iter()
            .all(|(code, _)| is_valid_language_code(code)));
    }

    #[test]
    fn test_supported_with_names() {
        let config = ResolverConfig {
            supported_languages: vec!["en".into(), "zh-CN".into(), "tlh".into()],
            ..ResolverConfig::default()
        };
        let resolver = LanguageResolver::new(config, LanguageTag::parse("en").unwrap());

        let named: Vec<(String, &str)> = resolver
            .supported_with_names()
            .into_iter()
            .map(|(tag, name)| (tag.to_string(), name))
            .collect();
        assert_eq!(
            named,
            vec![
                ("en".to_string(), "English"),
                ("zh-CN".to_string(), "简体中文"),
                ("tlh".to_string(), ""),
            ]
        );
    }
}
