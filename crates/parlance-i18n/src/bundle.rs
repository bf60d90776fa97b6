//! Locale bundles and their atomically swappable handle.

use crate::error::{I18nError, I18nResult};
use crate::language::LanguageTag;
use crate::plural::PluralCategory;
use crate::template::MessageTemplate;
use arc_swap::ArcSwap;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Keys of a message object that carry metadata rather than text.
const METADATA_KEYS: [&str; 2] = ["description", "hash"];

/// One parsed locale document awaiting insertion into a bundle.
#[derive(Debug, Clone)]
pub struct LocaleSource {
    /// Language tag as written by the source.
    pub language: String,
    /// Where the document came from, for error reporting.
    pub origin: PathBuf,
    /// The JSON document.
    pub document: Value,
}

impl LocaleSource {
    /// Wraps an already parsed JSON document.
    pub fn new(language: impl Into<String>, origin: impl Into<PathBuf>, document: Value) -> Self {
        Self {
            language: language.into(),
            origin: origin.into(),
            document,
        }
    }

    /// Parses `json` as the document for `language`.
    pub fn from_json_str(language: impl Into<String>, json: &str) -> I18nResult<Self> {
        let language = language.into();
        let origin = PathBuf::from(format!("<{language}>"));
        let document = serde_json::from_str(json).map_err(|e| I18nError::LocaleParse {
            path: origin.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            language,
            origin,
            document,
        })
    }

    /// Builds a source from `(id, text)` pairs.
    pub fn from_pairs<'a>(
        language: impl Into<String>,
        pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        let language = language.into();
        let document = Value::Object(
            pairs
                .into_iter()
                .map(|(id, text)| (id.to_string(), Value::String(text.to_string())))
                .collect(),
        );
        Self {
            origin: PathBuf::from(format!("<{language}>")),
            language,
            document,
        }
    }

    /// Flattens the document into `(id, template)` pairs in document order.
    pub fn entries(&self) -> I18nResult<Vec<(String, MessageTemplate)>> {
        let Value::Object(root) = &self.document else {
            return Err(self.parse_error("top-level value must be an object"));
        };
        let mut entries = Vec::new();
        self.collect(root, None, &mut entries)?;
        Ok(entries)
    }

    fn collect(
        &self,
        object: &Map<String, Value>,
        prefix: Option<&str>,
        out: &mut Vec<(String, MessageTemplate)>,
    ) -> I18nResult<()> {
        for (key, value) in object {
            let id = prefix.map_or_else(|| key.clone(), |p| format!("{p}.{key}"));
            match value {
                Value::String(text) => out.push((id, MessageTemplate::Simple(text.clone()))),
                Value::Object(inner) if is_message_object(inner) => {
                    let template = self.message_object(&id, inner)?;
                    out.push((id, template));
                }
                Value::Object(inner) => self.collect(inner, Some(&id), out)?,
                _ => {
                    return Err(self.parse_error(format!(
                        "value of '{id}' must be a string or an object"
                    )))
                }
            }
        }
        Ok(())
    }

    fn message_object(&self, id: &str, object: &Map<String, Value>) -> I18nResult<MessageTemplate> {
        let mut forms = BTreeMap::new();
        for (key, value) in object {
            let Some(category) = PluralCategory::from_keyword(key) else {
                continue;
            };
            let Value::String(text) = value else {
                return Err(self.parse_error(format!(
                    "plural form '{key}' of '{id}' must be a string"
                )));
            };
            forms.insert(category, text.clone());
        }
        MessageTemplate::plural(&self.language, id, forms)
    }

    fn parse_error(&self, reason: impl Into<String>) -> I18nError {
        I18nError::LocaleParse {
            path: self.origin.clone(),
            reason: reason.into(),
        }
    }
}

fn is_message_object(object: &Map<String, Value>) -> bool {
    object
        .keys()
        .any(|k| PluralCategory::from_keyword(k).is_some() || METADATA_KEYS.contains(&k.as_str()))
}

/// Parsed catalogs for every loaded language.
///
/// Immutable once built; reloading produces a new bundle.
#[derive(Debug, Clone, Default)]
pub struct LocaleBundle {
    catalogs: HashMap<LanguageTag, HashMap<String, MessageTemplate>>,
}

impl LocaleBundle {
    /// A bundle with no languages. Every lookup misses.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a bundle from `sources`.
    ///
    /// A duplicate `(language, id)` overwrites the earlier entry. An invalid
    /// language tag or malformed template fails the whole load.
    #[instrument(skip_all, fields(sources = sources.len()))]
    pub fn load(sources: &[LocaleSource]) -> I18nResult<Self> {
        let mut catalogs: HashMap<LanguageTag, HashMap<String, MessageTemplate>> = HashMap::new();

        for source in sources {
            let language = LanguageTag::parse(&source.language)?;
            let entries = source.entries()?;
            debug!(
                "Parsed {} messages for {} from {}",
                entries.len(),
                language,
                source.origin.display()
            );
            catalogs.entry(language).or_default().extend(entries);
        }

        catalogs.retain(|_, catalog| !catalog.is_empty());

        let bundle = Self { catalogs };
        info!(
            "Loaded locale bundle with {} languages and {} messages",
            bundle.catalogs.len(),
            bundle.message_count()
        );
        Ok(bundle)
    }

    /// The template for `(language, id)`.
    pub fn lookup(&self, language: &LanguageTag, id: &str) -> Option<&MessageTemplate> {
        self.catalogs.get(language)?.get(id)
    }

    /// Whether `language` has at least one message.
    pub fn has_language(&self, language: &LanguageTag) -> bool {
        self.catalogs.contains_key(language)
    }

    /// Loaded languages, sorted.
    pub fn languages(&self) -> Vec<LanguageTag> {
        let mut languages: Vec<_> = self.catalogs.keys().cloned().collect();
        languages.sort();
        languages
    }

    /// Message ids of `language`, sorted.
    pub fn message_ids(&self, language: &LanguageTag) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .catalogs
            .get(language)
            .map(|c| c.keys().map(String::as_str).collect())
            .unwrap_or_default();
        ids.sort_unstable();
        ids
    }

    /// Number of languages.
    pub fn language_count(&self) -> usize {
        self.catalogs.len()
    }

    /// Total number of messages across languages.
    pub fn message_count(&self) -> usize {
        self.catalogs.values().map(HashMap::len).sum()
    }

    /// Whether no language has any message.
    pub fn is_empty(&self) -> bool {
        self.catalogs.is_empty()
    }
}

/// Shared, atomically replaceable reference to the current bundle.
///
/// Readers take a snapshot and keep using it even if a reload publishes a
/// newer bundle in the meantime.
#[derive(Debug, Clone)]
pub struct BundleHandle {
    current: Arc<ArcSwap<LocaleBundle>>,
}

impl BundleHandle {
    /// Wraps `bundle`.
    pub fn new(bundle: LocaleBundle) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(bundle)),
        }
    }

    /// The bundle as of now.
    pub fn snapshot(&self) -> Arc<LocaleBundle> {
        self.current.load_full()
    }

    /// Publishes `bundle` to all subsequent snapshots.
    pub fn replace(&self, bundle: LocaleBundle) {
        self.current.store(Arc::new(bundle));
    }

    /// Builds a bundle from `sources` and publishes it. On failure the
    /// current bundle stays in place.
    pub fn reload(&self, sources: &[LocaleSource]) -> I18nResult<()> {
        let bundle = LocaleBundle::load(sources)?;
        self.replace(bundle);
        Ok(())
    }
}

impl Default for BundleHandle {
    fn default() -> Self {
        Self::new(LocaleBundle::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(s: &str) -> LanguageTag {
        LanguageTag::parse(s).unwrap()
    }

    #[test]
    fn test_load_and_lookup() {
        let source = LocaleSource::from_json_str(
            "en",
            r#"{"WELCOME": "Hello", "ITEMS": {"one": "1 item", "other": "{{.Count}} items", "description": "cart"}}"#,
        )
        .unwrap();
        let bundle = LocaleBundle::load(&[source]).unwrap();

        assert_eq!(
            bundle.lookup(&tag("en"), "WELCOME"),
            Some(&MessageTemplate::from("Hello"))
        );
        assert!(bundle.lookup(&tag("en"), "ITEMS").unwrap().is_plural());
        assert!(bundle.lookup(&tag("en"), "MISSING").is_none());
        assert!(bundle.lookup(&tag("fr"), "WELCOME").is_none());
    }

    #[test]
    fn test_nested_objects_are_flattened() {
        let source = LocaleSource::from_json_str(
            "en",
            r#"{"errors": {"auth": {"DENIED": "Denied"}, "GONE": "Gone"}}"#,
        )
        .unwrap();
        let bundle = LocaleBundle::load(&[source]).unwrap();

        assert_eq!(
            bundle.message_ids(&tag("en")),
            vec!["errors.GONE", "errors.auth.DENIED"]
        );
    }

    #[test]
    fn test_last_duplicate_wins_per_language() {
        let first = LocaleSource::from_pairs("en", [("A", "first"), ("B", "b")]);
        let second = LocaleSource::from_pairs("en", [("A", "second")]);
        let other = LocaleSource::from_pairs("zh-CN", [("A", "甲")]);
        let bundle = LocaleBundle::load(&[first, other, second]).unwrap();

        assert_eq!(bundle.lookup(&tag("en"), "A").unwrap().default_text(), "second");
        assert_eq!(bundle.lookup(&tag("en"), "B").unwrap().default_text(), "b");
        assert_eq!(bundle.lookup(&tag("zh-CN"), "A").unwrap().default_text(), "甲");
    }

    #[test]
    fn test_languages_without_entries_are_not_listed() {
        let empty = LocaleSource::from_json_str("fr", "{}").unwrap();
        let en = LocaleSource::from_pairs("en", [("A", "a")]);
        let bundle = LocaleBundle::load(&[empty, en]).unwrap();

        assert_eq!(bundle.languages(), vec![tag("en")]);
        assert!(!bundle.has_language(&tag("fr")));
    }

    #[test]
    fn test_malformed_sources_fail_the_load() {
        let bad_language = LocaleSource::from_pairs("not a tag", [("A", "a")]);
        assert!(matches!(
            LocaleBundle::load(&[bad_language]),
            Err(I18nError::InvalidLanguage(_))
        ));

        let no_other =
            LocaleSource::from_json_str("en", r#"{"ITEMS": {"one": "1 item"}}"#).unwrap();
        assert!(matches!(
            LocaleBundle::load(&[no_other]),
            Err(I18nError::InvalidTemplate { .. })
        ));

        let empty_plural =
            LocaleSource::from_json_str("en", r#"{"ITEMS": {"description": "x"}}"#).unwrap();
        assert!(LocaleBundle::load(&[empty_plural]).is_err());

        let wrong_type = LocaleSource::from_json_str("en", r#"{"N": 5}"#).unwrap();
        assert!(matches!(
            LocaleBundle::load(&[wrong_type]),
            Err(I18nError::LocaleParse { .. })
        ));
    }

    #[test]
    fn test_handle_keeps_old_snapshot_and_survives_failed_reload() {
        let handle = BundleHandle::new(
            LocaleBundle::load(&[LocaleSource::from_pairs("en", [("A", "old")])]).unwrap(),
        );
        let before = handle.snapshot();

        handle
            .reload(&[LocaleSource::from_pairs("en", [("A", "new")])])
            .unwrap();
        assert_eq!(before.lookup(&tag("en"), "A").unwrap().default_text(), "old");
        assert_eq!(
            handle.snapshot().lookup(&tag("en"), "A").unwrap().default_text(),
            "new"
        );

        assert!(handle
            .reload(&[LocaleSource::from_pairs("??", [("A", "x")])])
            .is_err());
        assert_eq!(
            handle.snapshot().lookup(&tag("en"), "A").unwrap().default_text(),
            "new"
        );
    }
}
