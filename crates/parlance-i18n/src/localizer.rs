//! Per-language rendering contexts.

use crate::bundle::{BundleHandle, LocaleBundle};
use crate::error::{I18nError, I18nResult};
use crate::fingerprint::TemplateData;
use crate::language::LanguageTag;
use crate::plural::{self, PluralCategory, PluralRules};
use crate::template::{self, MessageTemplate};
use std::fmt;

/// Renders catalog entries for one language.
///
/// A localizer is owned by the pool while idle and moved to exactly one
/// caller while checked out. Building one resolves the language's plural
/// rules, which is the work pooling avoids repeating.
pub struct Localizer {
    language: LanguageTag,
    fallback_language: LanguageTag,
    bundle: BundleHandle,
    plural_rules: Box<dyn PluralRules>,
}

impl Localizer {
    /// Creates a localizer for `language` reading from `bundle`.
    pub fn new(language: LanguageTag, fallback_language: LanguageTag, bundle: BundleHandle) -> Self {
        let plural_rules = plural::rules_for(&language);
        Self {
            language,
            fallback_language,
            bundle,
            plural_rules,
        }
    }

    /// Language this localizer renders.
    pub const fn language(&self) -> &LanguageTag {
        &self.language
    }

    /// Language consulted by callers when this one misses.
    pub const fn fallback_language(&self) -> &LanguageTag {
        &self.fallback_language
    }

    /// The bundle handle this localizer was built with.
    pub const fn bundle(&self) -> &BundleHandle {
        &self.bundle
    }

    /// Renders `id` against the current bundle.
    pub fn localize(&self, id: &str, data: &TemplateData) -> I18nResult<String> {
        let snapshot = self.bundle.snapshot();
        self.render(&snapshot, id, data)
    }

    /// Renders `id` against an explicit bundle snapshot.
    ///
    /// Plural templates select their form from the `Count` (or `count`)
    /// value in `data`, defaulting to `other` when none is given.
    pub fn render(&self, bundle: &LocaleBundle, id: &str, data: &TemplateData) -> I18nResult<String> {
        let template = bundle
            .lookup(&self.language, id)
            .ok_or_else(|| I18nError::MessageNotFound {
                language: self.language.to_string(),
                id: id.to_string(),
            })?;
        Ok(self.render_template(template, data))
    }

    /// Renders an already resolved template.
    pub fn render_template(&self, template: &MessageTemplate, data: &TemplateData) -> String {
        let category = match template {
            MessageTemplate::Simple(_) => PluralCategory::Other,
            MessageTemplate::Plural(_) => self.plural_category(data),
        };
        template::substitute(template.text_for(category), data)
    }

    /// Substitutes `data` into an ad-hoc template string.
    pub fn render_str(&self, text: &str, data: &TemplateData) -> String {
        template::substitute(text, data)
    }

    /// Plural category chosen for the count in `data`.
    pub fn plural_category(&self, data: &TemplateData) -> PluralCategory {
        template::count_from(data).map_or(PluralCategory::Other, |count| {
            self.plural_rules.category(count)
        })
    }
}

impl fmt::Debug for Localizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Localizer")
            .field("language", &self.language)
            .field("fallback_language", &self.fallback_language)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::LocaleSource;
    use serde_json::json;

    fn tag(s: &str) -> LanguageTag {
        LanguageTag::parse(s).unwrap()
    }

    fn handle() -> BundleHandle {
        let en = LocaleSource::from_json_str(
            "en",
            r#"{"HELLO": "Hello, {{.name}}!", "FILES": {"one": "{{.Count}} file", "other": "{{.Count}} files"}}"#,
        )
        .unwrap();
        BundleHandle::new(LocaleBundle::load(&[en]).unwrap())
    }

    #[test]
    fn test_localize_substitutes_data() {
        let localizer = Localizer::new(tag("en"), tag("en"), handle());
        let mut data = TemplateData::new();
        data.insert("name".into(), json!("Ada"));

        assert_eq!(localizer.localize("HELLO", &data).unwrap(), "Hello, Ada!");
    }

    #[test]
    fn test_plural_selection_uses_count() {
        let localizer = Localizer::new(tag("en"), tag("en"), handle());
        let mut data = TemplateData::new();

        data.insert("Count".into(), json!(1));
        assert_eq!(localizer.localize("FILES", &data).unwrap(), "1 file");

        data.insert("Count".into(), json!(3));
        assert_eq!(localizer.localize("FILES", &data).unwrap(), "3 files");
    }

    #[test]
    fn test_missing_message_is_not_found() {
        let localizer = Localizer::new(tag("fr"), tag("en"), handle());
        assert!(matches!(
            localizer.localize("HELLO", &TemplateData::new()),
            Err(I18nError::MessageNotFound { .. })
        ));
    }
}
