//! Message templates and placeholder substitution.
//!
//! Placeholders use the `{{.field}}` form; surrounding whitespace inside the
//! braces is ignored. A placeholder whose field is absent from the data is
//! left in the output unchanged.

use crate::error::{I18nError, I18nResult};
use crate::fingerprint::TemplateData;
use crate::plural::PluralCategory;
use serde_json::Value;
use std::collections::BTreeMap;

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageTemplate {
    /// A single string.
    Simple(String),
    /// Strings keyed by plural category; always contains `other`.
    Plural(BTreeMap<PluralCategory, String>),
}

impl MessageTemplate {
    /// Builds a plural template, rejecting empty sets and sets without `other`.
    pub fn plural(
        language: &str,
        id: &str,
        forms: BTreeMap<PluralCategory, String>,
    ) -> I18nResult<Self> {
        let template = Self::Plural(forms);
        template.validate(language, id)?;
        Ok(template)
    }

    /// Checks structural invariants.
    pub fn validate(&self, language: &str, id: &str) -> I18nResult<()> {
        let Self::Plural(forms) = self else {
            return Ok(());
        };
        let reason = if forms.is_empty() {
            "plural template has no forms"
        } else if !forms.contains_key(&PluralCategory::Other) {
            "plural template is missing the 'other' form"
        } else {
            return Ok(());
        };
        Err(I18nError::InvalidTemplate {
            language: language.to_string(),
            id: id.to_string(),
            reason: reason.to_string(),
        })
    }

    /// The text for `category`, falling back to `other`.
    pub fn text_for(&self, category: PluralCategory) -> &str {
        match self {
            Self::Simple(text) => text,
            Self::Plural(forms) => forms
                .get(&category)
                .or_else(|| forms.get(&PluralCategory::Other))
                .map_or("", String::as_str),
        }
    }

    /// The `other` form, or the single string.
    pub fn default_text(&self) -> &str {
        self.text_for(PluralCategory::Other)
    }

    /// Whether this template has plural forms.
    pub const fn is_plural(&self) -> bool {
        matches!(self, Self::Plural(_))
    }
}

impl From<&str> for MessageTemplate {
    fn from(text: &str) -> Self {
        Self::Simple(text.to_string())
    }
}

impl From<String> for MessageTemplate {
    fn from(text: String) -> Self {
        Self::Simple(text)
    }
}

/// Replaces `{{.field}}` placeholders in `text` with values from `data`.
pub fn substitute(text: &str, data: &TemplateData) -> String {
    let mut output = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("{{") {
        output.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];

        let Some(end) = after_open.find("}}") else {
            output.push_str(&rest[start..]);
            return output;
        };

        let inner = after_open[..end].trim();
        let placeholder = &rest[start..start + 2 + end + 2];
        match inner.strip_prefix('.').and_then(|field| data.get(field.trim())) {
            Some(value) => push_value(&mut output, value),
            None => output.push_str(placeholder),
        }

        rest = &after_open[end + 2..];
    }

    output.push_str(rest);
    output
}

fn push_value(output: &mut String, value: &Value) {
    match value {
        Value::String(s) => output.push_str(s),
        Value::Null => {}
        other => output.push_str(&other.to_string()),
    }
}

/// Reads the plural count from template data, accepting `Count` or `count`.
pub fn count_from(data: &TemplateData) -> Option<i64> {
    let value = data.get("Count").or_else(|| data.get("count"))?;
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|u| i64::try_from(u).unwrap_or(i64::MAX)))
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
