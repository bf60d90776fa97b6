//! Language tags used as catalog and pool keys.

use crate::error::{I18nError, I18nResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use unic_langid::LanguageIdentifier;

/// A language tag such as `en` or `zh-CN`.
///
/// Tags that parse as BCP 47 identifiers are stored in canonical form, so
/// `zh-cn` and `zh-CN` compare equal. Anything else that is still a plausible
/// tag (ASCII letters, digits, `-` and `_`) is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LanguageTag(String);

/// Longest accepted tag.
pub const MAX_TAG_LEN: usize = 35;

impl LanguageTag {
    /// Parses and canonicalises a language tag.
    pub fn parse(tag: &str) -> I18nResult<Self> {
        let trimmed = tag.trim();
        if trimmed.is_empty()
            || trimmed.len() > MAX_TAG_LEN
            || !trimmed
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(I18nError::InvalidLanguage(tag.to_string()));
        }

        let canonical = trimmed
            .parse::<LanguageIdentifier>()
            .map_or_else(|_| trimmed.to_string(), |id| id.to_string());
        Ok(Self(canonical))
    }

    /// The tag as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The primary language subtag, e.g. `zh` for `zh-CN`.
    pub fn primary(&self) -> &str {
        self.0.split(['-', '_']).next().unwrap_or(&self.0)
    }

    /// Parsed identifier, if the tag is valid BCP 47.
    pub fn identifier(&self) -> Option<LanguageIdentifier> {
        self.0.parse().ok()
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LanguageTag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for LanguageTag {
    type Err = I18nError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for LanguageTag {
    type Error = I18nError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<LanguageTag> for String {
    fn from(tag: LanguageTag) -> Self {
        tag.0
    }
}
