//! Plural category selection.
//!
//! Templates with plural forms are keyed by CLDR category. Which category a
//! count falls into depends on the language; [`PluralRules`] is the seam
//! through which a localizer asks that question.

use crate::language::LanguageTag;
use intl_pluralrules::{PluralRuleType, PluralRules as IntlPluralRules};
use serde::{Deserialize, Serialize};
use std::fmt;
use unic_langid::LanguageIdentifier;

/// CLDR plural categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluralCategory {
    /// `zero`
    Zero,
    /// `one`
    One,
    /// `two`
    Two,
    /// `few`
    Few,
    /// `many`
    Many,
    /// `other`, required in every plural template
    Other,
}

impl PluralCategory {
    /// All categories in CLDR order.
    pub const ALL: [Self; 6] = [
        Self::Zero,
        Self::One,
        Self::Two,
        Self::Few,
        Self::Many,
        Self::Other,
    ];

    /// Lowercase CLDR keyword.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Zero => "zero",
            Self::One => "one",
            Self::Two => "two",
            Self::Few => "few",
            Self::Many => "many",
            Self::Other => "other",
        }
    }

    /// Parses a CLDR keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == keyword)
    }
}

impl fmt::Display for PluralCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<intl_pluralrules::PluralCategory> for PluralCategory {
    fn from(category: intl_pluralrules::PluralCategory) -> Self {
        use intl_pluralrules::PluralCategory as Cldr;
        match category {
            Cldr::ZERO => Self::Zero,
            Cldr::ONE => Self::One,
            Cldr::TWO => Self::Two,
            Cldr::FEW => Self::Few,
            Cldr::MANY => Self::Many,
            Cldr::OTHER => Self::Other,
        }
    }
}

/// Chooses the plural category for a count.
pub trait PluralRules: Send + Sync {
    /// Category for `count`.
    fn category(&self, count: i64) -> PluralCategory;
}

/// CLDR cardinal rules for one language.
pub struct CldrPluralRules {
    rules: IntlPluralRules,
}

impl CldrPluralRules {
    /// Rules for `language`, or `None` when CLDR has no data for it.
    ///
    /// CLDR data is keyed by bare language for most locales, so `zh-CN`
    /// resolves through `zh` when no region-specific entry exists.
    pub fn new(language: &LanguageTag) -> Option<Self> {
        let create = |identifier: LanguageIdentifier| {
            IntlPluralRules::create(identifier, PluralRuleType::CARDINAL).ok()
        };

        language
            .identifier()
            .and_then(create)
            .or_else(|| language.primary().parse().ok().and_then(create))
            .map(|rules| Self { rules })
    }
}

impl PluralRules for CldrPluralRules {
    fn category(&self, count: i64) -> PluralCategory {
        self.rules
            .select(count)
            .map_or(PluralCategory::Other, PluralCategory::from)
    }
}

impl fmt::Debug for CldrPluralRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CldrPluralRules")
            .field("locale", self.rules.get_locale())
            .finish()
    }
}

/// English-style rules: `one` for 1, `other` for everything else.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimplePluralRules;

impl PluralRules for SimplePluralRules {
    fn category(&self, count: i64) -> PluralCategory {
        if count == 1 {
            PluralCategory::One
        } else {
            PluralCategory::Other
        }
    }
}

/// Best available rules for `language`.
pub fn rules_for(language: &LanguageTag) -> Box<dyn PluralRules> {
    match CldrPluralRules::new(language) {
        Some(rules) => Box::new(rules),
        None => Box::new(SimplePluralRules),
    }
}
