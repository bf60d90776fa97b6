//! Cache keys for rendered messages.

use crate::language::LanguageTag;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Named values substituted into message templates.
pub type TemplateData = HashMap<String, Value>;

/// Identity of a rendered message: language, message id and template data.
///
/// Equal logical data always produces the same fingerprint regardless of
/// map iteration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Computes the fingerprint of a translation request.
    ///
    /// Empty data yields `"{language}:{id}"`; otherwise the hex SHA-256 of the
    /// data's canonical JSON (keys sorted) is appended.
    pub fn compute(language: &LanguageTag, id: &str, data: &TemplateData) -> Self {
        if data.is_empty() {
            return Self(format!("{language}:{id}"));
        }
        Self(format!("{language}:{id}:{}", digest(data)))
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn digest(data: &TemplateData) -> String {
    let sorted: BTreeMap<&String, Value> = data.iter().map(|(k, v)| (k, canonical(v))).collect();
    let canonical = serde_json::to_vec(&sorted).unwrap_or_default();
    hex(&Sha256::digest(&canonical))
}

/// Copy of `value` with every object's keys in sorted order, whatever map
/// type `serde_json` was built with.
fn canonical(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key.clone(), canonical(value)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
        other => other.clone(),
    }
}

fn hex(bytes: &[u8]) -> String {
    use fmt::Write as _;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}
