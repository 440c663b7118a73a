//! Resource bundles: translated strings for one language.

use serde_json::Value;
use std::collections::HashMap;

/// Mapping from translation key to translated text for one language.
///
/// Nested JSON objects are flattened into dot-joined keys, so
/// `{"nav": {"about": "About"}}` is addressed as `nav.about`. Only string
/// leaves are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bundle {
    entries: HashMap<String, String>,
}

impl Bundle {
    /// Create an empty bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a bundle from a JSON document.
    ///
    /// The top level must be an object.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(json)?;
        Ok(Self::from_value(&value))
    }

    /// Build a bundle from an already parsed JSON value.
    ///
    /// Anything other than an object yields an empty bundle.
    pub fn from_value(value: &Value) -> Self {
        let mut entries = HashMap::new();
        if value.is_object() {
            flatten_value(value, "", &mut entries);
        }
        Self { entries }
    }

    /// Look up a translation.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all keys, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterate over all entries, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for Bundle
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn flatten_value(value: &Value, prefix: &str, entries: &mut HashMap<String, String>) {
    match value {
        Value::Object(obj) => {
            for (key, val) in obj {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_value(val, &path, entries);
            }
        }
        Value::String(s) => {
            entries.insert(prefix.to_string(), s.clone());
        }
        _ => {}
    }
}
