//! Settings values and flattened settings maps
//!
//! A parsed settings source becomes a [`RawSettingsMap`]: a flat mapping from
//! `"section/key"` (or bare key) to [`SettingsValue`]. Lookup is
//! case-insensitive while the stored key keeps the case it was written with.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A settings value: scalar, list, or nested map.
///
/// This is an explicit tagged union with strict accessors; a value never
/// coerces between types. Callers that want leniency decide it themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingsValue {
    Boolean(bool),
    Integer(i64),
    String(String),
    List(Vec<SettingsValue>),
    Map(HashMap<String, SettingsValue>),
}

impl SettingsValue {
    /// Name of the contained type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    /// Borrow the string contents, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the integer contents, if this is an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the boolean contents, if this is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// A value is blank when it is a string that is empty or
    /// whitespace-only. Non-string values are never blank.
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::String(s) if s.trim().is_empty())
    }
}

impl From<&str> for SettingsValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for SettingsValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for SettingsValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<bool> for SettingsValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<serde_json::Value> for SettingsValue {
    /// Map a JSON value into the settings union.
    ///
    /// Integers stay integers; non-integer numbers and nulls have no
    /// counterpart in the union and become their string representation
    /// (null becomes the blank string).
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::String(String::new()),
            serde_json::Value::Bool(b) => Self::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => Self::String(n.to_string()),
            },
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(entries) => Self::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Self::from(v)))
                    .collect(),
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    /// Key as written in the source
    name: String,
    value: SettingsValue,
}

/// Flattened key-value view of one settings source.
///
/// Keys are matched case-insensitively; iteration yields the original
/// spelling. Inserting under an existing key replaces both the value and the
/// stored spelling.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSettingsMap {
    entries: HashMap<String, Entry>,
}

impl RawSettingsMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Insert a value under `name`, replacing any entry matching it
    /// case-insensitively.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<SettingsValue>) {
        let name = name.into();
        self.entries.insert(
            name.to_lowercase(),
            Entry {
                name,
                value: value.into(),
            },
        );
    }

    /// Look up a value by case-insensitive key.
    pub fn get(&self, key: &str) -> Option<&SettingsValue> {
        self.entries.get(&key.to_lowercase()).map(|e| &e.value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&key.to_lowercase())
    }

    /// Iterate entries with their original-case keys.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SettingsValue)> {
        self.entries.values().map(|e| (e.name.as_str(), &e.value))
    }

    /// Original-case keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(|e| e.name.as_str())
    }

    /// String value under `key`; `Ok(None)` when absent, `TypeMismatch` when
    /// present with another type.
    pub fn str_value(&self, key: &str) -> Result<Option<&str>> {
        self.typed(key, "string", SettingsValue::as_str)
    }

    /// Integer value under `key`.
    pub fn int_value(&self, key: &str) -> Result<Option<i64>> {
        self.typed(key, "integer", SettingsValue::as_int)
    }

    /// Boolean value under `key`.
    pub fn bool_value(&self, key: &str) -> Result<Option<bool>> {
        self.typed(key, "boolean", SettingsValue::as_bool)
    }

    fn typed<'a, T>(
        &'a self,
        key: &str,
        expected: &'static str,
        accessor: impl Fn(&'a SettingsValue) -> Option<T>,
    ) -> Result<Option<T>> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => accessor(value).map(Some).ok_or_else(|| Error::TypeMismatch {
                key: key.to_string(),
                expected,
                actual: value.type_name(),
            }),
        }
    }

    /// True when the entry under `key` is absent or blank.
    pub fn is_blank(&self, key: &str) -> bool {
        self.get(key).is_none_or(SettingsValue::is_blank)
    }
}

impl FromIterator<(String, SettingsValue)> for RawSettingsMap {
    fn from_iter<I: IntoIterator<Item = (String, SettingsValue)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (name, value) in iter {
            map.insert(name, value);
        }
        map
    }
}
