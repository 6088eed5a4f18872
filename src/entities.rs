//! Structured entities extracted from a request
//!
//! The model returns a loose JSON object; values stay as JSON so numbers like
//! `party_size: 2` survive untouched. Lookups treat "empty" values as missing.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Entity names the extraction prompt asks for
pub const ENTITY_VOCABULARY: &[&str] = &[
    "date",
    "time",
    "location",
    "cuisine",
    "dietary",
    "preference",
    "party_size",
    "budget",
    "destination",
    "pickup_location",
    "occasion",
    "recipient",
    "topic",
];

/// Fields checked against the invalid-location blocklist
pub const LOCATION_FIELDS: &[&str] = &["location", "destination", "pickup_location"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entities(BTreeMap<String, Value>);

impl Entities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fallback used when the extraction reply cannot be parsed
    pub fn unknown_topic() -> Self {
        let mut entities = Self::new();
        entities.insert("topic", Value::String("unknown".to_string()));
        entities
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// True when the key exists with a non-empty value
    pub fn has(&self, key: &str) -> bool {
        self.0.get(key).map(is_present).unwrap_or(false)
    }

    /// Present value rendered as text (numbers and booleans stringified)
    pub fn text(&self, key: &str) -> Option<String> {
        let value = self.0.get(key).filter(|v| is_present(v))?;
        Some(value_to_text(value))
    }

    /// Lower-cased text, or an empty string when missing
    pub fn lowered(&self, key: &str) -> String {
        self.text(key).map(|s| s.to_lowercase()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<(String, Value)> for Entities {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Truthiness of an extracted value: null, blank strings, zero, false and
/// empty containers all count as "not provided".
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
