//! Record types flowing through the merge pipeline.
//!
//! A timeline archive element goes through three shapes:
//!
//! - [`RawRecord`] - exactly what the decoder produced
//! - [`SanitizedRecord`] - rich-text fields converted to plain text; this is
//!   what the nested JSON output contains
//! - [`FlatRecord`] - single-level `path.to[0].key → scalar` view used for
//!   CSV rows
//!
//! Each shape is its own type, and moving from one to the next consumes or
//! borrows the previous one, so a raw record can never be mistaken for a
//! sanitized one.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use tootpack::RawRecord;
//!
//! let raw = RawRecord::from_value(json!({"id": 42, "created_at": "2024-01-01"})).unwrap();
//! assert_eq!(raw.identifier("id").as_deref(), Some("42"));
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reads an identifier out of a field value.
///
/// Strings are taken verbatim, numbers by their decimal rendering. Empty
/// strings and any other JSON type mean "no identifier".
fn identifier_of(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// One archive element as decoded, before any cleanup.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(Map<String, Value>);

impl RawRecord {
    /// Wraps a JSON value; returns `None` unless it is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Returns a field by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns the canonical identifier stored under `field`.
    pub fn identifier(&self, field: &str) -> Option<String> {
        identifier_of(self.0.get(field))
    }

    /// Unwraps the underlying map.
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for RawRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// A record whose rich-text fields hold plain text.
///
/// Only [`normalize`](crate::core::normalize::normalize) creates these from
/// raw input; deserializing one assumes the JSON was produced by tootpack.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SanitizedRecord(Map<String, Value>);

impl SanitizedRecord {
    pub(crate) fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Returns a field by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns a string field by key.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Returns the canonical identifier stored under `field`.
    pub fn identifier(&self, field: &str) -> Option<String> {
        identifier_of(self.0.get(field))
    }

    /// Borrows the underlying map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Unwraps the underlying map.
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Number of top-level fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Single-level view of a record: qualified key path → scalar value.
///
/// Keys keep the order in which a depth-first walk first produced them.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct FlatRecord(Map<String, Value>);

impl FlatRecord {
    /// Creates an empty flat record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a value; an existing key keeps its position and is overwritten.
    pub fn insert(&mut self, key: String, value: Value) {
        self.0.insert(key, value);
    }

    /// Returns a value by qualified key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns `true` if the qualified key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Iterates over qualified keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Iterates over `(key, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of columns in this record.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no columns were produced.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Renders the CSV cell for `key`: strings verbatim, numbers and booleans
    /// in JSON notation, `null` and missing keys as an empty field.
    pub fn cell(&self, key: &str) -> String {
        self.0.get(key).map(cell_text).unwrap_or_default()
    }

    /// Unwraps the underlying map.
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

pub(crate) fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
