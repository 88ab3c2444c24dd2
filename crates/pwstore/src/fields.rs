//! Field algebra — pure operations over a record's key/value map.
//!
//! A record's plaintext is a one-level JSON object whose values are all
//! strings:
//!
//! ```json
//! {"password": "hunter2", "url": "example.com", "user": "alice"}
//! ```
//!
//! Keys are held in a `BTreeMap`, so serialization is deterministic for a
//! given content (sorted by key). Nothing here performs I/O.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::Value;

use crate::error::{Result, StoreError};

/// Indentation used by [`FieldMap::pretty`].
const PRETTY_INDENT: &[u8] = b"    ";

/// The logical content of one record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    fields: BTreeMap<String, String>,
}

impl FieldMap {
    /// An empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse serialized record text.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::MalformedRecord` if the text is not a JSON object
    /// or if any value is not a string.
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| StoreError::MalformedRecord(format!("invalid JSON: {e}")))?;

        let Value::Object(object) = value else {
            return Err(StoreError::MalformedRecord(
                "record must be a JSON object".to_string(),
            ));
        };

        let mut fields = BTreeMap::new();
        for (key, value) in object {
            match value {
                Value::String(s) => {
                    fields.insert(key, s);
                }
                other => {
                    return Err(StoreError::MalformedRecord(format!(
                        "field {key:?} holds a {} instead of a string",
                        kind_of(&other)
                    )));
                }
            }
        }

        Ok(Self { fields })
    }

    /// Parse record plaintext bytes, rejecting invalid UTF-8.
    pub fn parse_bytes(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| StoreError::MalformedRecord(format!("invalid UTF-8: {e}")))?;
        Self::parse(text)
    }

    /// Look up a field value.
    pub fn get(&self, key: &str) -> Result<&str> {
        self.fields
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| StoreError::KeyNotFound(key.to_string()))
    }

    /// Insert or overwrite a field. Returns `true` if the map changed.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let value = value.into();
        match self.fields.insert(key.into(), value.clone()) {
            Some(previous) => previous != value,
            None => true,
        }
    }

    /// Remove a field, returning its old value.
    pub fn remove(&mut self, key: &str) -> Result<String> {
        self.fields
            .remove(key)
            .ok_or_else(|| StoreError::KeyNotFound(key.to_string()))
    }

    /// Field names in sorted order.
    pub fn list_keys(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Compact serialized form written (encrypted) to disk.
    pub fn serialize(&self) -> String {
        // A map of strings always serializes.
        serde_json::to_string(&self.fields).unwrap_or_else(|_| "{}".to_string())
    }

    /// Human-readable form: sorted keys, four-space indentation.
    pub fn pretty(&self) -> String {
        let mut out = Vec::new();
        let formatter = PrettyFormatter::with_indent(PRETTY_INDENT);
        let mut ser = Serializer::with_formatter(&mut out, formatter);
        if self.fields.serialize(&mut ser).is_err() {
            return self.serialize();
        }
        String::from_utf8(out).unwrap_or_else(|_| self.serialize())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
