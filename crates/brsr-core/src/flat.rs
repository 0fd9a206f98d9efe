//! # Flat Extraction Store
//!
//! The language-model extraction step emits one JSON object whose keys are
//! flat keys (`sectiona_cin`, `sectiona_products_array`, ...) and whose
//! values are whatever the model produced. [`FlatStore`] wraps that object.
//!
//! The store is untrusted input: keys may be missing or unknown, and values
//! carry no type guarantees. Only the top-level shape (a JSON object) is
//! checked, at the boundary where the payload is read.

use std::io::Read;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{BrsrError, FlatStoreError};

/// Mapping of flat keys to raw extracted values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatStore(Map<String, Value>);

impl FlatStore {
    /// An empty store.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Wrap a parsed JSON value.
    ///
    /// # Errors
    ///
    /// Returns `FlatStoreError::NotAnObject` if `value` is not a JSON object.
    pub fn from_value(value: Value) -> Result<Self, FlatStoreError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(FlatStoreError::NotAnObject {
                found: json_type_name(&other),
            }),
        }
    }

    /// Parse a JSON document.
    ///
    /// # Errors
    ///
    /// Returns `FlatStoreError::Parse` for invalid JSON and
    /// `FlatStoreError::NotAnObject` for a non-object document.
    pub fn from_json_str(json: &str) -> Result<Self, FlatStoreError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Read a JSON document from a file or stream.
    ///
    /// # Errors
    ///
    /// Returns `BrsrError::FlatStore` wrapping either `FlatStoreError` variant.
    pub fn from_reader(reader: impl Read) -> Result<Self, BrsrError> {
        let value: Value = serde_json::from_reader(reader).map_err(FlatStoreError::Parse)?;
        Ok(Self::from_value(value)?)
    }

    /// Look up a flat key.
    pub fn get(&self, flat_key: &str) -> Option<&Value> {
        self.0.get(flat_key)
    }

    /// Returns true if the key is present, even with a `null` value.
    pub fn contains_key(&self, flat_key: &str) -> bool {
        self.0.contains_key(flat_key)
    }

    /// Insert a value, returning the previous one.
    pub fn insert(&mut self, flat_key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(flat_key.into(), value)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the store has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Iterate over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Borrow the underlying JSON object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Convert into a JSON object value.
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl FromIterator<(String, Value)> for FlatStore {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Map<String, Value>> for FlatStore {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// JSON type name used in error messages.
fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_object_payload() {
        let store = FlatStore::from_json_str(
            r#"{"sectiona_cin": "L12345MH2020PLC123456", "sectiona_board_total": 9}"#,
        )
        .unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("sectiona_cin"), Some(&json!("L12345MH2020PLC123456")));
        assert_eq!(store.get("sectiona_board_total"), Some(&json!(9)));
        assert!(store.get("sectiona_email").is_none());
    }

    #[test]
    fn null_is_present() {
        let store = FlatStore::from_value(json!({"sectiona_email": null})).unwrap();
        assert!(store.contains_key("sectiona_email"));
        assert_eq!(store.get("sectiona_email"), Some(&Value::Null));
    }

    #[test]
    fn rejects_non_object_payloads() {
        let err = FlatStore::from_value(json!(["sectiona_cin"])).unwrap_err();
        assert!(matches!(err, FlatStoreError::NotAnObject { found: "array" }));

        let err = FlatStore::from_json_str("\"text\"").unwrap_err();
        assert!(matches!(err, FlatStoreError::NotAnObject { found: "string" }));

        let err = FlatStore::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, FlatStoreError::Parse(_)));
    }

    #[test]
    fn reader_errors_surface_as_flat_store_errors() {
        let store = FlatStore::from_reader(&br#"{"sectiona_cin": "L1"}"#[..]).unwrap();
        assert_eq!(store.get("sectiona_cin"), Some(&json!("L1")));

        let err = FlatStore::from_reader(&b"[1, 2]"[..]).unwrap_err();
        assert!(matches!(
            err,
            BrsrError::FlatStore(FlatStoreError::NotAnObject { found: "array" })
        ));
        let err = FlatStore::from_reader(&b"{"[..]).unwrap_err();
        assert!(matches!(err, BrsrError::FlatStore(FlatStoreError::Parse(_))));
    }

    #[test]
    fn keys_keep_insertion_order() {
        let store: FlatStore = [
            ("z_last".to_string(), json!(1)),
            ("a_first".to_string(), json!(2)),
        ]
        .into_iter()
        .collect();
        assert_eq!(store.keys().collect::<Vec<_>>(), ["z_last", "a_first"]);
    }

    #[test]
    fn serializes_as_plain_object() {
        let mut store = FlatStore::new();
        store.insert("sectiona_cin", json!("L1"));
        assert_eq!(serde_json::to_value(&store).unwrap(), json!({"sectiona_cin": "L1"}));
        assert_eq!(store.into_value(), json!({"sectiona_cin": "L1"}));
    }
}
