//! Schemaless record model.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The mandatory primary-key field every record must carry.
pub const KEY_FIELD: &str = "_key";

/// A schemaless record: an arbitrary JSON object with a mandatory
/// string-valued [`KEY_FIELD`].
///
/// Records in the same collection need not share any fields beyond `_key`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Wraps a JSON object as a record. The `_key` field is not validated
    /// here; [`Record::key`] reports its absence at use sites.
    #[must_use]
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Parses a record from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a JSON object.
    pub fn from_value(value: Value) -> CoreResult<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(CoreError::invalid_operation("record must be a JSON object")),
        }
    }

    /// Parses a record from raw JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a JSON object.
    pub fn from_bytes(bytes: &[u8]) -> CoreResult<Self> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_value(value)
    }

    /// Returns the record's primary key.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingKey`] if `_key` is absent, or
    /// [`CoreError::InvalidKey`] if it is not a string.
    pub fn key(&self) -> CoreResult<&str> {
        match self.0.get(KEY_FIELD) {
            None => Err(CoreError::MissingKey),
            Some(Value::String(s)) => Ok(s),
            Some(_) => Err(CoreError::InvalidKey),
        }
    }

    /// Returns the value of `field`, or `None` if the record lacks it.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Returns the underlying field map.
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Serializes the record to JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_bytes(&self) -> CoreResult<Vec<u8>> {
        Ok(serde_json::to_vec(&self.0)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        Record::from_value(value).unwrap()
    }

    #[test]
    fn record_key_present() {
        let r = record(json!({"_key": "order-1", "amount": 95}));
        assert_eq!(r.key().unwrap(), "order-1");
    }

    #[test]
    fn record_key_missing() {
        let r = record(json!({"amount": 95}));
        assert!(matches!(r.key(), Err(CoreError::MissingKey)));
    }

    #[test]
    fn record_key_not_a_string() {
        let r = record(json!({"_key": 7}));
        assert!(matches!(r.key(), Err(CoreError::InvalidKey)));
    }

    #[test]
    fn record_rejects_non_object() {
        assert!(Record::from_value(json!([1, 2])).is_err());
        assert!(Record::from_bytes(b"\"just a string\"").is_err());
    }

    #[test]
    fn record_bytes_roundtrip() {
        let r = record(json!({"_key": "k1", "tags": ["a", "b"], "nested": {"x": 1}}));
        let bytes = r.to_bytes().unwrap();
        let back = Record::from_bytes(&bytes).unwrap();
        assert_eq!(back, r);
    }

    #[test]
    fn record_heterogeneous_fields() {
        // Records in one collection need not share a schema
        let a = record(json!({"_key": "a", "color": "red"}));
        let b = record(json!({"_key": "b", "weight": 12.5}));
        assert!(a.get("weight").is_none());
        assert!(b.get("color").is_none());
    }
}
