//! Derivation of index entry values from records.

use crate::catalog::{FieldType, IndexDef, IndexKind};
use crate::error::{CoreError, CoreResult};
use crate::record::Record;
use md5::{Digest, Md5};
use serde_json::Value;
use std::fmt;

/// A typed index value.
///
/// Coercion is explicit and total over the declared [`FieldType`]s; a field
/// that cannot be read as its declared type is an error, never a panic and
/// never a silent stringification.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexValue {
    /// A string value, or an MD5 hex digest for hash-kind indexes.
    Str(String),
    /// A signed integer value.
    Int(i64),
    /// A floating point value.
    Float(f64),
}

impl IndexValue {
    /// Coerces a record field to the declared type.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::FieldCoercion`] if the JSON value does not carry
    /// the declared type.
    pub fn coerce(field: &str, value: &Value, field_type: FieldType) -> CoreResult<Self> {
        match (field_type, value) {
            (FieldType::String, Value::String(s)) => Ok(Self::Str(s.clone())),
            (FieldType::Int, Value::Number(n)) => n
                .as_i64()
                .map(Self::Int)
                .ok_or_else(|| CoreError::field_coercion(field, "int")),
            (FieldType::Float, Value::Number(n)) => n
                .as_f64()
                .map(Self::Float)
                .ok_or_else(|| CoreError::field_coercion(field, "float")),
            (FieldType::String, _) => Err(CoreError::field_coercion(field, "string")),
            (FieldType::Int, _) => Err(CoreError::field_coercion(field, "int")),
            (FieldType::Float, _) => Err(CoreError::field_coercion(field, "float")),
        }
    }

    /// Renders the value as the index entry key.
    #[must_use]
    pub fn entry_key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for IndexValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "{s}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
        }
    }
}

/// Derives the index value for `record` under `def`.
///
/// For [`IndexKind::Single`], the one declared field is read and coerced to
/// the declared [`FieldType`]; a record that lacks the field is simply not
/// indexed (`Ok(None)`).
///
/// For [`IndexKind::Hash`], every declared field must be present as a string;
/// the values are concatenated in field order and digested to an MD5 hex
/// string. A missing or non-string field is an error, since a partial
/// composite would silently collide with unrelated records.
///
/// # Errors
///
/// Returns [`CoreError::FieldCoercion`] when a present field has the wrong
/// type, or when a hash index field is absent.
pub fn derive_index_value(def: &IndexDef, record: &Record) -> CoreResult<Option<IndexValue>> {
    match def.kind {
        IndexKind::Single => {
            let field = &def.fields[0];
            match record.get(field) {
                None => Ok(None),
                Some(value) => IndexValue::coerce(field, value, def.field_type).map(Some),
            }
        }
        IndexKind::Hash => derive_hash(def, record).map(Some),
    }
}

fn derive_hash(def: &IndexDef, record: &Record) -> CoreResult<IndexValue> {
    let mut concatenated = String::new();
    for field in &def.fields {
        match record.get(field) {
            Some(Value::String(s)) => concatenated.push_str(s),
            _ => return Err(CoreError::field_coercion(field, "string")),
        }
    }
    let digest = Md5::digest(concatenated.as_bytes());
    Ok(IndexValue::Str(format!("{digest:x}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::IndexStatus;
    use crate::types::{CollectionId, IndexId};
    use serde_json::json;

    fn def(kind: IndexKind, field_type: FieldType, fields: &[&str]) -> IndexDef {
        IndexDef {
            id: IndexId::new(1),
            collection_id: CollectionId::new(1),
            name: "test".to_string(),
            fields: fields.iter().map(|f| (*f).to_string()).collect(),
            kind,
            field_type,
            unique: false,
            status: IndexStatus::Active,
        }
    }

    fn record(value: serde_json::Value) -> Record {
        Record::from_value(value).unwrap()
    }

    fn derive_key(def: &IndexDef, r: &Record) -> Option<String> {
        derive_index_value(def, r).unwrap().map(|v| v.entry_key())
    }

    #[test]
    fn single_string_field() {
        let def = def(IndexKind::Single, FieldType::String, &["customer"]);
        let r = record(json!({"_key": "o1", "customer": "carol"}));
        assert_eq!(
            derive_index_value(&def, &r).unwrap(),
            Some(IndexValue::Str("carol".to_string()))
        );
    }

    #[test]
    fn single_missing_field_skips() {
        let def = def(IndexKind::Single, FieldType::String, &["customer"]);
        let r = record(json!({"_key": "o1"}));
        assert_eq!(derive_index_value(&def, &r).unwrap(), None);
    }

    #[test]
    fn single_wrong_type_errors() {
        let def = def(IndexKind::Single, FieldType::String, &["customer"]);
        let r = record(json!({"_key": "o1", "customer": 42}));
        assert!(matches!(
            derive_index_value(&def, &r),
            Err(CoreError::FieldCoercion { .. })
        ));
    }

    #[test]
    fn single_int_field() {
        let def = def(IndexKind::Single, FieldType::Int, &["amount"]);
        let r = record(json!({"_key": "o1", "amount": 95}));
        assert_eq!(
            derive_index_value(&def, &r).unwrap(),
            Some(IndexValue::Int(95))
        );

        // A fractional number is not an int
        let r = record(json!({"_key": "o2", "amount": 1.5}));
        assert!(derive_index_value(&def, &r).is_err());
    }

    #[test]
    fn single_float_field() {
        let def = def(IndexKind::Single, FieldType::Float, &["score"]);
        let r = record(json!({"_key": "o1", "score": 2.5}));
        assert_eq!(derive_key(&def, &r), Some("2.5".to_string()));
    }

    #[test]
    fn hash_concatenates_then_digests() {
        let def = def(IndexKind::Hash, FieldType::String, &["a", "b"]);
        let r = record(json!({"_key": "o1", "a": "foo", "b": "bar"}));
        // md5("foobar")
        assert_eq!(
            derive_key(&def, &r),
            Some("3858f62230ac3c915f300c664312c63f".to_string())
        );
    }

    #[test]
    fn hash_ignores_unrelated_fields() {
        let def = def(IndexKind::Hash, FieldType::String, &["a", "b"]);
        let r1 = record(json!({"_key": "o1", "a": "foo", "b": "bar", "extra": 1}));
        let r2 = record(json!({"_key": "o2", "a": "foo", "b": "bar", "other": true}));
        assert_eq!(derive_key(&def, &r1), derive_key(&def, &r2));
    }

    #[test]
    fn hash_field_order_matters() {
        let ab = def(IndexKind::Hash, FieldType::String, &["a", "b"]);
        let ba = def(IndexKind::Hash, FieldType::String, &["b", "a"]);
        let r = record(json!({"_key": "o1", "a": "foo", "b": "bar"}));
        assert_ne!(derive_key(&ab, &r), derive_key(&ba, &r));
    }

    #[test]
    fn hash_missing_field_errors() {
        let def = def(IndexKind::Hash, FieldType::String, &["a", "b"]);
        let r = record(json!({"_key": "o1", "a": "foo"}));
        assert!(matches!(
            derive_index_value(&def, &r),
            Err(CoreError::FieldCoercion { .. })
        ));
    }

    #[test]
    fn md5_known_vectors() {
        let def = def(IndexKind::Hash, FieldType::String, &["x"]);
        let r = record(json!({"_key": "k", "x": "abc"}));
        assert_eq!(
            derive_key(&def, &r),
            Some("900150983cd24fb0d6963f7d28e17f72".to_string())
        );

        let r = record(json!({"_key": "k", "x": ""}));
        assert_eq!(
            derive_key(&def, &r),
            Some("d41d8cd98f00b204e9800998ecf8427e".to_string())
        );
    }
}
