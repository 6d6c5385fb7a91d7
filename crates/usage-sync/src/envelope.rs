//! The Firestore typed-field envelope.
//!
//! Firestore wraps every scalar value with a tag naming its type:
//!
//! ```json
//! { "fields": { "uses": { "integerValue": "42" } } }
//! ```
//!
//! Integers travel as strings to preserve 64-bit precision.

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorKind, Result};

/// A typed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// A string.
    #[serde(rename = "stringValue")]
    String(String),
    /// A 64-bit signed integer.
    #[serde(rename = "integerValue")]
    Integer(#[serde(with = "integer")] i64),
    /// An `RFC 3339` timestamp.
    #[serde(rename = "timestampValue")]
    Timestamp(String),
    /// Any other value type, kept as raw `JSON`.
    #[serde(untagged)]
    Other(serde_json::Value),
}

/// The fields of a document, by name.
pub type Fields = BTreeMap<String, Value>;

/// A document, as sent to and received from the document store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Full resource name. Only present in responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Document fields.
    #[serde(default)]
    pub fields: Fields,
}

impl Document {
    /// Creates an empty [`Document`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            name: None,
            fields: BTreeMap::new(),
        }
    }

    /// Adds a string field.
    #[must_use]
    pub fn string(self, field: &str, value: &str) -> Self {
        self.value(field, Value::String(value.into()))
    }

    /// Adds an integer field.
    #[must_use]
    pub fn integer(self, field: &str, value: i64) -> Self {
        self.value(field, Value::Integer(value))
    }

    /// Adds a timestamp field.
    #[must_use]
    pub fn timestamp(self, field: &str, value: &str) -> Self {
        self.value(field, Value::Timestamp(value.into()))
    }

    fn value(mut self, field: &str, value: Value) -> Self {
        let _ = self.fields.insert(field.into(), value);
        self
    }

    /// Reads an integer field.
    ///
    /// Returns [`None`] if the field is absent.
    ///
    /// # Errors
    ///
    /// The field exists but it does not hold an integer.
    pub fn integer_field(&self, field: &str) -> Result<Option<i64>> {
        match self.fields.get(field) {
            None => Ok(None),
            Some(Value::Integer(value)) => Ok(Some(*value)),
            Some(value) => Err(Error::new(
                ErrorKind::Parse,
                format!("Field `{field}` is not an integer: {value:?}"),
            )),
        }
    }

    /// Serializes the document into a `JSON` body.
    ///
    /// # Errors
    ///
    /// Serialization failure.
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| {
            Error::new(
                ErrorKind::Encode,
                format!("Failed to serialize the document: {e}"),
            )
        })
    }

    /// Deserializes a document from a `JSON` body.
    ///
    /// # Errors
    ///
    /// The body is not a valid document.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| {
            Error::new(
                ErrorKind::Parse,
                format!("Failed to parse the document: {e}"),
            )
        })
    }
}

mod integer {
    use core::fmt;

    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(value: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        deserializer.deserialize_any(IntegerVisitor)
    }

    struct IntegerVisitor;

    impl Visitor<'_> for IntegerVisitor {
        type Value = i64;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("an integer or a string containing an integer")
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<i64, E> {
            Ok(value)
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<i64, E> {
            i64::try_from(value).map_err(|_| E::custom("integer out of range"))
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<i64, E> {
            value
                .parse()
                .map_err(|_| E::invalid_value(de::Unexpected::Str(value), &self))
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::error::ErrorKind;

    use super::{Document, Value};

    #[test]
    fn counter_document() {
        let body = Document::new().integer("uses", 42).to_vec().unwrap();

        assert_eq!(
            serde_json::from_slice::<serde_json::Value>(&body).unwrap(),
            json!({
                "fields": {
                    "uses": { "integerValue": "42" }
                }
            })
        );
    }

    #[test]
    fn log_document() {
        let body = Document::new()
            .string("device_id", "device_001")
            .integer("uses_sent", 10)
            .timestamp("timestamp", "2025-01-01T00:00:00Z")
            .to_vec()
            .unwrap();

        assert_eq!(
            serde_json::from_slice::<serde_json::Value>(&body).unwrap(),
            json!({
                "fields": {
                    "device_id": { "stringValue": "device_001" },
                    "uses_sent": { "integerValue": "10" },
                    "timestamp": { "timestampValue": "2025-01-01T00:00:00Z" }
                }
            })
        );
    }

    #[test]
    fn firestore_response() {
        let body = br#"{
            "name": "projects/p/databases/(default)/documents/devices/device_001",
            "fields": {
                "uses": { "integerValue": "1234" },
                "location": { "stringValue": "ground floor" },
                "ratio": { "doubleValue": 0.5 }
            },
            "createTime": "2025-01-01T00:00:00.000000Z",
            "updateTime": "2025-01-02T00:00:00.000000Z"
        }"#;

        let document = Document::from_slice(body).unwrap();

        assert_eq!(
            document.name.as_deref(),
            Some("projects/p/databases/(default)/documents/devices/device_001")
        );
        assert_eq!(document.integer_field("uses").unwrap(), Some(1234));
        assert_eq!(
            document.fields.get("location"),
            Some(&Value::String("ground floor".into()))
        );
        assert_eq!(
            document.fields.get("ratio"),
            Some(&Value::Other(json!({ "doubleValue": 0.5 })))
        );
    }

    #[test]
    fn integer_as_number() {
        let document =
            Document::from_slice(br#"{"fields":{"uses":{"integerValue":7}}}"#).unwrap();
        assert_eq!(document.integer_field("uses").unwrap(), Some(7));
    }

    #[test]
    fn missing_fields() {
        let document = Document::from_slice(br#"{"name":"a"}"#).unwrap();
        assert_eq!(document.integer_field("uses").unwrap(), None);
    }

    #[test]
    fn wrong_field_type() {
        let document =
            Document::from_slice(br#"{"fields":{"uses":{"stringValue":"7"}}}"#).unwrap();
        assert_eq!(
            document.integer_field("uses").unwrap_err().kind,
            ErrorKind::Parse
        );
    }

    #[test]
    fn malformed_integer() {
        // The value is kept as raw JSON, but it cannot be read as an integer.
        let document =
            Document::from_slice(br#"{"fields":{"uses":{"integerValue":"seven"}}}"#).unwrap();
        assert_eq!(
            document.integer_field("uses").unwrap_err().kind,
            ErrorKind::Parse
        );
    }

    #[test]
    fn malformed_bodies() {
        for body in [&b"not json"[..], br#"{"fields":"#, br#"{"fields":[1,2]}"#] {
            assert_eq!(Document::from_slice(body).unwrap_err().kind, ErrorKind::Parse);
        }
    }
}
