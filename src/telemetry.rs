//! Schema-less telemetry records.
//!
//! A record is an insertion-ordered JSON object. Field names starting with
//! `_` are meta fields: `_topic_name` labels the source and `__comp` lists
//! fields whose payload was left compressed.

use serde_json::{Map, Value};

pub const META_PREFIX: char = '_';
pub const TOPIC_NAME_FIELD: &str = "_topic_name";
pub const COMPRESSED_FIELD: &str = "__comp";
pub const UUID_KEY: &str = "uuid";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TelemetryRecord {
    fields: Map<String, Value>,
}

impl TelemetryRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-object JSON becomes a single `data` field.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self { fields },
            other => {
                let mut fields = Map::new();
                fields.insert("data".to_string(), other);
                Self { fields }
            }
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn source_label(&self) -> Option<&str> {
        self.fields.get(TOPIC_NAME_FIELD).and_then(Value::as_str)
    }

    pub fn is_compressed(&self, name: &str) -> bool {
        match self.fields.get(COMPRESSED_FIELD) {
            Some(Value::Array(names)) => names.iter().any(|n| n.as_str() == Some(name)),
            _ => false,
        }
    }

    /// Displayable fields in record order, meta fields skipped.
    pub fn visible_fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields
            .iter()
            .filter(|(name, _)| !name.starts_with(META_PREFIX))
            .map(|(name, value)| (name.as_str(), value))
    }

    /// Classifies one field. Order matters: uuid, boolean, compressed, then anything else.
    pub fn classify<'a>(&self, name: &str, value: &'a Value) -> FieldValue<'a> {
        if let Some(bytes) = uuid_bytes(value) {
            return FieldValue::Uuid(bytes);
        }
        if let Value::Bool(b) = value {
            return FieldValue::Bool(*b);
        }
        if self.is_compressed(name) {
            return FieldValue::Compressed;
        }
        FieldValue::Structured(value)
    }
}

impl From<Value> for TelemetryRecord {
    fn from(value: Value) -> Self {
        Self::from_value(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<'a> {
    Uuid(Vec<u8>),
    Bool(bool),
    Compressed,
    Structured(&'a Value),
}

/// Bytes of an identity-tagged value: an object whose `uuid` is an integer array.
/// An empty array still counts and renders as an empty fingerprint.
fn uuid_bytes(value: &Value) -> Option<Vec<u8>> {
    value
        .get(UUID_KEY)?
        .as_array()?
        .iter()
        .map(|item| item.as_i64().map(|b| (b & 0xFF) as u8))
        .collect()
}

pub fn hex_fingerprint(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keeps_field_order() {
        let record = TelemetryRecord::from_value(json!({"z": 1, "a": 2, "m": 3}));
        let names: Vec<&str> = record.visible_fields().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["z", "a", "m"]);
    }

    #[test]
    fn meta_fields_are_hidden() {
        let record = TelemetryRecord::from_value(json!({
            "_topic_name": "/odom",
            "__comp": ["scan"],
            "speed": 1.0
        }));
        let names: Vec<&str> = record.visible_fields().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["speed"]);
        assert_eq!(record.source_label(), Some("/odom"));
        assert!(record.is_compressed("scan"));
        assert!(!record.is_compressed("speed"));
    }

    #[test]
    fn classifies_each_shape() {
        let record = TelemetryRecord::from_value(json!({
            "__comp": ["blob", "flag"],
            "id": {"uuid": [0, 15, 16, 255]},
            "flag": true,
            "blob": "eJzL",
            "pose": {"x": 1}
        }));
        let kinds: Vec<FieldValue> = record
            .visible_fields()
            .map(|(name, value)| record.classify(name, value))
            .collect();
        assert_eq!(kinds[0], FieldValue::Uuid(vec![0, 15, 16, 255]));
        // boolean wins over the compressed marker
        assert_eq!(kinds[1], FieldValue::Bool(true));
        assert_eq!(kinds[2], FieldValue::Compressed);
        assert!(matches!(kinds[3], FieldValue::Structured(_)));
    }

    #[test]
    fn malformed_uuid_falls_back_to_structured() {
        let record = TelemetryRecord::new().with_field("id", json!({"uuid": ["ab"]}));
        let value = record.get("id").unwrap();
        assert!(matches!(record.classify("id", value), FieldValue::Structured(_)));
    }

    #[test]
    fn empty_uuid_is_still_identity_tagged() {
        let record = TelemetryRecord::new().with_field("id", json!({"uuid": []}));
        let value = record.get("id").unwrap();
        assert_eq!(record.classify("id", value), FieldValue::Uuid(vec![]));
    }

    #[test]
    fn hex_is_lowercase_and_padded() {
        assert_eq!(hex_fingerprint(&[0x00, 0x0a, 0xab, 0xff]), "000aabff");
    }

    #[test]
    fn scalar_payload_becomes_data_field() {
        let record = TelemetryRecord::from_value(json!(42));
        assert_eq!(record.get("data"), Some(&json!(42)));
    }
}
