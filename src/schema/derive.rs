//! Schema derivation
//!
//! Turns a [`RecordType`] into the wire schema advertised when creating or
//! describing a bucket:
//!
//! ```text
//! { "name": "MockBucket",
//!   "meta": { "schema": { "field": {"type": "integer"}, ... } } }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::record::RecordType;
use super::types::{FieldKind, FieldRole};

/// Wire description of one column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    /// Primitive kind
    #[serde(rename = "type")]
    pub kind: FieldKind,
    /// Placement in stored points; local only, never part of the wire shape
    #[serde(skip)]
    pub role: FieldRole,
}

/// Derived schema of a record type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketSchema {
    /// Record type name
    pub title: String,
    /// Columns sorted by name
    pub fields: BTreeMap<String, FieldSchema>,
}

impl BucketSchema {
    /// Schema with no known columns (remote buckets without a description)
    pub fn empty(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Kind of a column, if declared
    pub fn kind_of(&self, column: &str) -> Option<FieldKind> {
        self.fields.get(column).map(|f| f.kind)
    }

    /// Name of the column holding the measurement name
    pub fn measurement_column(&self) -> Option<&str> {
        self.fields
            .iter()
            .find(|(_, f)| f.role == FieldRole::Measurement)
            .map(|(name, _)| name.as_str())
    }

    /// Description in the `{name, meta: {schema}}` shape
    pub fn describe(&self) -> BucketDescription {
        BucketDescription {
            name: self.title.clone(),
            meta: BucketMeta {
                schema: self.fields.clone(),
            },
        }
    }
}

/// Bucket metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketMeta {
    pub schema: BTreeMap<String, FieldSchema>,
}

/// Identity plus derived schema of a bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketDescription {
    pub name: String,
    pub meta: BucketMeta,
}

/// Derive the wire schema of a record type.
///
/// Deterministic: columns are keyed by name in a sorted map.
pub fn derive_schema(record: &RecordType) -> BucketSchema {
    let fields = record
        .fields()
        .iter()
        .map(|f| {
            (
                f.name.clone(),
                FieldSchema {
                    kind: f.kind,
                    role: f.role,
                },
            )
        })
        .collect();

    BucketSchema {
        title: record.name().to_string(),
        fields,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldDef;
    use serde_json::json;

    fn mock_bucket() -> RecordType {
        RecordType::new(
            "MockBucket",
            vec![
                FieldDef::new("measurement", FieldKind::Integer, FieldRole::Measurement),
                FieldDef::new("tag", FieldKind::String, FieldRole::Tag),
                FieldDef::new("field", FieldKind::Integer, FieldRole::Field),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_derive_is_deterministic() {
        let rt = mock_bucket();
        assert_eq!(derive_schema(&rt), derive_schema(&rt));
        let names: Vec<_> = derive_schema(&rt).fields.keys().cloned().collect();
        assert_eq!(names, vec!["field", "measurement", "tag"]);
    }

    #[test]
    fn test_description_wire_shape() {
        let description = derive_schema(&mock_bucket()).describe();
        let value = serde_json::to_value(&description).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "MockBucket",
                "meta": {
                    "schema": {
                        "field": {"type": "integer"},
                        "measurement": {"type": "integer"},
                        "tag": {"type": "string"},
                    }
                }
            })
        );
    }

    #[test]
    fn test_all_kinds_map_exactly() {
        let rt = RecordType::new(
            "Kinds",
            vec![
                FieldDef::new("s", FieldKind::String, FieldRole::Tag),
                FieldDef::new("i", FieldKind::Integer, FieldRole::Field),
                FieldDef::new("f", FieldKind::Number, FieldRole::Field),
                FieldDef::new("b", FieldKind::Boolean, FieldRole::Field),
            ],
        )
        .unwrap();
        let value = serde_json::to_value(derive_schema(&rt)).unwrap();
        assert_eq!(
            value,
            json!({
                "title": "Kinds",
                "fields": {
                    "b": {"type": "boolean"},
                    "f": {"type": "number"},
                    "i": {"type": "integer"},
                    "s": {"type": "string"},
                }
            })
        );
    }

    #[test]
    fn test_measurement_column() {
        let schema = derive_schema(&mock_bucket());
        assert_eq!(schema.measurement_column(), Some("measurement"));
        assert_eq!(schema.kind_of("tag"), Some(FieldKind::String));
        assert_eq!(BucketSchema::empty("x").measurement_column(), None);
    }
}
