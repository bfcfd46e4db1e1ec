//! Core schema types
//!
//! - `FieldKind`: the four primitive column kinds a record may declare
//! - `FieldRole`: where a column lands in a stored point
//! - `FieldDef`: one declared column
//! - `Value` / `Row`: dynamically typed column values
//! - `FieldValue`: Rust types allowed as record fields

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// A row of column values keyed by column name
pub type Row = BTreeMap<String, Value>;

/// Primitive kind of a declared column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// UTF-8 text
    String,
    /// Signed 64-bit integer
    Integer,
    /// 64-bit float
    Number,
    /// true / false
    Boolean,
}

impl FieldKind {
    /// Wire name used in derived schemas
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }

    /// Parse a wire name ("float" is accepted as an alias of "number")
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "string" => Some(Self::String),
            "integer" => Some(Self::Integer),
            "number" | "float" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            _ => None,
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Placement of a column inside a stored point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldRole {
    /// The column's value names the point's measurement
    Measurement,
    /// Indexed string column
    Tag,
    /// Value column
    #[default]
    Field,
}

/// A single declared column of a record type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    /// Column name
    pub name: String,
    /// Primitive kind
    pub kind: FieldKind,
    /// Placement in the stored point
    pub role: FieldRole,
}

impl FieldDef {
    /// Create a new field definition
    pub fn new(name: impl Into<String>, kind: FieldKind, role: FieldRole) -> Self {
        Self {
            name: name.into(),
            kind,
            role,
        }
    }
}

/// A dynamically typed column value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl Value {
    /// Kind of this value
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::String(_) => FieldKind::String,
            Self::Integer(_) => FieldKind::Integer,
            Self::Float(_) => FieldKind::Number,
            Self::Boolean(_) => FieldKind::Boolean,
        }
    }

    /// Convert this value to the given kind.
    ///
    /// Strings are parsed, integers widen to floats and integral floats
    /// narrow to integers. Returns `None` when no lossless reading exists.
    pub fn coerce(&self, kind: FieldKind) -> Option<Value> {
        match (self, kind) {
            (v, k) if v.kind() == k => Some(v.clone()),
            (v, FieldKind::String) => Some(Value::String(v.to_string())),
            (Self::String(s), FieldKind::Integer) => s.trim().parse().ok().map(Value::Integer),
            (Self::String(s), FieldKind::Number) => s.trim().parse().ok().map(Value::Float),
            (Self::String(s), FieldKind::Boolean) => match s.trim() {
                "true" => Some(Value::Boolean(true)),
                "false" => Some(Value::Boolean(false)),
                _ => None,
            },
            (Self::Integer(i), FieldKind::Number) => Some(Value::Float(*i as f64)),
            (Self::Float(f), FieldKind::Integer)
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 =>
            {
                Some(Value::Integer(*f as i64))
            }
            _ => None,
        }
    }

    /// Compare two values of compatible kinds
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Self::String(a), Self::String(b)) => Some(a.cmp(b)),
            (Self::Integer(a), Self::Integer(b)) => Some(a.cmp(b)),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            (Self::Integer(a), Self::Float(b)) => (*a as f64).partial_cmp(b),
            (Self::Float(a), Self::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Self::Boolean(a), Self::Boolean(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(v) => write!(f, "{}", v),
            Self::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

/// Rust types that may be declared as record fields.
///
/// Only the four primitive kinds implement this, so declaring a field of any
/// other type fails to compile.
pub trait FieldValue: Sized + Clone + Send + Sync + 'static {
    /// Declared kind
    const KIND: FieldKind;

    /// Wrap into a dynamic value
    fn into_value(self) -> Value;

    /// Read back from a value already coerced to `KIND`
    fn from_value(value: &Value) -> Option<Self>;
}

impl FieldValue for String {
    const KIND: FieldKind = FieldKind::String;

    fn into_value(self) -> Value {
        Value::String(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FieldValue for i64 {
    const KIND: FieldKind = FieldKind::Integer;

    fn into_value(self) -> Value {
        Value::Integer(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl FieldValue for f64 {
    const KIND: FieldKind = FieldKind::Number;

    fn into_value(self) -> Value {
        Value::Float(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl FieldValue for bool {
    const KIND: FieldKind = FieldKind::Boolean;

    fn into_value(self) -> Value {
        Value::Boolean(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_wire_names() {
        assert_eq!(FieldKind::String.as_str(), "string");
        assert_eq!(FieldKind::Integer.as_str(), "integer");
        assert_eq!(FieldKind::Number.as_str(), "number");
        assert_eq!(FieldKind::Boolean.as_str(), "boolean");
        assert_eq!(FieldKind::from_str("float"), Some(FieldKind::Number));
        assert_eq!(FieldKind::from_str("array"), None);
    }

    #[test]
    fn test_coerce_from_string() {
        let raw = Value::String("20".to_string());
        assert_eq!(raw.coerce(FieldKind::Integer), Some(Value::Integer(20)));
        assert_eq!(raw.coerce(FieldKind::Number), Some(Value::Float(20.0)));
        assert_eq!(raw.coerce(FieldKind::Boolean), None);

        let raw = Value::String("true".to_string());
        assert_eq!(raw.coerce(FieldKind::Boolean), Some(Value::Boolean(true)));
    }

    #[test]
    fn test_coerce_numeric() {
        assert_eq!(
            Value::Integer(3).coerce(FieldKind::Number),
            Some(Value::Float(3.0))
        );
        assert_eq!(
            Value::Float(3.0).coerce(FieldKind::Integer),
            Some(Value::Integer(3))
        );
        assert_eq!(Value::Float(3.5).coerce(FieldKind::Integer), None);
        assert_eq!(Value::Float(1e30).coerce(FieldKind::Integer), None);
        assert_eq!(Value::Float(-1e30).coerce(FieldKind::Integer), None);
        assert_eq!(Value::Float(f64::NAN).coerce(FieldKind::Integer), None);
        assert_eq!(
            Value::Float(-9_007_199_254_740_992.0).coerce(FieldKind::Integer),
            Some(Value::Integer(-9_007_199_254_740_992))
        );
        assert_eq!(
            Value::Integer(7).coerce(FieldKind::String),
            Some(Value::String("7".to_string()))
        );
    }

    #[test]
    fn test_compare() {
        assert_eq!(
            Value::Integer(10).compare(&Value::Integer(15)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Value::Integer(10).compare(&Value::Float(10.0)),
            Some(Ordering::Equal)
        );
        assert_eq!(
            Value::String("b".into()).compare(&Value::String("a".into())),
            Some(Ordering::Greater)
        );
        assert_eq!(Value::Boolean(true).compare(&Value::Integer(1)), None);
    }

    #[test]
    fn test_value_json_is_untagged() {
        let json = serde_json::to_string(&Value::Integer(10)).unwrap();
        assert_eq!(json, "10");
        let json = serde_json::to_string(&Value::String("tag".into())).unwrap();
        assert_eq!(json, "\"tag\"");
    }
}
