//! Record declarations
//!
//! A record type is a named, ordered set of typed columns. Rust types opt in
//! by implementing [`Record`], normally through the [`record!`](crate::record)
//! macro, and root declarations list their record types through
//! [`Schema`] / [`schema!`](crate::schema).

use std::collections::HashSet;

use super::derive::{derive_schema, BucketSchema};
use super::error::{SchemaError, SchemaResult};
use super::types::{FieldDef, FieldKind, FieldRole, FieldValue, Row, Value};

/// Column that carries the measurement name in stored rows
pub const MEASUREMENT_COLUMN: &str = "_measurement";

/// Column that carries the point timestamp in stored rows
pub const TIME_COLUMN: &str = "_time";

/// Validated descriptor of a declared record type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordType {
    name: String,
    fields: Vec<FieldDef>,
}

impl RecordType {
    /// Validate and build a record type descriptor
    pub fn new(name: impl Into<String>, fields: Vec<FieldDef>) -> SchemaResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(SchemaError::EmptyName);
        }

        let mut seen = HashSet::with_capacity(fields.len());
        let mut measurements = 0;
        for field in &fields {
            if field.name.starts_with('_') {
                return Err(SchemaError::ReservedField {
                    record: name,
                    field: field.name.clone(),
                });
            }
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField {
                    record: name,
                    field: field.name.clone(),
                });
            }
            if field.role == FieldRole::Tag && field.kind != FieldKind::String {
                return Err(SchemaError::NonStringTag {
                    record: name,
                    field: field.name.clone(),
                    kind: field.kind,
                });
            }
            if field.role == FieldRole::Measurement {
                measurements += 1;
            }
        }

        if measurements > 1 {
            return Err(SchemaError::MultipleMeasurements(name));
        }
        if !fields.iter().any(|f| f.role == FieldRole::Field) {
            return Err(SchemaError::NoValueField(name));
        }

        Ok(Self { name, fields })
    }

    /// Record type name (also the bucket name)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared fields in declaration order
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The field holding the measurement name, if declared
    pub fn measurement_field(&self) -> Option<&FieldDef> {
        self.fields
            .iter()
            .find(|f| f.role == FieldRole::Measurement)
    }

    /// Derived wire schema
    pub fn schema(&self) -> BucketSchema {
        derive_schema(self)
    }

    /// Convert a raw row returned by the store into a row typed after
    /// this record type.
    ///
    /// The measurement field is read from `_measurement` when the row has
    /// no column of its own name. Tags the store dropped because they were
    /// empty come back as empty strings.
    pub fn hydrate(&self, raw: &Row) -> SchemaResult<Row> {
        let mut row = Row::new();

        for field in &self.fields {
            let value = match field.role {
                FieldRole::Measurement => raw
                    .get(&field.name)
                    .or_else(|| raw.get(MEASUREMENT_COLUMN)),
                _ => raw.get(&field.name),
            };

            let value = match (value, field.role) {
                (Some(v), _) => v,
                (None, FieldRole::Tag) => {
                    row.insert(field.name.clone(), Value::String(String::new()));
                    continue;
                }
                (None, _) => {
                    return Err(SchemaError::MissingValue {
                        record: self.name.clone(),
                        field: field.name.clone(),
                    })
                }
            };

            let typed = value
                .coerce(field.kind)
                .ok_or_else(|| SchemaError::InvalidValue {
                    field: field.name.clone(),
                    kind: field.kind,
                    value: value.to_string(),
                })?;
            row.insert(field.name.clone(), typed);
        }

        Ok(row)
    }
}

/// A Rust type stored as records of one record type
pub trait Record: Sized + Send + Sync + 'static {
    /// Record type name, used as bucket name
    const NAME: &'static str;

    /// Declared columns
    fn fields() -> Vec<FieldDef>;

    /// Validated descriptor for this type
    fn record_type() -> SchemaResult<RecordType> {
        RecordType::new(Self::NAME, Self::fields())
    }

    /// Column values of this instance
    fn to_row(&self) -> Row;

    /// Build an instance from a typed row
    fn from_row(row: &Row) -> SchemaResult<Self>;
}

/// A root declaration listing every record type reachable from it
pub trait Schema {
    /// Record types in declaration order
    fn record_types() -> SchemaResult<Vec<RecordType>>;
}

#[doc(hidden)]
pub fn read_field<T: FieldValue>(record: &str, row: &Row, name: &str) -> SchemaResult<T> {
    let value = row.get(name).ok_or_else(|| SchemaError::MissingValue {
        record: record.to_string(),
        field: name.to_string(),
    })?;

    value
        .coerce(T::KIND)
        .and_then(|v| T::from_value(&v))
        .ok_or_else(|| SchemaError::InvalidValue {
            field: name.to_string(),
            kind: T::KIND,
            value: value.to_string(),
        })
}

/// Declare a record struct together with its [`Record`] impl and one
/// [`MappedField`](crate::query::MappedField) accessor per column.
///
/// Each field names its role: `Measurement`, `Tag` or `Field`. `Debug`,
/// `Clone` and `PartialEq` are derived.
///
/// ```rust
/// aluminum::record! {
///     pub struct MockBucket {
///         pub measurement: i64 as Measurement,
///         pub tag: String as Tag,
///         pub field: i64 as Field,
///     }
/// }
///
/// let predicate = MockBucket::field().gt(15);
/// assert_eq!(predicate.to_string(), "field > 15");
/// ```
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $fvis:vis $field:ident : $fty:ty as $role:ident
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        $vis struct $name {
            $(
                $(#[$fmeta])*
                $fvis $field: $fty,
            )+
        }

        impl $crate::schema::Record for $name {
            const NAME: &'static str = stringify!($name);

            fn fields() -> ::std::vec::Vec<$crate::schema::FieldDef> {
                vec![
                    $(
                        $crate::schema::FieldDef::new(
                            stringify!($field),
                            <$fty as $crate::schema::FieldValue>::KIND,
                            $crate::schema::FieldRole::$role,
                        ),
                    )+
                ]
            }

            fn to_row(&self) -> $crate::schema::Row {
                let mut row = $crate::schema::Row::new();
                $(
                    row.insert(
                        stringify!($field).to_string(),
                        $crate::schema::FieldValue::into_value(
                            ::std::clone::Clone::clone(&self.$field),
                        ),
                    );
                )+
                row
            }

            fn from_row(row: &$crate::schema::Row) -> $crate::schema::SchemaResult<Self> {
                Ok(Self {
                    $(
                        $field: $crate::schema::read_field(
                            stringify!($name),
                            row,
                            stringify!($field),
                        )?,
                    )+
                })
            }
        }

        #[allow(dead_code)]
        impl $name {
            $(
                pub fn $field() -> $crate::query::MappedField<$fty> {
                    $crate::query::MappedField::new(stringify!($field))
                }
            )+
        }
    };
}

/// Declare a root type listing record types for bulk registration.
///
/// ```rust
/// aluminum::record! {
///     pub struct Cpu {
///         pub host: String as Tag,
///         pub usage: f64 as Field,
///     }
/// }
///
/// aluminum::schema!(pub Metrics { Cpu });
/// ```
#[macro_export]
macro_rules! schema {
    ($(#[$meta:meta])* $vis:vis $name:ident { $($record:ty),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default)]
        $vis struct $name;

        impl $crate::schema::Schema for $name {
            fn record_types(
            ) -> $crate::schema::SchemaResult<::std::vec::Vec<$crate::schema::RecordType>> {
                Ok(vec![
                    $( <$record as $crate::schema::Record>::record_type()?, )+
                ])
            }
        }
    };
}
