//! Store Transport
//!
//! The boundary between the record layer and a time-series store:
//! - **HTTP**: InfluxDB v2 HTTP API (line protocol writes, pipeline queries)
//! - **Memory**: In-process store that evaluates the pipeline dialect
//!
//! Everything above this module talks to a `dyn Transport`; nothing here
//! knows about record types beyond the rows and schemas passed in.

mod flux_csv;
mod http;
mod line_protocol;
mod memory;

pub use http::HttpTransport;
pub use line_protocol::{to_line, to_lines};
pub use memory::MemoryTransport;

use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::query::QueryPlan;
use crate::schema::{BucketSchema, FieldRole, RecordType, Row, Value};

/// Common trait for store backends
#[async_trait]
pub trait Transport: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &str;

    /// Check that the store is reachable and accepts our credentials
    async fn ping(&self) -> Result<bool, TransportError>;

    /// Write a batch of points into a bucket
    async fn write(&self, bucket: &str, points: &[DataPoint]) -> Result<bool, TransportError>;

    /// Run literal query text
    async fn query_raw(&self, bucket: &str, query: &str) -> Result<QueryOutput, TransportError>;

    /// Run a structured query.
    ///
    /// Backends without a structured path compile the plan and run it as text.
    async fn query(&self, plan: &QueryPlan) -> Result<QueryOutput, TransportError> {
        self.query_raw(&plan.bucket, &plan.to_flux()).await
    }

    /// Create a bucket; creating one that already exists is a no-op
    async fn create_bucket(&self, name: &str, schema: &BucketSchema) -> Result<(), TransportError>;

    /// Delete a bucket; `false` when it did not exist
    async fn delete_bucket(&self, name: &str) -> Result<bool, TransportError>;

    /// Every bucket visible to this connection
    async fn list_buckets(&self) -> Result<Vec<RemoteBucket>, TransportError>;
}

/// One point as written to the store
#[derive(Debug, Clone, PartialEq)]
pub struct DataPoint {
    /// Measurement name
    pub measurement: String,
    /// Indexed string columns
    pub tags: BTreeMap<String, String>,
    /// Value columns
    pub fields: BTreeMap<String, Value>,
    /// Unix timestamp in nanoseconds; the store assigns one when absent
    pub timestamp: Option<i64>,
}

impl DataPoint {
    pub fn new(measurement: impl Into<String>) -> Self {
        Self {
            measurement: measurement.into(),
            tags: BTreeMap::new(),
            fields: BTreeMap::new(),
            timestamp: None,
        }
    }

    /// Add a tag (builder pattern)
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Add a field (builder pattern)
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Set the timestamp (builder pattern)
    pub fn at(mut self, nanos: i64) -> Self {
        self.timestamp = Some(nanos);
        self
    }

    /// Lay out a record row as a point.
    ///
    /// The measurement field's value names the measurement; without one the
    /// record type name does. Empty tags are left out, since the store
    /// cannot hold them.
    pub fn from_row(record: &RecordType, row: &Row, timestamp: Option<i64>) -> Self {
        let mut point = Self::new(record.name());
        point.timestamp = timestamp;

        for field in record.fields() {
            let Some(value) = row.get(&field.name) else {
                continue;
            };
            match field.role {
                FieldRole::Measurement => point.measurement = value.to_string(),
                FieldRole::Tag => {
                    let tag = value.to_string();
                    if !tag.is_empty() {
                        point.tags.insert(field.name.clone(), tag);
                    }
                }
                FieldRole::Field => {
                    point.fields.insert(field.name.clone(), value.clone());
                }
            }
        }

        point
    }
}

/// Rows returned by a query, labelled with the bucket they came from
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryOutput {
    pub name: String,
    pub rows: Vec<Row>,
}

/// A bucket as listed by the store
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteBucket {
    pub name: String,
    /// Schema recorded when the bucket was created, if any
    pub schema: Option<BucketSchema>,
}

/// Errors that can occur when talking to the store
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Decode error: {0}")]
    Decode(String),
}

impl TransportError {
    /// Whether the failure means the store could not be reached or refused us
    pub fn is_connection(&self) -> bool {
        match self {
            Self::Unavailable(_) | Self::Timeout | Self::Unauthorized(_) => true,
            Self::Request(e) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Record;

    crate::record! {
        pub struct MockBucket {
            pub measurement: i64 as Measurement,
            pub tag: String as Tag,
            pub field: i64 as Field,
        }
    }

    #[test]
    fn test_point_from_row() {
        let record = MockBucket {
            measurement: 20,
            tag: "test tag".into(),
            field: 10,
        };
        let point =
            DataPoint::from_row(&MockBucket::record_type().unwrap(), &record.to_row(), Some(7));

        assert_eq!(
            point,
            DataPoint::new("20")
                .tag("tag", "test tag")
                .field("field", 10i64)
                .at(7)
        );
    }

    #[test]
    fn test_point_skips_empty_tags() {
        let record = MockBucket {
            measurement: 1,
            tag: String::new(),
            field: 2,
        };
        let point = DataPoint::from_row(&MockBucket::record_type().unwrap(), &record.to_row(), None);
        assert!(point.tags.is_empty());
        assert_eq!(point.timestamp, None);
    }

    #[test]
    fn test_point_without_measurement_field() {
        let rt = RecordType::new(
            "Cpu",
            vec![crate::schema::FieldDef::new(
                "usage",
                crate::schema::FieldKind::Number,
                FieldRole::Field,
            )],
        )
        .unwrap();
        let mut row = Row::new();
        row.insert("usage".into(), Value::Float(0.5));

        let point = DataPoint::from_row(&rt, &row, None);
        assert_eq!(point.measurement, "Cpu");
        assert_eq!(point.fields.get("usage"), Some(&Value::Float(0.5)));
    }

    #[test]
    fn test_connection_classification() {
        assert!(TransportError::Timeout.is_connection());
        assert!(TransportError::Unavailable("down".into()).is_connection());
        assert!(TransportError::Unauthorized("bad token".into()).is_connection());
        assert!(!TransportError::Api {
            status: 400,
            message: "bad".into()
        }
        .is_connection());
        assert!(!TransportError::Decode("x".into()).is_connection());
    }
}
