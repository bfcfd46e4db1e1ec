//! In-process transport
//!
//! Keeps buckets in memory and evaluates the pipeline dialect itself:
//! textual queries go through [`parse_pipeline`], structured ones are
//! evaluated directly. Rows are stored with typed values, so filters compare
//! numerically where the column is numeric.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::query::{parse_pipeline, QueryPlan};
use crate::schema::{BucketSchema, Row, Value, MEASUREMENT_COLUMN, TIME_COLUMN};

use super::{DataPoint, QueryOutput, RemoteBucket, Transport, TransportError};

#[derive(Debug)]
struct MemoryBucket {
    schema: BucketSchema,
    rows: Vec<Row>,
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryTransport {
    buckets: RwLock<HashMap<String, MemoryBucket>>,
    unreachable: bool,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport whose every call fails as if the host were down
    pub fn unreachable() -> Self {
        Self {
            buckets: RwLock::new(HashMap::new()),
            unreachable: true,
        }
    }

    fn reachable(&self) -> Result<(), TransportError> {
        if self.unreachable {
            Err(TransportError::Unavailable("memory transport is offline".into()))
        } else {
            Ok(())
        }
    }

    /// Number of rows held by a bucket
    pub async fn row_count(&self, bucket: &str) -> usize {
        self.buckets
            .read()
            .await
            .get(bucket)
            .map_or(0, |b| b.rows.len())
    }

    async fn evaluate(&self, plan: &QueryPlan) -> Result<QueryOutput, TransportError> {
        let buckets = self.buckets.read().await;
        let bucket = buckets.get(&plan.bucket).ok_or_else(|| TransportError::Api {
            status: 404,
            message: format!("bucket \"{}\" not found", plan.bucket),
        })?;

        let now = Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX);
        let start = plan.range.start_nanos(now);
        let measurement_column = bucket.schema.measurement_column();

        let rows = bucket
            .rows
            .iter()
            .filter(|row| match row.get(TIME_COLUMN) {
                Some(Value::Integer(t)) => *t >= start && *t <= now,
                _ => false,
            })
            .filter(|row| {
                plan.predicates.iter().all(|p| {
                    let column = if Some(p.column()) == measurement_column {
                        MEASUREMENT_COLUMN
                    } else {
                        p.column()
                    };
                    row.get(column).map_or(false, |v| p.matches(v))
                })
            })
            .cloned()
            .collect();

        Ok(QueryOutput {
            name: plan.bucket.clone(),
            rows,
        })
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    fn name(&self) -> &str {
        "memory"
    }

    async fn ping(&self) -> Result<bool, TransportError> {
        self.reachable()?;
        Ok(true)
    }

    async fn write(&self, bucket: &str, points: &[DataPoint]) -> Result<bool, TransportError> {
        self.reachable()?;
        let mut buckets = self.buckets.write().await;
        let target = buckets.get_mut(bucket).ok_or_else(|| TransportError::Api {
            status: 404,
            message: format!("bucket \"{}\" not found", bucket),
        })?;

        let now = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        for point in points {
            let mut row = Row::new();
            row.insert(
                MEASUREMENT_COLUMN.to_string(),
                Value::String(point.measurement.clone()),
            );
            row.insert(
                TIME_COLUMN.to_string(),
                Value::Integer(point.timestamp.unwrap_or(now)),
            );
            for (key, value) in &point.tags {
                row.insert(key.clone(), Value::String(value.clone()));
            }
            for (key, value) in &point.fields {
                row.insert(key.clone(), value.clone());
            }
            target.rows.push(row);
        }

        tracing::debug!(bucket, points = points.len(), "Stored points in memory");
        Ok(true)
    }

    async fn query_raw(&self, bucket: &str, query: &str) -> Result<QueryOutput, TransportError> {
        self.reachable()?;
        let pipeline = parse_pipeline(query).map_err(|e| TransportError::Api {
            status: 400,
            message: e.to_string(),
        })?;

        let schema = {
            let buckets = self.buckets.read().await;
            buckets.get(&pipeline.bucket).map(|b| b.schema.clone())
        };
        let plan = match schema {
            Some(schema) => pipeline.to_plan(|column| schema.kind_of(column)),
            None => pipeline.to_plan(|_| None),
        };

        if plan.bucket != bucket {
            tracing::debug!(requested = bucket, queried = %plan.bucket, "Query names another bucket");
        }
        self.evaluate(&plan).await
    }

    async fn query(&self, plan: &QueryPlan) -> Result<QueryOutput, TransportError> {
        self.reachable()?;
        self.evaluate(plan).await
    }

    async fn create_bucket(&self, name: &str, schema: &BucketSchema) -> Result<(), TransportError> {
        self.reachable()?;
        let mut buckets = self.buckets.write().await;
        buckets.entry(name.to_string()).or_insert_with(|| MemoryBucket {
            schema: schema.clone(),
            rows: Vec::new(),
        });
        Ok(())
    }

    async fn delete_bucket(&self, name: &str) -> Result<bool, TransportError> {
        self.reachable()?;
        Ok(self.buckets.write().await.remove(name).is_some())
    }

    async fn list_buckets(&self) -> Result<Vec<RemoteBucket>, TransportError> {
        self.reachable()?;
        Ok(self
            .buckets
            .read()
            .await
            .iter()
            .map(|(name, bucket)| RemoteBucket {
                name: name.clone(),
                schema: Some(bucket.schema.clone()),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Operator, Predicate};
    use crate::schema::{FieldKind, Record};

    crate::record! {
        pub struct MockBucket {
            pub measurement: i64 as Measurement,
            pub tag: String as Tag,
            pub field: i64 as Field,
        }
    }

    async fn seeded() -> MemoryTransport {
        let transport = MemoryTransport::new();
        let schema = MockBucket::record_type().unwrap().schema();
        transport.create_bucket("MockBucket", &schema).await.unwrap();
        transport
            .write(
                "MockBucket",
                &[
                    DataPoint::new("20").tag("tag", "a").field("field", 10i64),
                    DataPoint::new("30").tag("tag", "b").field("field", 40i64),
                ],
            )
            .await
            .unwrap();
        transport
    }

    #[tokio::test]
    async fn test_textual_query_compares_numerically() {
        let transport = seeded().await;
        let out = transport
            .query_raw(
                "MockBucket",
                "from(bucket: \"MockBucket\") |> range(start: -1h) \
                 |> filter(fn: (r) => r.field > \"9\")",
            )
            .await
            .unwrap();
        assert_eq!(out.name, "MockBucket");
        assert_eq!(out.rows.len(), 2);
    }

    #[tokio::test]
    async fn test_measurement_filter_uses_measurement_column() {
        let transport = seeded().await;
        let mut plan = QueryPlan::new("MockBucket");
        plan.predicates.push(Predicate::new(
            "measurement",
            FieldKind::Integer,
            Operator::Ge,
            Value::Integer(25),
        ));

        let out = transport.query(&plan).await.unwrap();
        assert_eq!(out.rows.len(), 1);
        assert_eq!(out.rows[0].get("tag"), Some(&Value::String("b".into())));
    }

    #[tokio::test]
    async fn test_range_excludes_old_points() {
        let transport = seeded().await;
        let old = Utc::now().timestamp_nanos_opt().unwrap() - 2 * 3_600_000_000_000;
        transport
            .write(
                "MockBucket",
                &[DataPoint::new("1").field("field", 1i64).at(old)],
            )
            .await
            .unwrap();

        assert_eq!(transport.row_count("MockBucket").await, 3);
        let out = transport.query(&QueryPlan::new("MockBucket")).await.unwrap();
        assert_eq!(out.rows.len(), 2);
    }

    #[tokio::test]
    async fn test_bucket_lifecycle() {
        let transport = MemoryTransport::new();
        let schema = BucketSchema::empty("A");
        transport.create_bucket("A", &schema).await.unwrap();
        transport.create_bucket("A", &schema).await.unwrap();
        assert_eq!(transport.list_buckets().await.unwrap().len(), 1);

        assert!(transport.delete_bucket("A").await.unwrap());
        assert!(!transport.delete_bucket("A").await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_bucket() {
        let transport = MemoryTransport::new();
        let err = transport
            .write("nope", &[DataPoint::new("m").field("v", 1i64)])
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Api { status: 404, .. }));

        let err = transport
            .query_raw("nope", "from(bucket: \"nope\")")
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Api { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_unparseable_query() {
        let transport = seeded().await;
        let err = transport
            .query_raw("MockBucket", "SELECT * FROM MockBucket")
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Api { status: 400, .. }));
    }

    #[tokio::test]
    async fn test_unreachable() {
        let transport = MemoryTransport::unreachable();
        let err = transport.ping().await.unwrap_err();
        assert!(err.is_connection());
        assert!(transport.list_buckets().await.is_err());
    }
}
