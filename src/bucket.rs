//! Bucket handle
//!
//! A [`Bucket`] is a typed proxy to the store's bucket of the same name. It
//! holds no data: writes are forwarded to the transport, and query results
//! are resolved against the schema registry and rehydrated into `T`.

use chrono::Utc;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{StoreError, StoreResult};
use crate::query::Select;
use crate::schema::{BucketDescription, Record, RecordType, SchemaRegistry};
use crate::transport::{DataPoint, QueryOutput, Transport};

/// Typed handle to one remote bucket
pub struct Bucket<T> {
    record_type: RecordType,
    transport: Arc<dyn Transport>,
    registry: Arc<SchemaRegistry>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Bucket<T> {
    fn clone(&self) -> Self {
        Self {
            record_type: self.record_type.clone(),
            transport: Arc::clone(&self.transport),
            registry: Arc::clone(&self.registry),
            _marker: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for Bucket<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bucket")
            .field("name", &self.record_type.name())
            .field("transport", &self.transport.name())
            .finish()
    }
}

impl<T: Record> Bucket<T> {
    pub(crate) fn new(
        record_type: RecordType,
        transport: Arc<dyn Transport>,
        registry: Arc<SchemaRegistry>,
    ) -> Self {
        Self {
            record_type,
            transport,
            registry,
            _marker: PhantomData,
        }
    }

    /// Bucket name (the record type name)
    pub fn name(&self) -> &str {
        self.record_type.name()
    }

    pub fn record_type(&self) -> &RecordType {
        &self.record_type
    }

    /// Insert one record
    pub async fn add(&self, record: &T) -> StoreResult<bool> {
        self.add_all(std::slice::from_ref(record)).await
    }

    /// Insert a batch of records in one write.
    ///
    /// Points get consecutive nanosecond timestamps so records of the same
    /// series do not overwrite each other.
    pub async fn add_all(&self, records: &[T]) -> StoreResult<bool> {
        let now = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let points: Vec<DataPoint> = records
            .iter()
            .enumerate()
            .map(|(i, record)| {
                DataPoint::from_row(
                    &self.record_type,
                    &record.to_row(),
                    Some(now.saturating_add(i as i64)),
                )
            })
            .collect();

        Ok(self.transport.write(self.name(), &points).await?)
    }

    /// Identity and derived schema: `{name, meta: {schema}}`
    pub fn to_dict(&self) -> BucketDescription {
        self.record_type.schema().describe()
    }

    /// [`to_dict`](Self::to_dict) as JSON
    pub fn to_json(&self) -> StoreResult<serde_json::Value> {
        serde_json::to_value(self.to_dict()).map_err(|e| StoreError::Decode(e.to_string()))
    }

    /// Run literal query text and rehydrate the results
    pub async fn raw_query(&self, query: &str) -> StoreResult<Vec<T>> {
        let output = self.transport.query_raw(self.name(), query).await?;
        self.hydrate(output)
    }

    /// Compile a select and run it as text
    pub async fn execute(&self, select: &Select<T>) -> StoreResult<Vec<T>> {
        let query = select.compile();
        tracing::debug!(bucket = %self.name(), %query, "Executing select");
        self.raw_query(&query).await
    }

    /// Run a select through the transport's structured query path
    pub async fn query(&self, select: &Select<T>) -> StoreResult<Vec<T>> {
        let output = self.transport.query(select.plan()).await?;
        self.hydrate(output)
    }

    fn hydrate(&self, output: QueryOutput) -> StoreResult<Vec<T>> {
        let record_type = self.registry.resolve(&output.name)?;
        if record_type.name() != T::NAME {
            return Err(StoreError::TypeMismatch {
                expected: T::NAME.to_string(),
                found: record_type.name().to_string(),
            });
        }

        output
            .rows
            .iter()
            .map(|raw| -> StoreResult<T> {
                let row = record_type.hydrate(raw)?;
                Ok(T::from_row(&row)?)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::select;
    use crate::schema::{FieldKind, Value};
    use crate::transport::MemoryTransport;

    crate::record! {
        pub struct MockBucket {
            pub measurement: i64 as Measurement,
            pub tag: String as Tag,
            pub field: i64 as Field,
        }
    }

    crate::record! {
        pub struct Other {
            pub value: f64 as Field,
        }
    }

    async fn bucket() -> Bucket<MockBucket> {
        let transport = Arc::new(MemoryTransport::new());
        let registry = Arc::new(SchemaRegistry::new());
        let record_type = MockBucket::record_type().unwrap();
        registry.register(record_type.clone()).unwrap();
        transport
            .create_bucket(MockBucket::NAME, &record_type.schema())
            .await
            .unwrap();
        Bucket::new(record_type, transport, registry)
    }

    fn sample(field: i64) -> MockBucket {
        MockBucket {
            measurement: 20,
            tag: "test tag".into(),
            field,
        }
    }

    #[test]
    fn test_to_dict_shape() {
        let record_type = MockBucket::record_type().unwrap();
        let bucket: Bucket<MockBucket> = Bucket::new(
            record_type,
            Arc::new(MemoryTransport::new()),
            Arc::new(SchemaRegistry::new()),
        );

        assert_eq!(
            bucket.to_json().unwrap(),
            serde_json::json!({
                "name": "MockBucket",
                "meta": {"schema": {
                    "field": {"type": "integer"},
                    "measurement": {"type": "integer"},
                    "tag": {"type": "string"}
                }}
            })
        );
        assert_eq!(
            bucket.to_dict().meta.schema.get("tag").map(|f| f.kind),
            Some(FieldKind::String)
        );
    }

    #[tokio::test]
    async fn test_add_then_execute_round_trip() {
        let bucket = bucket().await;
        assert!(bucket.add(&sample(10)).await.unwrap());

        let found = bucket
            .execute(&select::<MockBucket>().and_where(MockBucket::field().gt(5)))
            .await
            .unwrap();
        assert_eq!(found, vec![sample(10)]);

        let structured = bucket
            .query(&select::<MockBucket>().and_where(MockBucket::field().gt(5)))
            .await
            .unwrap();
        assert_eq!(structured, found);
    }

    #[tokio::test]
    async fn test_add_all_keeps_every_record() {
        let bucket = bucket().await;
        bucket
            .add_all(&[sample(1), sample(2), sample(3)])
            .await
            .unwrap();

        let all = bucket.execute(&select::<MockBucket>()).await.unwrap();
        assert_eq!(all.len(), 3);

        let none = bucket
            .execute(&select::<MockBucket>().and_where(MockBucket::field().gt(3)))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_empty_tag_round_trips() {
        let bucket = bucket().await;
        let record = MockBucket {
            measurement: 1,
            tag: String::new(),
            field: 2,
        };
        bucket.add(&record).await.unwrap();

        let found = bucket.execute(&select::<MockBucket>()).await.unwrap();
        assert_eq!(found, vec![record]);
    }

    #[tokio::test]
    async fn test_unregistered_result_name() {
        let transport = Arc::new(MemoryTransport::new());
        let record_type = MockBucket::record_type().unwrap();
        transport
            .create_bucket(MockBucket::NAME, &record_type.schema())
            .await
            .unwrap();
        let bucket: Bucket<MockBucket> =
            Bucket::new(record_type, transport, Arc::new(SchemaRegistry::new()));

        let err = bucket
            .raw_query("from(bucket: \"MockBucket\") |> range(start: -1h)")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(ref name) if name == "MockBucket"));
    }

    #[tokio::test]
    async fn test_results_of_another_type() {
        let bucket = bucket().await;
        let other = Other::record_type().unwrap();
        bucket.registry.register(other.clone()).unwrap();
        bucket
            .transport
            .create_bucket(Other::NAME, &other.schema())
            .await
            .unwrap();

        let err = bucket
            .raw_query("from(bucket: \"Other\")")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::TypeMismatch { ref expected, ref found }
                if expected == "MockBucket" && found == "Other"
        ));
    }

    #[tokio::test]
    async fn test_invalid_stored_value() {
        let bucket = bucket().await;
        bucket
            .transport
            .write(
                MockBucket::NAME,
                &[DataPoint::new("20").field("field", Value::from("ten"))],
            )
            .await
            .unwrap();

        let err = bucket.execute(&select::<MockBucket>()).await.unwrap_err();
        assert!(matches!(err, StoreError::Schema(_)));
    }
}
