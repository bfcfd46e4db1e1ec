//! Store facade
//!
//! Entry point for applications. A [`Store`] owns the schema registry and
//! the transport, and hands out typed [`Bucket`] handles:
//!
//! ```rust,no_run
//! use aluminum::{create_engine, select, Store};
//!
//! aluminum::record! {
//!     pub struct MockBucket {
//!         pub measurement: i64 as Measurement,
//!         pub tag: String as Tag,
//!         pub field: i64 as Field,
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Store::new(create_engine("http://localhost:8086", "token", "org-id"))?;
//!     store.healthy().await?;
//!
//!     let bucket = store.create_bucket::<MockBucket>().await?;
//!     bucket
//!         .add(&MockBucket { measurement: 20, tag: "test tag".into(), field: 10 })
//!         .await?;
//!
//!     let found = bucket
//!         .execute(&select::<MockBucket>().and_where(MockBucket::field().gt(5)))
//!         .await?;
//!     println!("{:?}", found);
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use crate::bucket::Bucket;
use crate::engine::Engine;
use crate::error::StoreResult;
use crate::schema::{BucketDescription, BucketSchema, Record, Schema, SchemaRegistry};
use crate::transport::{HttpTransport, Transport};

/// Prefix of buckets the store keeps for itself
const SYSTEM_BUCKET_PREFIX: char = '_';

/// Connection to one store plus the local schema registry
pub struct Store {
    engine: Engine,
    transport: Arc<dyn Transport>,
    registry: Arc<SchemaRegistry>,
}

impl Store {
    /// Connect over HTTP
    pub fn new(engine: Engine) -> StoreResult<Self> {
        let transport = HttpTransport::new(&engine)?;
        Ok(Self::with_transport(engine, Arc::new(transport)))
    }

    /// Use an existing transport
    pub fn with_transport(engine: Engine, transport: Arc<dyn Transport>) -> Self {
        Self {
            engine,
            transport,
            registry: Arc::new(SchemaRegistry::new()),
        }
    }

    /// Share a registry with other stores (builder pattern)
    pub fn with_registry(mut self, registry: Arc<SchemaRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Check the store is reachable and accepts the engine's credentials.
    ///
    /// Unreachable hosts and rejected tokens or organizations are
    /// [`StoreError::Connection`](crate::StoreError::Connection).
    pub async fn healthy(&self) -> StoreResult<bool> {
        let healthy = self.transport.ping().await?;
        tracing::debug!(host = %self.engine.host, healthy, "Health check");
        Ok(healthy)
    }

    /// Register `T` locally without touching the store
    pub fn register<T: Record>(&self) -> StoreResult<bool> {
        Ok(self.registry.register_record::<T>()?)
    }

    /// Register every record type listed by `S`
    pub fn collect<S: Schema>(&self) -> StoreResult<usize> {
        let added = self.registry.collect::<S>()?;
        tracing::debug!(added, "Collected record types");
        Ok(added)
    }

    /// Create the bucket for `T`, or bind to it if it already exists
    pub async fn create_bucket<T: Record>(&self) -> StoreResult<Bucket<T>> {
        let record_type = T::record_type()?;
        self.registry.register(record_type.clone())?;

        if self.bucket_exists(T::NAME).await? {
            tracing::debug!(bucket = T::NAME, "Bucket already exists");
        } else {
            self.transport
                .create_bucket(T::NAME, &record_type.schema())
                .await?;
            tracing::info!(bucket = T::NAME, "Created bucket");
        }

        Ok(Bucket::new(
            record_type,
            Arc::clone(&self.transport),
            Arc::clone(&self.registry),
        ))
    }

    /// The bucket for `T`, or `None` when the store has no such bucket
    pub async fn get_bucket<T: Record>(&self) -> StoreResult<Option<Bucket<T>>> {
        if !self.bucket_exists(T::NAME).await? {
            return Ok(None);
        }

        let record_type = T::record_type()?;
        self.registry.register(record_type.clone())?;
        Ok(Some(Bucket::new(
            record_type,
            Arc::clone(&self.transport),
            Arc::clone(&self.registry),
        )))
    }

    /// Describe every user bucket, sorted by name.
    ///
    /// Schemas come from the local registry when the type is registered and
    /// from the store's record of the bucket otherwise.
    pub async fn get_buckets(&self) -> StoreResult<Vec<BucketDescription>> {
        let mut descriptions: Vec<BucketDescription> = self
            .transport
            .list_buckets()
            .await?
            .into_iter()
            .filter(|b| !b.name.starts_with(SYSTEM_BUCKET_PREFIX))
            .map(|remote| {
                let schema = match self.registry.resolve(&remote.name) {
                    Ok(record_type) => record_type.schema(),
                    Err(_) => remote
                        .schema
                        .unwrap_or_else(|| BucketSchema::empty(remote.name.clone())),
                };
                BucketDescription {
                    name: remote.name,
                    meta: schema.describe().meta,
                }
            })
            .collect();

        descriptions.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(descriptions)
    }

    /// Delete the bucket for `T`; `false` when it did not exist
    pub async fn delete_bucket<T: Record>(&self) -> StoreResult<bool> {
        let deleted = self.transport.delete_bucket(T::NAME).await?;
        if deleted {
            tracing::info!(bucket = T::NAME, "Deleted bucket");
        }
        Ok(deleted)
    }

    async fn bucket_exists(&self, name: &str) -> StoreResult<bool> {
        Ok(self
            .transport
            .list_buckets()
            .await?
            .iter()
            .any(|b| b.name == name))
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("engine", &self.engine)
            .field("transport", &self.transport.name())
            .field("registered", &self.registry.len())
            .finish()
    }
}
