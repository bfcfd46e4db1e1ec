//! # Aluminum
//!
//! Typed records over an InfluxDB-style time-series store: declare record
//! types, derive bucket schemas from them, build typed queries, and read
//! results back as the declared types.
//!
//! ## Modules
//!
//! - [`schema`]: Record declarations, schema registry and schema derivation
//! - [`query`]: Predicates, select builder and the pipeline dialect
//! - [`transport`]: Store backends (HTTP and in-memory)
//! - [`store`] / [`bucket`]: The facade applications use
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use aluminum::{create_engine, select, Store};
//! use aluminum::transport::MemoryTransport;
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
//!     let engine = create_engine("http://localhost:8086", "token", "org-id");
//!     let store = Store::with_transport(engine, Arc::new(MemoryTransport::new()));
//!
//!     let bucket = store.create_bucket::<MockBucket>().await?;
//!     let record = MockBucket { measurement: 20, tag: "test tag".into(), field: 10 };
//!     bucket.add(&record).await?;
//!
//!     let found = bucket
//!         .execute(&select::<MockBucket>().and_where(MockBucket::field().lt(15)))
//!         .await?;
//!     assert_eq!(found, vec![record]);
//!
//!     Ok(())
//! }
//! ```

pub mod bucket;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod query;
pub mod schema;
pub mod store;
pub mod transport;

// Re-export top-level types for convenience
pub use bucket::Bucket;
pub use engine::{create_engine, Engine};
pub use error::{StoreError, StoreResult};
pub use store::Store;

pub use query::{select, MappedField, Operator, Predicate, QueryError, Select};

pub use schema::{
    derive_schema, BucketDescription, FieldKind, FieldRole, Record, RecordType, Schema,
    SchemaError, SchemaRegistry, Value,
};

pub use transport::{DataPoint, HttpTransport, MemoryTransport, Transport, TransportError};

pub use config::{Config, ConfigError, ConnectionConfig, LoggingConfig};
