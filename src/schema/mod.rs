//! Aluminum Schema Layer
//!
//! Record type declarations and the catalog that maps names back to them:
//!
//! - **types**: Field kinds, roles and dynamic values
//! - **record**: `Record` / `Schema` traits, `RecordType` and the declaration macros
//! - **derive**: Wire schema derivation (`{name, meta: {schema}}`)
//! - **registry**: Lock-guarded catalog of registered record types
//! - **error**: Error types
//!
//! # Example
//!
//! ```rust
//! use aluminum::schema::SchemaRegistry;
//!
//! aluminum::record! {
//!     pub struct MockBucket {
//!         pub measurement: i64 as Measurement,
//!         pub tag: String as Tag,
//!         pub field: i64 as Field,
//!     }
//! }
//!
//! let registry = SchemaRegistry::new();
//! registry.register_record::<MockBucket>().unwrap();
//!
//! let schema = registry.resolve("MockBucket").unwrap().schema();
//! assert_eq!(schema.fields.len(), 3);
//! ```

mod derive;
mod error;
mod record;
mod registry;
mod types;

pub use derive::{derive_schema, BucketDescription, BucketMeta, BucketSchema, FieldSchema};
pub use error::{SchemaError, SchemaResult};
#[doc(hidden)]
pub use record::read_field;
pub use record::{Record, RecordType, Schema, MEASUREMENT_COLUMN, TIME_COLUMN};
pub use registry::SchemaRegistry;
pub use types::{FieldDef, FieldKind, FieldRole, FieldValue, Row, Value};
