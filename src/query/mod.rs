//! Aluminum Query Builder
//!
//! Typed predicates and select statements that compile to the store's
//! pipeline query language:
//!
//! - **AST**: Operators and predicate nodes
//! - **Mapped**: Typed column references that build predicates
//! - **Select**: Query builder and compiler
//! - **Range**: Relative range clause
//! - **Parser**: Parse pipeline text back into a query plan
//!
//! # Query Language
//!
//! ```text
//! from(bucket: "<name>") |> range(start: -1h) |> filter(fn: (r) => r.<field> <op> "<value>") [|> filter(...) ...]
//! ```
//!
//! # Example
//!
//! ```rust
//! use aluminum::query::select;
//!
//! aluminum::record! {
//!     pub struct MockBucket {
//!         pub measurement: i64 as Measurement,
//!         pub tag: String as Tag,
//!         pub field: i64 as Field,
//!     }
//! }
//!
//! let stmt = select::<MockBucket>().and_where(MockBucket::field().gt(15));
//! assert_eq!(
//!     stmt.compile(),
//!     r#"from(bucket: "MockBucket") |> range(start: -1h) |> filter(fn: (r) => r.field > "15")"#
//! );
//! ```

mod ast;
mod error;
mod mapped;
mod parser;
mod range;
mod select;

pub use ast::{Operator, Predicate};
pub use error::{QueryError, QueryResult};
pub use mapped::MappedField;
pub use parser::{parse_pipeline, FluxFilter, FluxPipeline};
pub use range::{DurationUnit, RelativeRange};
pub use select::{select, QueryPlan, Select};
