//! Select query builder
//!
//! A [`Select`] targets exactly one record type and accumulates predicates.
//! Compiling it produces pipeline text in three phases written to one buffer:
//!
//! ```text
//! from(bucket: "MockBucket")                      bucket clause
//!  |> range(start: -1h)                            range clause
//!  |> filter(fn: (r) => r.field > "15")            one filter per predicate
//! ```
//!
//! Repeated `and_where` calls append; predicates are ANDed in the order they
//! were added.

use std::fmt::Write as _;
use std::marker::PhantomData;

use crate::schema::Record;

use super::ast::Predicate;
use super::error::QueryResult;
use super::range::RelativeRange;

/// Structured form of a select: bucket, range and predicates
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    /// Source bucket (record type name)
    pub bucket: String,
    /// Range start relative to now
    pub range: RelativeRange,
    /// Conjunctive predicates in accumulation order
    pub predicates: Vec<Predicate>,
}

impl QueryPlan {
    /// Plan over a bucket with the default range and no predicates
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            range: RelativeRange::default(),
            predicates: Vec::new(),
        }
    }

    /// Compile to pipeline text
    pub fn to_flux(&self) -> String {
        let mut buf = String::with_capacity(64 + self.predicates.len() * 48);
        self.write_bucket_clause(&mut buf);
        self.write_range_clause(&mut buf);
        self.write_filter_clause(&mut buf);
        buf
    }

    fn write_bucket_clause(&self, buf: &mut String) {
        let _ = write!(buf, "from(bucket: \"{}\")", escape_literal(&self.bucket));
    }

    fn write_range_clause(&self, buf: &mut String) {
        let _ = write!(buf, " |> range(start: {})", self.range);
    }

    fn write_filter_clause(&self, buf: &mut String) {
        for predicate in &self.predicates {
            let _ = write!(
                buf,
                " |> filter(fn: (r) => r.{} {} \"{}\")",
                predicate.column(),
                predicate.operator().symbol(),
                escape_literal(&predicate.value().to_string())
            );
        }
    }
}

/// Escape a string for use inside a double-quoted literal
pub(crate) fn escape_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out
}

/// Query builder over record type `T`
pub struct Select<T> {
    plan: QueryPlan,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Select<T> {
    fn clone(&self) -> Self {
        Self {
            plan: self.plan.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for Select<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Select").field("plan", &self.plan).finish()
    }
}

/// Start a select over record type `T`
pub fn select<T: Record>() -> Select<T> {
    Select::new()
}

impl<T: Record> Select<T> {
    pub fn new() -> Self {
        Self {
            plan: QueryPlan::new(T::NAME),
            _marker: PhantomData,
        }
    }

    /// Add one predicate
    pub fn and_where(mut self, predicate: Predicate) -> Self {
        self.plan.predicates.push(predicate);
        self
    }

    /// Add several predicates
    pub fn and_where_all<I>(mut self, predicates: I) -> Self
    where
        I: IntoIterator<Item = Predicate>,
    {
        self.plan.predicates.extend(predicates);
        self
    }

    /// Override the default `-1h` range start
    pub fn with_range(mut self, start: &str) -> QueryResult<Self> {
        self.plan.range = RelativeRange::parse(start)?;
        Ok(self)
    }

    /// Source bucket name
    pub fn bucket(&self) -> &str {
        &self.plan.bucket
    }

    /// Accumulated predicates
    pub fn predicates(&self) -> &[Predicate] {
        &self.plan.predicates
    }

    pub fn range(&self) -> RelativeRange {
        self.plan.range
    }

    /// Structured form of this select
    pub fn plan(&self) -> &QueryPlan {
        &self.plan
    }

    /// Compile to pipeline text
    pub fn compile(&self) -> String {
        self.plan.to_flux()
    }
}

impl<T: Record> Default for Select<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Operator;
    use crate::schema::{FieldKind, Value};

    crate::record! {
        pub struct MockBucket {
            pub measurement: i64 as Measurement,
            pub tag: String as Tag,
            pub field: i64 as Field,
        }
    }

    #[test]
    fn test_compile_without_predicates() {
        let query = select::<MockBucket>().compile();
        assert_eq!(query, "from(bucket: \"MockBucket\") |> range(start: -1h)");
    }

    #[test]
    fn test_compile_single_predicate() {
        let query = select::<MockBucket>()
            .and_where(MockBucket::field().gt(15))
            .compile();
        assert_eq!(
            query,
            "from(bucket: \"MockBucket\") |> range(start: -1h) \
             |> filter(fn: (r) => r.field > \"15\")"
        );
    }

    #[test]
    fn test_every_operator_symbol() {
        let stmt = select::<MockBucket>().and_where_all([
            MockBucket::field().lt(1),
            MockBucket::field().le(2),
            MockBucket::field().gt(3),
            MockBucket::field().ge(4),
            MockBucket::tag().equals("a"),
            MockBucket::tag().not_equals("b"),
        ]);
        assert_eq!(
            stmt.compile(),
            "from(bucket: \"MockBucket\") |> range(start: -1h) \
             |> filter(fn: (r) => r.field < \"1\") \
             |> filter(fn: (r) => r.field <= \"2\") \
             |> filter(fn: (r) => r.field > \"3\") \
             |> filter(fn: (r) => r.field >= \"4\") \
             |> filter(fn: (r) => r.tag = \"a\") \
             |> filter(fn: (r) => r.tag != \"b\")"
        );
    }

    #[test]
    fn test_where_accumulates() {
        let stmt = select::<MockBucket>()
            .and_where(MockBucket::field().gt(15))
            .and_where(MockBucket::tag().equals("test tag"));

        assert_eq!(stmt.predicates().len(), 2);
        assert_eq!(stmt.predicates()[0].operator(), Operator::Gt);
        assert_eq!(stmt.predicates()[1].column(), "tag");
    }

    #[test]
    fn test_compile_is_deterministic() {
        let stmt = select::<MockBucket>()
            .and_where(MockBucket::field().gt(15))
            .and_where(MockBucket::tag().equals("test tag"));
        assert_eq!(stmt.compile(), stmt.compile());
        assert_eq!(stmt.compile(), stmt.clone().compile());
    }

    #[test]
    fn test_custom_range() {
        let stmt = select::<MockBucket>().with_range("-30m").unwrap();
        assert_eq!(
            stmt.compile(),
            "from(bucket: \"MockBucket\") |> range(start: -30m)"
        );
        assert!(select::<MockBucket>().with_range("yesterday").is_err());
    }

    #[test]
    fn test_string_literal_escaping() {
        let stmt = select::<MockBucket>().and_where(Predicate::new(
            "tag",
            FieldKind::String,
            Operator::Eq,
            Value::from("say \"hi\""),
        ));
        assert!(stmt
            .compile()
            .ends_with("|> filter(fn: (r) => r.tag = \"say \\\"hi\\\"\")"));
    }
}
