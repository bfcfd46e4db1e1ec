//! Predicate expression nodes
//!
//! A [`Predicate`] is an immutable `column <op> literal` triple. Predicates are
//! built through [`MappedField`](super::MappedField) and never evaluated in
//! process by the query builder.

use std::cmp::Ordering;

use crate::schema::{FieldKind, Value};

use super::error::{QueryError, QueryResult};

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Less than
    Lt,
    /// Less than or equal to
    Le,
    /// Greater than
    Gt,
    /// Greater than or equal to
    Ge,
    /// Equal to
    Eq,
    /// Not equal to
    Ne,
}

impl Operator {
    /// Every operator, in table order
    pub const ALL: [Operator; 6] = [
        Operator::Lt,
        Operator::Le,
        Operator::Gt,
        Operator::Ge,
        Operator::Eq,
        Operator::Ne,
    ];

    /// Symbol emitted in compiled filter clauses
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Eq => "=",
            Self::Ne => "!=",
        }
    }

    /// Parse a symbol; both `=` and `==` read as equality
    pub fn from_symbol(s: &str) -> QueryResult<Self> {
        match s {
            "<" => Ok(Self::Lt),
            "<=" => Ok(Self::Le),
            ">" => Ok(Self::Gt),
            ">=" => Ok(Self::Ge),
            "=" | "==" => Ok(Self::Eq),
            "!=" => Ok(Self::Ne),
            other => Err(QueryError::InvalidOperator(other.to_string())),
        }
    }

    /// Whether `left.cmp(right)` satisfies this operator
    pub fn matches(&self, ordering: Ordering) -> bool {
        match self {
            Self::Lt => ordering == Ordering::Less,
            Self::Le => ordering != Ordering::Greater,
            Self::Gt => ordering == Ordering::Greater,
            Self::Ge => ordering != Ordering::Less,
            Self::Eq => ordering == Ordering::Equal,
            Self::Ne => ordering != Ordering::Equal,
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A single comparison against one column
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    column: String,
    kind: FieldKind,
    op: Operator,
    value: Value,
}

impl Predicate {
    /// Build a predicate directly; the value is converted to the column kind
    /// when possible.
    pub fn new(column: impl Into<String>, kind: FieldKind, op: Operator, value: Value) -> Self {
        let value = value.coerce(kind).unwrap_or(value);
        Self {
            column: column.into(),
            kind,
            op,
            value,
        }
    }

    /// Left operand: the column name
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Declared kind of the column
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn operator(&self) -> Operator {
        self.op
    }

    /// Right operand: the literal
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Evaluate against a candidate column value.
    ///
    /// Values of an incompatible kind never match.
    pub fn matches(&self, candidate: &Value) -> bool {
        candidate
            .coerce(self.kind)
            .and_then(|c| c.compare(&self.value))
            .map(|ordering| self.op.matches(ordering))
            .unwrap_or(false)
    }
}

impl std::fmt::Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.column, self.op, self.value)
    }
}
