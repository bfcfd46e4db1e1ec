//! Mapped fields
//!
//! A [`MappedField`] is a typed reference to one column of one record type.
//! Its comparison methods build [`Predicate`]s. It has no `PartialEq` or
//! `PartialOrd` impl: `field == 3` does not compile.

use std::marker::PhantomData;

use crate::schema::FieldValue;

use super::ast::{Operator, Predicate};

/// Column reference of element type `T`
pub struct MappedField<T> {
    column: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for MappedField<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for MappedField<T> {}

impl<T> std::fmt::Debug for MappedField<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedField")
            .field("column", &self.column)
            .finish()
    }
}

impl<T: FieldValue> MappedField<T> {
    pub fn new(column: &'static str) -> Self {
        Self {
            column,
            _marker: PhantomData,
        }
    }

    /// Column name
    pub fn column(&self) -> &'static str {
        self.column
    }

    fn compare(self, op: Operator, value: impl Into<T>) -> Predicate {
        Predicate::new(self.column, T::KIND, op, value.into().into_value())
    }

    /// `column < value`
    pub fn lt(self, value: impl Into<T>) -> Predicate {
        self.compare(Operator::Lt, value)
    }

    /// `column <= value`
    pub fn le(self, value: impl Into<T>) -> Predicate {
        self.compare(Operator::Le, value)
    }

    /// `column > value`
    pub fn gt(self, value: impl Into<T>) -> Predicate {
        self.compare(Operator::Gt, value)
    }

    /// `column >= value`
    pub fn ge(self, value: impl Into<T>) -> Predicate {
        self.compare(Operator::Ge, value)
    }

    /// `column == value`
    pub fn equals(self, value: impl Into<T>) -> Predicate {
        self.compare(Operator::Eq, value)
    }

    /// `column != value`
    pub fn not_equals(self, value: impl Into<T>) -> Predicate {
        self.compare(Operator::Ne, value)
    }
}
