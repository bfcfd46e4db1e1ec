//! Schema registry
//!
//! Catalog of declared record types, kept in registration order with a
//! name index. Shared by the store and every bucket handle it creates, so
//! all access goes through an `RwLock`: registrations take the write lock,
//! lookups the read lock.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::error::{SchemaError, SchemaResult};
use super::record::{Record, RecordType, Schema};

#[derive(Debug, Default)]
struct Catalog {
    /// Record types in registration order
    types: Vec<RecordType>,
    /// Name to position lookup
    by_name: HashMap<String, usize>,
}

/// Append-only catalog of record types
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    catalog: RwLock<Catalog>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Catalog> {
        self.catalog.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Catalog> {
        self.catalog.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a record type.
    ///
    /// Returns `true` when the type was added and `false` when an identical
    /// type was already present. A different type under the same name is a
    /// [`SchemaError::Conflict`].
    pub fn register(&self, record: RecordType) -> SchemaResult<bool> {
        let mut catalog = self.write();

        if let Some(&idx) = catalog.by_name.get(record.name()) {
            return if catalog.types[idx] == record {
                Ok(false)
            } else {
                Err(SchemaError::Conflict(record.name().to_string()))
            };
        }

        let idx = catalog.types.len();
        catalog.by_name.insert(record.name().to_string(), idx);
        tracing::debug!(record_type = %record.name(), "Registered record type");
        catalog.types.push(record);
        Ok(true)
    }

    /// Register the record type of `T`
    pub fn register_record<T: Record>(&self) -> SchemaResult<bool> {
        self.register(T::record_type()?)
    }

    /// Register several record types, returning how many were new.
    ///
    /// Stops at the first conflict; types before it stay registered.
    pub fn register_all<I>(&self, records: I) -> SchemaResult<usize>
    where
        I: IntoIterator<Item = RecordType>,
    {
        let mut added = 0;
        for record in records {
            if self.register(record)? {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Register every record type listed by a root declaration
    pub fn collect<S: Schema>(&self) -> SchemaResult<usize> {
        self.register_all(S::record_types()?)
    }

    /// All record types in registration order
    pub fn all(&self) -> Vec<RecordType> {
        self.read().types.clone()
    }

    /// Look up a record type by name
    pub fn resolve(&self, name: &str) -> SchemaResult<RecordType> {
        let catalog = self.read();
        catalog
            .by_name
            .get(name)
            .and_then(|&idx| catalog.types.get(idx))
            .cloned()
            .ok_or_else(|| SchemaError::NotFound(name.to_string()))
    }

    /// Check whether a name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.read().by_name.contains_key(name)
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.read().types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDef, FieldKind, FieldRole};
    use std::sync::Arc;

    fn record_type(name: &str, kind: FieldKind) -> RecordType {
        RecordType::new(name, vec![FieldDef::new("value", kind, FieldRole::Field)]).unwrap()
    }

    #[test]
    fn test_register_and_resolve() {
        let registry = SchemaRegistry::new();
        assert!(registry.register(record_type("A", FieldKind::Integer)).unwrap());
        assert!(registry.register(record_type("B", FieldKind::String)).unwrap());

        assert_eq!(registry.resolve("B").unwrap().name(), "B");
        let names: Vec<_> = registry.all().iter().map(|t| t.name().to_string()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_reregistration_is_idempotent() {
        let registry = SchemaRegistry::new();
        registry.register(record_type("A", FieldKind::Integer)).unwrap();
        assert!(!registry.register(record_type("A", FieldKind::Integer)).unwrap());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_conflicting_registration() {
        let registry = SchemaRegistry::new();
        registry.register(record_type("A", FieldKind::Integer)).unwrap();
        let err = registry
            .register(record_type("A", FieldKind::String))
            .unwrap_err();
        assert_eq!(err, SchemaError::Conflict("A".to_string()));
        assert_eq!(
            registry.resolve("A").unwrap().fields()[0].kind,
            FieldKind::Integer
        );
    }

    #[test]
    fn test_resolve_miss() {
        let registry = SchemaRegistry::new();
        assert_eq!(
            registry.resolve("Nope").unwrap_err(),
            SchemaError::NotFound("Nope".to_string())
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn test_register_all_counts_new() {
        let registry = SchemaRegistry::new();
        let added = registry
            .register_all(vec![
                record_type("A", FieldKind::Integer),
                record_type("A", FieldKind::Integer),
                record_type("B", FieldKind::Boolean),
            ])
            .unwrap();
        assert_eq!(added, 2);
    }

    #[test]
    fn test_concurrent_registration() {
        let registry = Arc::new(SchemaRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    for j in 0..50 {
                        let name = format!("T{}", (i * 50 + j) % 100);
                        registry
                            .register(record_type(&name, FieldKind::Integer))
                            .unwrap();
                        let _ = registry.resolve(&name).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(registry.len(), 100);
        for i in 0..100 {
            assert!(registry.contains(&format!("T{}", i)));
        }
    }
}
