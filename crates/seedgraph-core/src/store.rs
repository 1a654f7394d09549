//! Persistence gateway seam and the in-memory store
//!
//! Every top-level build runs inside one [`Transaction`]. Staged rows are
//! visible to the transaction itself and become visible to others only on
//! [`Transaction::commit`]; dropping a transaction discards them.

use crate::error::PersistenceError;
use dashmap::DashMap;
use indexmap::IndexMap;
use parking_lot::RwLock;
use seedgraph_schema::{
    EntityKey, EntityTypeDescriptor, IdentifierKind, Instance, ScalarKind, TypeName, Value,
};
use std::collections::HashMap;
use std::fmt::Debug;

type Rows = HashMap<TypeName, IndexMap<EntityKey, Instance>>;

/// Storage backend the graph builder persists through
pub trait PersistenceGateway: Send + Sync + Debug {
    /// Open a transaction
    fn begin(&self) -> Box<dyn Transaction + '_>;
}

/// Unit of work spanning one top-level build
pub trait Transaction {
    /// Persist an instance, filling store-generated identifiers
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when no identity can be established.
    fn save(
        &mut self,
        descriptor: &EntityTypeDescriptor,
        instance: Instance,
    ) -> Result<Instance, PersistenceError>;

    /// All instances of a type visible to this transaction
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Backend`] on storage failure.
    fn find_all(&self, entity: &TypeName) -> Result<Vec<Instance>, PersistenceError>;

    /// Number of instances of a type visible to this transaction
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Backend`] on storage failure.
    fn count(&self, entity: &TypeName) -> Result<usize, PersistenceError> {
        Ok(self.find_all(entity)?.len())
    }

    /// Make staged writes visible
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Backend`] on storage failure.
    fn commit(self: Box<Self>) -> Result<(), PersistenceError>;
}

/// In-memory persistence gateway
///
/// Identifier sequences are not rolled back with their transaction.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: RwLock<Rows>,
    sequences: DashMap<TypeName, i64>,
}

impl MemoryStore {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed instances of a type in insertion order
    #[must_use]
    pub fn all(&self, entity: &TypeName) -> Vec<Instance> {
        self.rows
            .read()
            .get(entity)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Committed instance by key
    #[must_use]
    pub fn get(&self, entity: &TypeName, key: &EntityKey) -> Option<Instance> {
        self.rows.read().get(entity)?.get(key).cloned()
    }

    /// Number of committed instances of a type
    #[must_use]
    pub fn count(&self, entity: &TypeName) -> usize {
        self.rows.read().get(entity).map_or(0, IndexMap::len)
    }

    /// Number of committed instances across all types
    #[must_use]
    pub fn total(&self) -> usize {
        self.rows.read().values().map(IndexMap::len).sum()
    }

    fn next_id(&self, entity: &TypeName) -> i64 {
        let mut sequence = self.sequences.entry(entity.clone()).or_insert(0);
        *sequence += 1;
        *sequence
    }

    fn generate_ids(
        &self,
        descriptor: &EntityTypeDescriptor,
        instance: &mut Instance,
    ) -> Result<(), PersistenceError> {
        for field in descriptor.identifier_fields() {
            if field.id != Some(IdentifierKind::Generated)
                || instance.get(&field.name).is_some_and(|v| !v.is_null())
            {
                continue;
            }
            let failed = || PersistenceError::IdGeneration {
                entity: descriptor.name.clone(),
                field: field.name.clone(),
            };
            let value = match field.shape.scalar() {
                Some(ScalarKind::Text) => Value::Text(ulid::Ulid::new().to_string()),
                Some(kind) if kind.is_integral() => kind
                    .coerce(Value::Long(self.next_id(&descriptor.name)))
                    .ok_or_else(failed)?,
                _ => return Err(failed()),
            };
            descriptor
                .set(instance, &field.name, value)
                .map_err(|_| failed())?;
        }
        Ok(())
    }
}

impl PersistenceGateway for MemoryStore {
    fn begin(&self) -> Box<dyn Transaction + '_> {
        Box::new(MemoryTransaction {
            store: self,
            staged: Rows::new(),
        })
    }
}

/// Transaction over a [`MemoryStore`]
#[derive(Debug)]
struct MemoryTransaction<'a> {
    store: &'a MemoryStore,
    staged: Rows,
}

impl Transaction for MemoryTransaction<'_> {
    fn save(
        &mut self,
        descriptor: &EntityTypeDescriptor,
        mut instance: Instance,
    ) -> Result<Instance, PersistenceError> {
        self.store.generate_ids(descriptor, &mut instance)?;
        let key = descriptor
            .key_of(&instance)
            .ok_or_else(|| PersistenceError::MissingIdentity(descriptor.name.clone()))?;
        self.staged
            .entry(descriptor.name.clone())
            .or_default()
            .insert(key, instance.clone());
        Ok(instance)
    }

    fn find_all(&self, entity: &TypeName) -> Result<Vec<Instance>, PersistenceError> {
        let mut merged = self
            .store
            .rows
            .read()
            .get(entity)
            .cloned()
            .unwrap_or_default();
        if let Some(staged) = self.staged.get(entity) {
            merged.extend(staged.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        Ok(merged.into_values().collect())
    }

    fn commit(self: Box<Self>) -> Result<(), PersistenceError> {
        let mut rows = self.store.rows.write();
        for (entity, staged) in self.staged {
            rows.entry(entity).or_default().extend(staged);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seedgraph_schema::FieldDescriptor;

    fn person() -> EntityTypeDescriptor {
        EntityTypeDescriptor::new("Person")
            .with_field(
                FieldDescriptor::scalar("id", ScalarKind::Int).identifier(IdentifierKind::Generated),
            )
            .with_field(FieldDescriptor::scalar("name", ScalarKind::Text))
    }

    fn blank(descriptor: &EntityTypeDescriptor) -> Instance {
        Instance::new(
            descriptor.name.clone(),
            descriptor.fields.iter().map(|f| f.name.clone()),
        )
    }

    #[test]
    fn save_assigns_sequence_ids_of_field_kind() {
        let store = MemoryStore::new();
        let person = person();
        let mut tx = store.begin();
        let first = tx.save(&person, blank(&person)).unwrap();
        let second = tx.save(&person, blank(&person)).unwrap();
        assert_eq!(first.get("id"), Some(&Value::Int(1)));
        assert_eq!(second.get("id"), Some(&Value::Int(2)));
        tx.commit().unwrap();
        assert_eq!(store.count(&person.name), 2);
    }

    #[test]
    fn text_ids_are_ulids() {
        let tag = EntityTypeDescriptor::new("Tag").with_field(
            FieldDescriptor::scalar("id", ScalarKind::Text).identifier(IdentifierKind::Generated),
        );
        let store = MemoryStore::new();
        let mut tx = store.begin();
        let saved = tx.save(&tag, blank(&tag)).unwrap();
        let Some(Value::Text(id)) = saved.get("id") else {
            panic!("id should be text");
        };
        assert!(id.parse::<ulid::Ulid>().is_ok());
    }

    #[test]
    fn staged_rows_are_private_until_commit() {
        let store = MemoryStore::new();
        let person = person();
        {
            let mut tx = store.begin();
            tx.save(&person, blank(&person)).unwrap();
            assert_eq!(tx.count(&person.name).unwrap(), 1);
            assert_eq!(store.count(&person.name), 0);
        }
        assert_eq!(store.count(&person.name), 0);

        let mut tx = store.begin();
        tx.save(&person, blank(&person)).unwrap();
        tx.commit().unwrap();
        let tx = store.begin();
        assert_eq!(tx.find_all(&person.name).unwrap().len(), 1);
        assert_eq!(store.total(), 1);
    }

    #[test]
    fn save_upserts_by_key() {
        let store = MemoryStore::new();
        let person = person();
        let mut tx = store.begin();
        let mut saved = tx.save(&person, blank(&person)).unwrap();
        person
            .set(&mut saved, "name", Value::Text("Ada".into()))
            .unwrap();
        tx.save(&person, saved).unwrap();
        tx.commit().unwrap();
        let rows = store.all(&person.name);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("name"), Some(&Value::Text("Ada".into())));
        assert!(store.get(&person.name, &EntityKey::Int(1)).is_some());
    }

    #[test]
    fn assigned_identifier_must_be_present() {
        let tag = EntityTypeDescriptor::new("Tag").with_field(
            FieldDescriptor::scalar("code", ScalarKind::Text).identifier(IdentifierKind::Assigned),
        );
        let store = MemoryStore::new();
        let mut tx = store.begin();
        assert_eq!(
            tx.save(&tag, blank(&tag)).unwrap_err(),
            PersistenceError::MissingIdentity(TypeName::new("Tag"))
        );
    }
}
