//! Graph builder
//!
//! Recursively instantiates an entity: classifies every declared field,
//! delegates scalar values to the [`ValueAssigner`], recurses into referenced
//! entities and persists the result through the [`PersistenceGateway`].
//!
//! Each top-level call owns a session: the stack of types under
//! construction, its RNG and one transaction. A type already on the stack is
//! never constructed again within the call; a pre-existing instance is reused
//! instead.

use crate::assign::ValueAssigner;
use crate::classifier::{
    FieldClassifier, FieldMetaInfo, Instantiation, ReferenceShape, ValueSource,
};
use crate::collections::CollectionResolver;
use crate::config::EngineConfig;
use crate::error::{CircularReferenceError, ConfigurationError, MockError, PersistenceError, Result};
use crate::store::{PersistenceGateway, Transaction};
use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use seedgraph_data::{Corpus, MockRegistry, ReferenceData};
use seedgraph_schema::{
    ElementType, EntityKey, EntityRef, EntityTypeDescriptor, FieldDescriptor, Instance,
    SchemaProvider, TypeName, Value,
};
use smallvec::SmallVec;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Result of building one entity
#[derive(Debug, Clone, PartialEq)]
pub enum Built {
    /// Saved through the gateway; referenced by key
    Persisted(Instance),
    /// Never saved; embedded by value
    Transient(Instance),
}

impl Built {
    #[inline]
    #[must_use]
    pub fn instance(&self) -> &Instance {
        match self {
            Self::Persisted(instance) | Self::Transient(instance) => instance,
        }
    }

    #[inline]
    #[must_use]
    pub fn into_instance(self) -> Instance {
        match self {
            Self::Persisted(instance) | Self::Transient(instance) => instance,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        matches!(self, Self::Persisted(_))
    }
}

/// Call-scoped instantiation context
struct Session<'a> {
    stack: SmallVec<[TypeName; 8]>,
    transient: bool,
    rng: StdRng,
    tx: Box<dyn Transaction + 'a>,
}

/// Entity graph builder
#[derive(Debug)]
pub struct GraphBuilder {
    schema: Arc<dyn SchemaProvider>,
    store: Arc<dyn PersistenceGateway>,
    classifier: FieldClassifier,
    resolver: CollectionResolver,
    assigner: ValueAssigner,
    config: EngineConfig,
    calls: AtomicU64,
}

impl GraphBuilder {
    /// Create builder with the built-in corpus and an empty registry
    #[must_use]
    pub fn new(schema: Arc<dyn SchemaProvider>, store: Arc<dyn PersistenceGateway>) -> Self {
        Self {
            classifier: FieldClassifier::new(Arc::clone(&schema)),
            resolver: CollectionResolver::new(Arc::clone(&schema)),
            assigner: ValueAssigner::new(
                Arc::new(Corpus::builtin()),
                Arc::new(MockRegistry::empty()),
            ),
            schema,
            store,
            config: EngineConfig::default(),
            calls: AtomicU64::new(0),
        }
    }

    /// With reference data and a mock registry
    #[must_use]
    pub fn with_data(mut self, data: Arc<dyn ReferenceData>, registry: Arc<MockRegistry>) -> Self {
        self.assigner = ValueAssigner::new(data, registry);
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    #[inline]
    #[must_use]
    pub fn schema(&self) -> &Arc<dyn SchemaProvider> {
        &self.schema
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn classifier(&self) -> &FieldClassifier {
        &self.classifier
    }

    #[inline]
    #[must_use]
    pub fn resolver(&self) -> &CollectionResolver {
        &self.resolver
    }

    /// Build and persist a graph rooted at `entity`
    ///
    /// All writes of the call are committed together; on error nothing is
    /// committed.
    ///
    /// # Errors
    ///
    /// Returns [`MockError`] on unusable configuration, unresolvable cycles
    /// or persistence failures.
    pub fn instantiate(&self, entity: &str) -> Result<Instance> {
        let descriptor = self.schema.descriptor(entity)?;
        let mut session = self.session(false);
        let built = self.construct(&mut session, descriptor)?;
        session.tx.commit()?;
        Ok(built.into_instance())
    }

    /// Build a graph rooted at `entity` without persisting anything
    ///
    /// Optional references are left unset.
    ///
    /// # Errors
    ///
    /// See [`GraphBuilder::instantiate`].
    pub fn instantiate_transient(&self, entity: &str) -> Result<Instance> {
        let descriptor = self.schema.descriptor(entity)?;
        let mut session = self.session(true);
        Ok(self.construct(&mut session, descriptor)?.into_instance())
    }

    /// Fresh value for one field of a scratch instance
    ///
    /// # Errors
    ///
    /// Returns [`MockError::FieldAccess`] for unknown names, otherwise see
    /// [`GraphBuilder::instantiate`].
    pub fn mock_field_value(&self, entity: &str, field: &str) -> Result<Value> {
        let descriptor = self.schema.descriptor(entity)?;
        let field = self.schema.field(entity, field)?;
        let mut scratch = self.schema.default_instance(entity)?;
        let mut session = self.session(true);
        session.stack.push(descriptor.name.clone());
        self.fill(&mut session, descriptor, field, &mut scratch, true)?;
        Ok(scratch.get(&field.name).cloned().unwrap_or_default())
    }

    /// Overwrite the updatable fields of `instance` with fresh values
    ///
    /// Identifiers, locked columns and non-cascade-updatable fields are left
    /// untouched. Fields the scratch build leaves unset keep their value, and
    /// so do references the scratch build could only embed by value.
    ///
    /// # Errors
    ///
    /// See [`GraphBuilder::instantiate`].
    pub fn mock_update(&self, instance: &mut Instance) -> Result<()> {
        let descriptor = self.schema.descriptor(instance.entity().as_str())?;
        let mut scratch = self.schema.default_instance(descriptor.name.as_str())?;
        // Keeps self-references from resolving to the instance being updated.
        for id in descriptor.identifier_fields() {
            if let Some(value) = instance.get(&id.name) {
                self.schema.set(&mut scratch, &id.name, value.clone())?;
            }
        }

        let mut session = self.session(true);
        session.stack.push(descriptor.name.clone());
        for field in &descriptor.fields {
            self.fill(&mut session, descriptor, field, &mut scratch, false)?;
        }

        for field in &descriptor.fields {
            if !self.classifier.meta(descriptor, field)?.updatable {
                continue;
            }
            match scratch.get(&field.name) {
                Some(Value::Null | Value::Entity(_)) | None => {}
                Some(Value::Collection(items))
                    if items.iter().any(|item| matches!(item, Value::Entity(_))) => {}
                Some(value) => {
                    self.schema.set(instance, &field.name, value.clone())?;
                }
            }
        }
        Ok(())
    }

    fn session(&self, transient: bool) -> Session<'_> {
        let call = self.calls.fetch_add(1, Ordering::Relaxed);
        let rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed ^ call.wrapping_mul(0x9E37_79B9_7F4A_7C15)),
            None => StdRng::from_os_rng(),
        };
        Session {
            stack: SmallVec::new(),
            transient,
            rng,
            tx: self.store.begin(),
        }
    }

    /// Build `entity` unless it is already under construction
    ///
    /// Inside a cycle a pre-existing instance is reused; `None` when there is
    /// none.
    fn build(&self, session: &mut Session<'_>, entity: &TypeName) -> Result<Option<Built>> {
        let descriptor = self.schema.descriptor(entity.as_str())?;
        let depth = session.stack.len();
        if !session.stack.contains(entity) {
            return self.construct(session, descriptor).map(Some);
        }

        let mut existing = session.tx.find_all(entity)?;
        if existing.is_empty() {
            tracing::debug!(depth, entity = %entity, "no pre-existing instance to reuse");
            return Ok(None);
        }
        tracing::debug!(depth, entity = %entity, candidates = existing.len(), "reusing pre-existing instance");
        let index = session.rng.random_range(0..existing.len());
        Ok(Some(Built::Persisted(existing.swap_remove(index))))
    }

    fn construct(
        &self,
        session: &mut Session<'_>,
        descriptor: &EntityTypeDescriptor,
    ) -> Result<Built> {
        let depth = session.stack.len();
        if depth >= self.config.max_depth {
            return Err(ConfigurationError::RecursionLimit {
                entity: descriptor.name.clone(),
                depth,
            }
            .into());
        }
        tracing::debug!(depth, entity = %descriptor.name, "instantiating");

        let mut instance = self.schema.default_instance(descriptor.name.as_str())?;
        session.stack.push(descriptor.name.clone());
        let filled = descriptor
            .fields
            .iter()
            .try_for_each(|field| self.fill(session, descriptor, field, &mut instance, false));
        session.stack.pop();
        filled?;

        if session.transient {
            tracing::debug!(depth, entity = %descriptor.name, "returning transient instance");
            return Ok(Built::Transient(instance));
        }
        let saved = session.tx.save(descriptor, instance)?;
        tracing::debug!(depth, entity = %descriptor.name, "persisted instance");
        Ok(Built::Persisted(saved))
    }

    /// Classify one field and assign its value
    ///
    /// `requested` fields are populated even when a transient build would
    /// skip them.
    fn fill(
        &self,
        session: &mut Session<'_>,
        descriptor: &EntityTypeDescriptor,
        field: &FieldDescriptor,
        instance: &mut Instance,
        requested: bool,
    ) -> Result<()> {
        let classification = self.classifier.classify(descriptor, field, instance)?;
        if classification.already_initialized {
            return Ok(());
        }
        let meta = &classification.meta;
        match meta.instantiation {
            Instantiation::Skip(_) => return Ok(()),
            Instantiation::EmptyCollection => {
                if let Some((kind, element)) = field.shape.collection() {
                    let empty = self.resolver.resolve(kind, &element, &mut session.rng)?;
                    self.schema
                        .set(instance, &field.name, Value::Collection(empty))?;
                }
                return Ok(());
            }
            Instantiation::Populate => {}
        }
        if session.transient && !requested && meta.optional && field.shape.is_composite() {
            return Ok(());
        }

        if let Some(value) = self.value_for(session, descriptor, field, meta, instance)? {
            self.schema.set(instance, &field.name, value)?;
        }
        Ok(())
    }

    fn value_for(
        &self,
        session: &mut Session<'_>,
        descriptor: &EntityTypeDescriptor,
        field: &FieldDescriptor,
        meta: &FieldMetaInfo,
        parent: &Instance,
    ) -> Result<Option<Value>> {
        if meta.value_source != ValueSource::Default {
            return self
                .assigner
                .directed(descriptor, field, &meta.value_source, &mut session.rng)
                .map(Some);
        }
        match meta.reference_shape {
            ReferenceShape::SinglePrimitive => self
                .assigner
                .directed(descriptor, field, &ValueSource::Default, &mut session.rng)
                .map(Some),
            ReferenceShape::PrimitiveCollection => {
                self.primitive_collection(session, descriptor, field).map(Some)
            }
            ReferenceShape::SingleForeignKey => {
                self.single_foreign_key(session, descriptor, field, meta, parent)
            }
            ReferenceShape::ForeignKeyCollection => self
                .foreign_key_collection(session, descriptor, field, meta, parent)
                .map(Some),
        }
    }

    fn primitive_collection(
        &self,
        session: &mut Session<'_>,
        descriptor: &EntityTypeDescriptor,
        field: &FieldDescriptor,
    ) -> Result<Value> {
        let Some((kind, element)) = field.shape.collection() else {
            return Err(no_strategy(descriptor, field));
        };
        let ElementType::Scalar(scalar) = &element else {
            return Err(no_strategy(descriptor, field));
        };
        let mut collection = self.resolver.resolve(kind, &element, &mut session.rng)?;
        for _ in 0..self.config.primitive_collection_len {
            let value =
                self.assigner
                    .default_scalar(&descriptor.name, &field.name, scalar, &mut session.rng)?;
            collection.insert(value)?;
        }
        Ok(Value::Collection(collection))
    }

    fn single_foreign_key(
        &self,
        session: &mut Session<'_>,
        descriptor: &EntityTypeDescriptor,
        field: &FieldDescriptor,
        meta: &FieldMetaInfo,
        parent: &Instance,
    ) -> Result<Option<Value>> {
        let Some(target) = field.shape.target() else {
            return Err(no_strategy(descriptor, field));
        };
        let target_descriptor = self.schema.descriptor(target.as_str())?;
        let unresolved = |meta: &FieldMetaInfo| -> Result<Option<Value>> {
            if meta.optional {
                Ok(None)
            } else {
                Err(general_cycle(descriptor, field, target))
            }
        };

        let Some(built) = self.build(session, target)? else {
            return unresolved(meta);
        };

        let parent_key = descriptor.key_of(parent);
        let is_self = *target == descriptor.name
            && parent_key.is_some()
            && target_descriptor.key_of(built.instance()) == parent_key;
        if !is_self {
            return to_value(target_descriptor, built).map(Some);
        }

        let mut others: Vec<Instance> = session
            .tx
            .find_all(target)?
            .into_iter()
            .filter(|other| target_descriptor.key_of(other) != parent_key)
            .collect();
        if others.is_empty() {
            return unresolved(meta);
        }
        let index = session.rng.random_range(0..others.len());
        to_value(target_descriptor, Built::Persisted(others.swap_remove(index))).map(Some)
    }

    fn foreign_key_collection(
        &self,
        session: &mut Session<'_>,
        descriptor: &EntityTypeDescriptor,
        field: &FieldDescriptor,
        meta: &FieldMetaInfo,
        parent: &Instance,
    ) -> Result<Value> {
        let Some((kind, element)) = field.shape.collection() else {
            return Err(no_strategy(descriptor, field));
        };
        let ElementType::Entity(target) = &element else {
            return Err(no_strategy(descriptor, field));
        };
        let target_descriptor = self.schema.descriptor(target.as_str())?;
        let parent_key = descriptor
            .key_of(parent)
            .filter(|_| *target == descriptor.name);

        let (min, max) = (self.config.fk_collection_min, self.config.fk_collection_max);
        let attempts = if min < max {
            session.rng.random_range(min..max)
        } else {
            min
        };

        let mut keyed: IndexMap<EntityKey, Value> = IndexMap::new();
        let mut unkeyed = Vec::new();
        for _ in 0..attempts {
            let Some(built) = self.build(session, target)? else {
                continue;
            };
            let key = target_descriptor.key_of(built.instance());
            if key.is_some() && key == parent_key {
                continue;
            }
            let value = to_value(target_descriptor, built)?;
            match key {
                Some(key) => {
                    keyed.entry(key).or_insert(value);
                }
                None => unkeyed.push(value),
            }
        }

        let mut collection = self.resolver.resolve(kind, &element, &mut session.rng)?;
        for value in keyed.into_values().chain(unkeyed) {
            collection.insert(value)?;
        }
        if collection.is_empty() && !meta.optional {
            return Err(general_cycle(descriptor, field, target));
        }
        Ok(Value::Collection(collection))
    }
}

/// Field value referring to a built entity
fn to_value(descriptor: &EntityTypeDescriptor, built: Built) -> Result<Value> {
    match built {
        Built::Persisted(instance) => {
            let key = descriptor
                .key_of(&instance)
                .ok_or_else(|| PersistenceError::MissingIdentity(descriptor.name.clone()))?;
            Ok(Value::Ref(EntityRef::new(descriptor.name.clone(), key)))
        }
        Built::Transient(instance) => Ok(Value::Entity(Box::new(instance))),
    }
}

fn general_cycle(
    descriptor: &EntityTypeDescriptor,
    field: &FieldDescriptor,
    target: &TypeName,
) -> MockError {
    CircularReferenceError::General {
        entity: descriptor.name.clone(),
        field: field.name.clone(),
        target: target.clone(),
    }
    .into()
}

fn no_strategy(descriptor: &EntityTypeDescriptor, field: &FieldDescriptor) -> MockError {
    ConfigurationError::NoStrategy {
        entity: descriptor.name.clone(),
        field: field.name.clone(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use seedgraph_schema::{
        CollectionKind, IdentifierKind, MockDirective, RelationKind, ScalarKind, Schema,
    };

    fn engine(
        entities: impl IntoIterator<Item = EntityTypeDescriptor>,
    ) -> (GraphBuilder, Arc<MemoryStore>) {
        let schema = Arc::new(Schema::new(entities).unwrap());
        let store = Arc::new(MemoryStore::new());
        let builder = GraphBuilder::new(schema, store.clone())
            .with_config(EngineConfig::default().with_seed(17));
        (builder, store)
    }

    fn id() -> FieldDescriptor {
        FieldDescriptor::scalar("id", ScalarKind::Long).identifier(IdentifierKind::Generated)
    }

    #[test]
    fn failed_call_commits_nothing() {
        let (builder, store) = engine([
            EntityTypeDescriptor::new("Owner").with_field(id()).with_field(
                FieldDescriptor::reference("pet", "Pet", RelationKind::ManyToOne)
                    .optional(false)
                    .mandatory_join(),
            ),
            EntityTypeDescriptor::new("Pet").with_field(id()).with_field(
                FieldDescriptor::scalar("name", ScalarKind::Text)
                    .mock(MockDirective::custom_keyword("pet_names")),
            ),
        ]);
        let err = builder.instantiate("Owner").unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(store.total(), 0);
    }

    #[test]
    fn recursion_limit_is_reported() {
        let (builder, _) = engine([
            EntityTypeDescriptor::new("A").with_field(id()).with_field(
                FieldDescriptor::reference("b", "B", RelationKind::ManyToOne)
                    .optional(false)
                    .mandatory_join(),
            ),
            EntityTypeDescriptor::new("B").with_field(id()),
        ]);
        let builder = builder.with_config(EngineConfig::default().with_max_depth(1));
        let err = builder.instantiate("A").unwrap_err();
        assert!(matches!(
            err,
            MockError::Configuration(ConfigurationError::RecursionLimit { depth: 1, .. })
        ));
    }

    #[test]
    fn primitive_collections_have_configured_length() {
        let (builder, _) = engine([EntityTypeDescriptor::new("Bag").with_field(id()).with_field(
            FieldDescriptor::scalar_collection("numbers", CollectionKind::List, ScalarKind::Int),
        )]);
        let bag = builder.instantiate("Bag").unwrap();
        let Some(Value::Collection(numbers)) = bag.get("numbers") else {
            panic!("numbers should be a collection");
        };
        assert_eq!(numbers.len(), 20);
    }

    #[test]
    fn mock_field_value_leaves_store_untouched() {
        let (builder, store) = engine([EntityTypeDescriptor::new("Tag")
            .with_field(id())
            .with_field(FieldDescriptor::scalar("label", ScalarKind::Text))]);
        let value = builder.mock_field_value("Tag", "label").unwrap();
        assert!(matches!(value, Value::Text(_)));
        assert_eq!(store.total(), 0);
        assert!(builder.mock_field_value("Tag", "missing").is_err());
    }

    #[test]
    fn transient_builds_embed_references() {
        let (builder, store) = engine([
            EntityTypeDescriptor::new("Order").with_field(id()).with_field(
                FieldDescriptor::reference("customer", "Customer", RelationKind::ManyToOne)
                    .optional(false)
                    .mandatory_join(),
            ),
            EntityTypeDescriptor::new("Customer")
                .with_field(id())
                .with_field(FieldDescriptor::scalar("name", ScalarKind::Text)),
        ]);
        let order = builder.instantiate_transient("Order").unwrap();
        assert!(matches!(order.get("customer"), Some(Value::Entity(_))));
        assert_eq!(order.get("id"), Some(&Value::Null));
        assert_eq!(store.total(), 0);
    }
}
