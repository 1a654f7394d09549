//! Field classification
//!
//! Decides per field whether and how it gets a value. The instance-independent
//! part of the decision is memoized per `(entity, field)`; whether the field is
//! already initialized is checked against the instance on every call.

use crate::error::{CircularReferenceError, ConfigurationError, MockError, Result};
use dashmap::DashMap;
use seedgraph_schema::{
    EntityTypeDescriptor, FieldDescriptor, FieldShape, IdentifierKind, Instance, Keyword,
    RelationKind, SchemaProvider, TypeName,
};
use std::sync::Arc;

/// Whether and how a field is instantiated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instantiation {
    /// Generate a value
    Populate,
    /// Leave the field unset
    Skip(SkipReason),
    /// Assign an empty collection; the other side fills the relationship
    EmptyCollection,
}

/// Why a field is left unset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NonMockable,
    /// Filled by the persistence gateway
    StoreGenerated,
    /// Optional side of a bidirectional relationship
    BackPointer,
}

/// How the field refers to its value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceShape {
    SinglePrimitive,
    PrimitiveCollection,
    SingleForeignKey,
    ForeignKeyCollection,
}

/// Where a value comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    Default,
    Keyword(Keyword),
    CustomKeyword(String),
    OfSet(Vec<String>),
    Range { min: i64, max: i64 },
    Factory(String),
}

/// Memoized, instance-independent field decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMetaInfo {
    pub instantiation: Instantiation,
    pub optional: bool,
    pub updatable: bool,
    pub reference_shape: ReferenceShape,
    pub value_source: ValueSource,
}

/// Decision for one field of one instance
#[derive(Debug, Clone)]
pub struct Classification {
    pub meta: Arc<FieldMetaInfo>,
    /// Field already holds a value on the instance
    pub already_initialized: bool,
}

impl Classification {
    /// Whether a value should be generated now
    #[inline]
    #[must_use]
    pub fn to_instantiate(&self) -> bool {
        !self.already_initialized && self.meta.instantiation == Instantiation::Populate
    }
}

/// Field classifier with a process-wide cache
#[derive(Debug)]
pub struct FieldClassifier {
    schema: Arc<dyn SchemaProvider>,
    cache: DashMap<(TypeName, String), Arc<FieldMetaInfo>>,
}

impl FieldClassifier {
    #[must_use]
    pub fn new(schema: Arc<dyn SchemaProvider>) -> Self {
        Self {
            schema,
            cache: DashMap::new(),
        }
    }

    /// Classify a field against a parent instance
    ///
    /// # Errors
    ///
    /// Returns a [`CircularReferenceError`] when the relationship admits no
    /// build order, or a [`ConfigurationError`] for unusable directives.
    pub fn classify(
        &self,
        entity: &EntityTypeDescriptor,
        field: &FieldDescriptor,
        parent: &Instance,
    ) -> Result<Classification> {
        let meta = self.meta(entity, field)?;
        let already_initialized = parent.get(&field.name).is_some_and(|v| !v.is_null());
        Ok(Classification {
            meta,
            already_initialized,
        })
    }

    /// Instance-independent decision, computed once per field
    ///
    /// # Errors
    ///
    /// See [`FieldClassifier::classify`].
    pub fn meta(
        &self,
        entity: &EntityTypeDescriptor,
        field: &FieldDescriptor,
    ) -> Result<Arc<FieldMetaInfo>> {
        let key = (entity.name.clone(), field.name.clone());
        if let Some(hit) = self.cache.get(&key) {
            return Ok(Arc::clone(hit.value()));
        }
        // Computed outside the map lock; a racing writer wins and both agree.
        let computed = Arc::new(self.compute(entity, field)?);
        Ok(Arc::clone(self.cache.entry(key).or_insert(computed).value()))
    }

    /// Number of memoized decisions
    #[must_use]
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    fn compute(&self, entity: &EntityTypeDescriptor, field: &FieldDescriptor) -> Result<FieldMetaInfo> {
        let instantiation = self.instantiation(entity, field)?;
        let reference_shape = reference_shape(entity, field)?;
        let value_source = if instantiation == Instantiation::Populate {
            value_source(entity, field)?
        } else {
            ValueSource::Default
        };
        Ok(FieldMetaInfo {
            instantiation,
            optional: is_optional(field),
            updatable: is_updatable(entity, field),
            reference_shape,
            value_source,
        })
    }

    fn instantiation(
        &self,
        entity: &EntityTypeDescriptor,
        field: &FieldDescriptor,
    ) -> Result<Instantiation> {
        if field.id == Some(IdentifierKind::Generated) {
            return Ok(Instantiation::Skip(SkipReason::StoreGenerated));
        }
        let Some(target) = field.shape.target() else {
            return Ok(Instantiation::Populate);
        };
        if field.markers.non_mockable {
            return Ok(Instantiation::Skip(SkipReason::NonMockable));
        }
        if field.markers.non_nullable {
            return Ok(Instantiation::Populate);
        }

        let kind = field.relation_kind();
        if kind == RelationKind::None {
            return Ok(Instantiation::Populate);
        }
        let target_descriptor = self.schema.descriptor(target.as_str())?;
        let Some(back_pointer) = back_pointer(target_descriptor, &entity.name, kind) else {
            return Ok(Instantiation::Populate);
        };
        let cycle = || {
            MockError::from(CircularReferenceError::two_way(
                kind,
                entity.name.clone(),
                field.name.clone(),
                target.clone(),
                back_pointer.name.clone(),
            ))
        };

        let mandatory = is_mandatory_link(field);
        let back_mandatory = is_mandatory_link(back_pointer);
        match kind {
            RelationKind::OneToOne => match (mandatory, back_mandatory) {
                (true, true) => Err(cycle()),
                (false, false) => Ok(Instantiation::Skip(SkipReason::BackPointer)),
                _ => Ok(Instantiation::Populate),
            },
            RelationKind::OneToMany => match (mandatory, back_mandatory) {
                (true, true) => Err(cycle()),
                (true, false) => Ok(Instantiation::Populate),
                (false, _) => Ok(Instantiation::EmptyCollection),
            },
            RelationKind::ManyToMany => {
                if mandatory || back_mandatory {
                    Err(cycle())
                } else {
                    Ok(Instantiation::EmptyCollection)
                }
            }
            RelationKind::ManyToOne => match (mandatory, back_mandatory) {
                (true, true) => Err(cycle()),
                (true, false) => Ok(Instantiation::Populate),
                (false, _) => Ok(Instantiation::Skip(SkipReason::BackPointer)),
            },
            RelationKind::None => Ok(Instantiation::Populate),
        }
    }
}

/// Field on `target` pointing back at `parent` with the mirrored kind
fn back_pointer<'a>(
    target: &'a EntityTypeDescriptor,
    parent: &TypeName,
    kind: RelationKind,
) -> Option<&'a FieldDescriptor> {
    let mirror = kind.mirror();
    target
        .fields
        .iter()
        .find(|f| f.shape.target() == Some(parent) && f.relation_kind() == mirror)
}

/// Mandatoriness of one side of a relationship, for cycle detection
///
/// Collection sides are mandatory only through a non-nullable join; single
/// sides also through a non-optional relation annotation.
fn is_mandatory_link(field: &FieldDescriptor) -> bool {
    if field.has_mandatory_join() || field.markers.non_nullable {
        return true;
    }
    match field.relation_kind() {
        RelationKind::OneToOne | RelationKind::ManyToOne => {
            field.relation.is_some_and(|r| !r.optional)
        }
        RelationKind::OneToMany | RelationKind::ManyToMany | RelationKind::None => false,
    }
}

/// Optional unless mandatoriness is proven by a non-nullable join
fn is_optional(field: &FieldDescriptor) -> bool {
    field.column.is_some_and(|c| c.nullable)
        || field.markers.nullable
        || field.relation.is_some_and(|r| r.optional)
        || !field.has_mandatory_join()
}

fn is_updatable(entity: &EntityTypeDescriptor, field: &FieldDescriptor) -> bool {
    !field.is_identifier()
        && !field.markers.non_cascade_updatable
        && !entity.locks_update_of(&field.name)
        && field.column.map_or(true, |c| c.updatable)
}

fn reference_shape(entity: &EntityTypeDescriptor, field: &FieldDescriptor) -> Result<ReferenceShape> {
    use RelationKind as R;
    let kind = field.relation_kind();
    match (kind, &field.shape) {
        (R::OneToOne | R::ManyToOne | R::None, FieldShape::Reference(_)) => {
            Ok(ReferenceShape::SingleForeignKey)
        }
        (R::OneToMany | R::ManyToMany | R::None, FieldShape::ReferenceCollection { .. }) => {
            Ok(ReferenceShape::ForeignKeyCollection)
        }
        (R::None, FieldShape::Scalar(_)) => Ok(ReferenceShape::SinglePrimitive),
        (R::None, FieldShape::ScalarCollection { .. }) => Ok(ReferenceShape::PrimitiveCollection),
        (
            R::OneToOne | R::ManyToOne | R::OneToMany | R::ManyToMany,
            FieldShape::Scalar(_) | FieldShape::ScalarCollection { .. },
        )
        | (R::OneToOne | R::ManyToOne, FieldShape::ReferenceCollection { .. })
        | (R::OneToMany | R::ManyToMany, FieldShape::Reference(_)) => {
            Err(ConfigurationError::RelationShapeMismatch {
                entity: entity.name.clone(),
                field: field.name.clone(),
                relation: kind.to_string(),
                shape: field.shape.name(),
            }
            .into())
        }
    }
}

fn value_source(entity: &EntityTypeDescriptor, field: &FieldDescriptor) -> Result<ValueSource> {
    let Some(directive) = &field.mock else {
        return Ok(ValueSource::Default);
    };
    if let Some(factory) = &directive.factory {
        return Ok(ValueSource::Factory(factory.clone()));
    }
    if let Some(name) = directive.custom_keyword.as_ref().filter(|k| !k.is_empty()) {
        return Ok(ValueSource::CustomKeyword(name.clone()));
    }
    if let Some(keyword) = directive.keyword {
        return Ok(ValueSource::Keyword(keyword));
    }
    if directive.of_set.iter().any(|s| !s.is_empty()) {
        return Ok(ValueSource::OfSet(directive.of_set.clone()));
    }
    if let (Some(min), Some(max)) = (directive.min, directive.max) {
        if min < max {
            return Ok(ValueSource::Range { min, max });
        }
    }
    Err(ConfigurationError::NoStrategy {
        entity: entity.name.clone(),
        field: field.name.clone(),
    }
    .into())
}
