//! Field and entity type descriptors
//!
//! Descriptors replace runtime introspection: every persistence and mocking
//! annotation a field may carry is an explicit, serde-loadable value here.

use crate::collection::CollectionKind;
use crate::error::FieldAccessError;
use crate::instance::Instance;
use crate::kind::{FieldShape, Keyword, RelationKind, ScalarKind, TypeName};
use crate::value::{EntityKey, Value};
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// Relationship annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub kind: RelationKind,
    /// Relationship-level optionality
    #[serde(default = "default_true")]
    pub optional: bool,
}

/// Join column constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinColumn {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_true")]
    pub nullable: bool,
}

impl Default for JoinColumn {
    fn default() -> Self {
        Self {
            name: None,
            nullable: true,
        }
    }
}

/// Column constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    #[serde(default = "default_true")]
    pub nullable: bool,
    #[serde(default = "default_true")]
    pub updatable: bool,
}

impl Default for ColumnSpec {
    fn default() -> Self {
        Self {
            nullable: true,
            updatable: true,
        }
    }
}

/// How an identifier field obtains its value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierKind {
    /// Filled by the persistence gateway on save
    Generated,
    /// Mocked like any scalar
    Assigned,
    /// Part of a multi-field identifier
    Composite,
}

/// Explicit per-field markers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMarkers {
    pub non_mockable: bool,
    pub non_nullable: bool,
    pub nullable: bool,
    pub non_cascade_updatable: bool,
}

/// Mocking directive attached to a field
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MockDirective {
    pub keyword: Option<Keyword>,
    pub custom_keyword: Option<String>,
    pub of_set: Vec<String>,
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub factory: Option<String>,
}

impl MockDirective {
    #[must_use]
    pub fn keyword(keyword: Keyword) -> Self {
        Self {
            keyword: Some(keyword),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn custom_keyword(name: impl Into<String>) -> Self {
        Self {
            custom_keyword: Some(name.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn of_set<I, S>(literals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            of_set: literals.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn range(min: i64, max: i64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn factory(key: impl Into<String>) -> Self {
        Self {
            factory: Some(key.into()),
            ..Self::default()
        }
    }
}

/// Field descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub shape: FieldShape,
    #[serde(default)]
    pub relation: Option<Relation>,
    #[serde(default)]
    pub column: Option<ColumnSpec>,
    #[serde(default, rename = "join")]
    pub join_columns: Vec<JoinColumn>,
    #[serde(default)]
    pub id: Option<IdentifierKind>,
    #[serde(default)]
    pub markers: FieldMarkers,
    #[serde(default)]
    pub mock: Option<MockDirective>,
}

impl FieldDescriptor {
    fn with_shape(name: impl Into<String>, shape: FieldShape) -> Self {
        Self {
            name: name.into(),
            shape,
            relation: None,
            column: None,
            join_columns: Vec::new(),
            id: None,
            markers: FieldMarkers::default(),
            mock: None,
        }
    }

    /// Scalar field
    #[must_use]
    pub fn scalar(name: impl Into<String>, kind: ScalarKind) -> Self {
        Self::with_shape(name, FieldShape::Scalar(kind))
    }

    /// Collection of scalars
    #[must_use]
    pub fn scalar_collection(
        name: impl Into<String>,
        collection: CollectionKind,
        element: ScalarKind,
    ) -> Self {
        Self::with_shape(
            name,
            FieldShape::ScalarCollection {
                collection,
                element,
            },
        )
    }

    /// Single reference with a relationship annotation
    #[must_use]
    pub fn reference(name: impl Into<String>, target: impl Into<TypeName>, kind: RelationKind) -> Self {
        let mut field = Self::with_shape(name, FieldShape::Reference(target.into()));
        field.relation = Some(Relation {
            kind,
            optional: true,
        });
        field
    }

    /// Collection of references with a relationship annotation
    #[must_use]
    pub fn reference_collection(
        name: impl Into<String>,
        collection: CollectionKind,
        target: impl Into<TypeName>,
        kind: RelationKind,
    ) -> Self {
        let mut field = Self::with_shape(
            name,
            FieldShape::ReferenceCollection {
                collection,
                target: target.into(),
            },
        );
        field.relation = Some(Relation {
            kind,
            optional: true,
        });
        field
    }

    /// Mark as identifier
    #[must_use]
    pub fn identifier(mut self, kind: IdentifierKind) -> Self {
        self.id = Some(kind);
        self
    }

    /// Set relationship-level optionality
    #[must_use]
    pub fn optional(mut self, optional: bool) -> Self {
        if let Some(relation) = &mut self.relation {
            relation.optional = optional;
        }
        self
    }

    /// Add a non-nullable join column
    #[must_use]
    pub fn mandatory_join(mut self) -> Self {
        self.join_columns.push(JoinColumn {
            name: None,
            nullable: false,
        });
        self
    }

    /// Add a nullable join column
    #[must_use]
    pub fn nullable_join(mut self) -> Self {
        self.join_columns.push(JoinColumn::default());
        self
    }

    /// Lock the column against updates
    #[must_use]
    pub fn not_updatable(mut self) -> Self {
        self.column.get_or_insert_with(ColumnSpec::default).updatable = false;
        self
    }

    /// Mark the column nullable or not
    #[must_use]
    pub fn column_nullable(mut self, nullable: bool) -> Self {
        self.column.get_or_insert_with(ColumnSpec::default).nullable = nullable;
        self
    }

    #[must_use]
    pub fn non_mockable(mut self) -> Self {
        self.markers.non_mockable = true;
        self
    }

    #[must_use]
    pub fn non_nullable(mut self) -> Self {
        self.markers.non_nullable = true;
        self
    }

    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.markers.nullable = true;
        self
    }

    #[must_use]
    pub fn non_cascade_updatable(mut self) -> Self {
        self.markers.non_cascade_updatable = true;
        self
    }

    /// Attach a mocking directive
    #[must_use]
    pub fn mock(mut self, directive: MockDirective) -> Self {
        self.mock = Some(directive);
        self
    }

    /// Declared relationship kind, `None` when unannotated
    #[inline]
    #[must_use]
    pub fn relation_kind(&self) -> RelationKind {
        self.relation.map_or(RelationKind::None, |r| r.kind)
    }

    #[inline]
    #[must_use]
    pub fn is_identifier(&self) -> bool {
        self.id.is_some()
    }

    /// Whether a non-nullable join column proves the link mandatory
    #[must_use]
    pub fn has_mandatory_join(&self) -> bool {
        self.join_columns.iter().any(|join| !join.nullable)
    }
}

/// Entity type descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityTypeDescriptor {
    pub name: TypeName,
    #[serde(default, rename = "field")]
    pub fields: Vec<FieldDescriptor>,
    /// Weak entity owned by construction of another type
    #[serde(default)]
    pub composite: bool,
    /// Directly exposed for top-level population
    #[serde(default = "default_true")]
    pub exposed: bool,
    /// Fields excluded from cascading updates at type level
    #[serde(default)]
    pub non_cascade_updatables: Vec<String>,
    /// Fixed population quantity
    #[serde(default)]
    pub mock_quantity: Option<usize>,
}

impl EntityTypeDescriptor {
    /// Create descriptor without fields
    #[must_use]
    pub fn new(name: impl Into<TypeName>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            composite: false,
            exposed: true,
            non_cascade_updatables: Vec::new(),
            mock_quantity: None,
        }
    }

    /// Append a field
    #[must_use]
    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn with_composite(mut self, composite: bool) -> Self {
        self.composite = composite;
        self
    }

    #[must_use]
    pub fn with_exposed(mut self, exposed: bool) -> Self {
        self.exposed = exposed;
        self
    }

    #[must_use]
    pub fn with_non_cascade_updatable(mut self, field: impl Into<String>) -> Self {
        self.non_cascade_updatables.push(field.into());
        self
    }

    #[must_use]
    pub fn with_mock_quantity(mut self, quantity: usize) -> Self {
        self.mock_quantity = Some(quantity);
        self
    }

    /// Field by name
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Identifier fields in declaration order
    pub fn identifier_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.is_identifier())
    }

    /// Identity key of an instance of this type
    ///
    /// A single identifier yields its own key; several identifier fields
    /// yield a composite key in declaration order. `None` while any
    /// identifier is unset.
    #[must_use]
    pub fn key_of(&self, instance: &Instance) -> Option<EntityKey> {
        let mut keys = self
            .identifier_fields()
            .map(|field| instance.get(&field.name).and_then(Value::as_key))
            .collect::<Option<Vec<_>>>()?;
        match keys.len() {
            0 => None,
            1 => keys.pop(),
            _ => Some(EntityKey::Composite(keys)),
        }
    }

    /// Assign a field value after checking it against the declared shape
    ///
    /// # Errors
    ///
    /// Returns [`FieldAccessError::UnknownField`] or
    /// [`FieldAccessError::TypeMismatch`].
    pub fn set(&self, instance: &mut Instance, field: &str, value: Value) -> Result<(), FieldAccessError> {
        let unknown = || FieldAccessError::UnknownField {
            entity: self.name.clone(),
            field: field.to_string(),
        };
        let descriptor = self.field(field).ok_or_else(unknown)?;
        if !descriptor.shape.accepts(&value) {
            return Err(FieldAccessError::TypeMismatch {
                entity: self.name.clone(),
                field: field.to_string(),
                expected: descriptor.shape.to_string(),
                found: value.kind_name().to_string(),
            });
        }
        *instance.slot_mut(field).ok_or_else(unknown)? = value;
        Ok(())
    }

    /// Eligible for top-level bulk population
    #[inline]
    #[must_use]
    pub fn is_persistable(&self) -> bool {
        !self.composite && self.exposed
    }

    /// Whether a field is excluded from cascading updates at type level
    #[must_use]
    pub fn locks_update_of(&self, field: &str) -> bool {
        self.non_cascade_updatables.iter().any(|f| f == field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_mandatoriness_must_be_proven() {
        let plain = FieldDescriptor::reference("b", "B", RelationKind::OneToOne);
        assert!(!plain.has_mandatory_join());
        assert!(!plain.clone().nullable_join().has_mandatory_join());
        assert!(plain.mandatory_join().has_mandatory_join());
    }

    #[test]
    fn builders_set_flags() {
        let field = FieldDescriptor::reference("b", "B", RelationKind::ManyToOne)
            .optional(false)
            .not_updatable()
            .non_cascade_updatable();
        assert_eq!(field.relation_kind(), RelationKind::ManyToOne);
        assert_eq!(field.relation.map(|r| r.optional), Some(false));
        assert_eq!(field.column.map(|c| c.updatable), Some(false));
        assert!(field.markers.non_cascade_updatable);
        assert_eq!(
            FieldDescriptor::scalar("n", ScalarKind::Int).relation_kind(),
            RelationKind::None
        );
    }

    #[test]
    fn persistable_excludes_weak_and_hidden() {
        assert!(EntityTypeDescriptor::new("A").is_persistable());
        assert!(!EntityTypeDescriptor::new("A").with_composite(true).is_persistable());
        assert!(!EntityTypeDescriptor::new("A").with_exposed(false).is_persistable());
    }

    #[test]
    fn identifier_fields_in_order() {
        let entity = EntityTypeDescriptor::new("Line")
            .with_field(
                FieldDescriptor::scalar("order", ScalarKind::Long)
                    .identifier(IdentifierKind::Composite),
            )
            .with_field(FieldDescriptor::scalar("note", ScalarKind::Text))
            .with_field(
                FieldDescriptor::scalar("line", ScalarKind::Int)
                    .identifier(IdentifierKind::Composite),
            );
        let ids: Vec<_> = entity.identifier_fields().map(|f| f.name.as_str()).collect();
        assert_eq!(ids, vec!["order", "line"]);
    }
}
