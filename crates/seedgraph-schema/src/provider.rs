//! Schema provider seam and the declarative [`Schema`]
//!
//! The engine reads metadata and touches instances only through
//! [`SchemaProvider`]. [`Schema`] is the stock implementation: a validated
//! set of entity descriptors, built in code or loaded from TOML, JSON or YAML.

use crate::descriptor::{EntityTypeDescriptor, FieldDescriptor, IdentifierKind};
use crate::error::{FieldAccessError, Result, SchemaError};
use crate::instance::Instance;
use crate::kind::{FieldShape, RelationKind, ScalarKind, TypeName};
use crate::value::{EntityKey, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Debug;
use std::path::Path;

/// Read access to entity metadata plus typed instance access
pub trait SchemaProvider: Send + Sync + Debug {
    /// Descriptor of an entity type
    fn entity(&self, name: &str) -> Option<&EntityTypeDescriptor>;

    /// All entity type names in declaration order
    fn entity_names(&self) -> Vec<TypeName>;

    /// Descriptor of an entity type, failing when unknown
    ///
    /// # Errors
    ///
    /// Returns [`FieldAccessError::UnknownEntity`] for unknown names.
    fn descriptor(&self, name: &str) -> std::result::Result<&EntityTypeDescriptor, FieldAccessError> {
        self.entity(name)
            .ok_or_else(|| FieldAccessError::UnknownEntity(TypeName::new(name)))
    }

    /// Ordered field descriptors of an entity type
    ///
    /// # Errors
    ///
    /// Returns [`FieldAccessError::UnknownEntity`] for unknown names.
    fn fields(&self, name: &str) -> std::result::Result<&[FieldDescriptor], FieldAccessError> {
        Ok(&self.descriptor(name)?.fields)
    }

    /// Field descriptor by name
    ///
    /// # Errors
    ///
    /// Returns an error when the entity or the field is unknown.
    fn field(
        &self,
        entity: &str,
        field: &str,
    ) -> std::result::Result<&FieldDescriptor, FieldAccessError> {
        let descriptor = self.descriptor(entity)?;
        descriptor
            .field(field)
            .ok_or_else(|| FieldAccessError::UnknownField {
                entity: descriptor.name.clone(),
                field: field.to_string(),
            })
    }

    /// Zero-value instance with every field unset
    ///
    /// # Errors
    ///
    /// Returns [`FieldAccessError::UnknownEntity`] for unknown names.
    fn default_instance(&self, name: &str) -> std::result::Result<Instance, FieldAccessError> {
        let descriptor = self.descriptor(name)?;
        Ok(Instance::new(
            descriptor.name.clone(),
            descriptor.fields.iter().map(|f| f.name.clone()),
        ))
    }

    /// Comparable identity of an instance
    ///
    /// A single identifier yields its own key; several identifier fields
    /// yield a composite key in declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`FieldAccessError::MissingIdentity`] while any identifier
    /// field is unset.
    fn identity(&self, instance: &Instance) -> std::result::Result<EntityKey, FieldAccessError> {
        let descriptor = self.descriptor(instance.entity().as_str())?;
        descriptor
            .key_of(instance)
            .ok_or_else(|| FieldAccessError::MissingIdentity(descriptor.name.clone()))
    }

    /// Identity of a field value holding an entity
    ///
    /// # Errors
    ///
    /// Returns [`FieldAccessError::MissingIdentity`] when the value is not a
    /// keyed entity.
    fn value_identity(&self, value: &Value) -> std::result::Result<EntityKey, FieldAccessError> {
        match value {
            Value::Ref(r) => Ok(r.key.clone()),
            Value::Entity(instance) => self.identity(instance),
            other => Err(FieldAccessError::MissingIdentity(TypeName::new(
                other.kind_name(),
            ))),
        }
    }

    /// Field value of an instance
    ///
    /// # Errors
    ///
    /// Returns [`FieldAccessError::UnknownField`] when the instance lacks
    /// the field.
    fn get<'a>(
        &self,
        instance: &'a Instance,
        field: &str,
    ) -> std::result::Result<&'a Value, FieldAccessError> {
        instance
            .get(field)
            .ok_or_else(|| FieldAccessError::UnknownField {
                entity: instance.entity().clone(),
                field: field.to_string(),
            })
    }

    /// Assign a field value after checking it against the declared shape
    ///
    /// # Errors
    ///
    /// Returns [`FieldAccessError::UnknownField`] or
    /// [`FieldAccessError::TypeMismatch`].
    fn set(
        &self,
        instance: &mut Instance,
        field: &str,
        value: Value,
    ) -> std::result::Result<(), FieldAccessError> {
        let descriptor = self.descriptor(instance.entity().as_str())?;
        descriptor.set(instance, field, value)
    }
}

/// On-disk schema document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaDocument {
    #[serde(default)]
    pub entity: Vec<EntityTypeDescriptor>,
}

/// Validated, declarative schema
#[derive(Debug, Clone, Default)]
pub struct Schema {
    entities: IndexMap<TypeName, EntityTypeDescriptor>,
}

impl Schema {
    /// Build and validate a schema
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] when descriptors are inconsistent.
    pub fn new(entities: impl IntoIterator<Item = EntityTypeDescriptor>) -> Result<Self> {
        let mut map = IndexMap::new();
        for entity in entities {
            if map.contains_key(&entity.name) {
                return Err(SchemaError::DuplicateEntity(entity.name));
            }
            map.insert(entity.name.clone(), entity);
        }
        let schema = Self { entities: map };
        schema.validate()?;
        Ok(schema)
    }

    /// Parse a TOML schema document
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Parse`] or a validation error.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let document: SchemaDocument = toml::from_str(input)?;
        Self::new(document.entity)
    }

    /// Parse a JSON schema document
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Parse`] or a validation error.
    pub fn from_json_str(input: &str) -> Result<Self> {
        let document: SchemaDocument = serde_json::from_str(input)?;
        Self::new(document.entity)
    }

    /// Parse a YAML schema document
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Parse`] or a validation error.
    pub fn from_yaml_str(input: &str) -> Result<Self> {
        let document: SchemaDocument = serde_yaml::from_str(input)?;
        Self::new(document.entity)
    }

    /// Load a schema file, choosing the format by extension
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Io`], [`SchemaError::UnsupportedFormat`],
    /// [`SchemaError::Parse`] or a validation error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match extension.as_str() {
            "toml" => Self::from_toml_str(&input),
            "json" => Self::from_json_str(&input),
            "yaml" | "yml" => Self::from_yaml_str(&input),
            other => Err(SchemaError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Number of entity types
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Iterate descriptors in declaration order
    pub fn entities(&self) -> impl Iterator<Item = &EntityTypeDescriptor> {
        self.entities.values()
    }

    fn validate(&self) -> Result<()> {
        for entity in self.entities.values() {
            self.validate_entity(entity)?;
        }
        Ok(())
    }

    fn validate_entity(&self, entity: &EntityTypeDescriptor) -> Result<()> {
        let mut seen = HashSet::new();
        for field in &entity.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField {
                    entity: entity.name.clone(),
                    field: field.name.clone(),
                });
            }
            if let Some(target) = field.shape.target() {
                if !self.entities.contains_key(target) {
                    return Err(SchemaError::UnknownTarget {
                        entity: entity.name.clone(),
                        field: field.name.clone(),
                        target: target.clone(),
                    });
                }
            }
            let fits = match (field.relation_kind(), &field.shape) {
                (RelationKind::None, _) => true,
                (RelationKind::OneToOne | RelationKind::ManyToOne, shape) => {
                    matches!(shape, FieldShape::Reference(_))
                }
                (RelationKind::OneToMany | RelationKind::ManyToMany, shape) => {
                    matches!(shape, FieldShape::ReferenceCollection { .. })
                }
            };
            if !fits {
                return Err(SchemaError::ShapeMismatch {
                    entity: entity.name.clone(),
                    field: field.name.clone(),
                    relation: field.relation_kind().to_string(),
                    shape: field.shape.name(),
                });
            }
        }

        for name in &entity.non_cascade_updatables {
            if entity.field(name).is_none() {
                return Err(SchemaError::UnknownField {
                    entity: entity.name.clone(),
                    field: name.clone(),
                });
            }
        }

        let ids: Vec<_> = entity.identifier_fields().collect();
        if ids.is_empty() {
            return Err(SchemaError::MissingIdentity(entity.name.clone()));
        }
        for field in &ids {
            let Some(kind) = field.shape.scalar() else {
                return Err(SchemaError::InvalidIdentifier {
                    entity: entity.name.clone(),
                    field: field.name.clone(),
                });
            };
            if field.id == Some(IdentifierKind::Generated)
                && (ids.len() > 1 || !(kind.is_integral() || *kind == ScalarKind::Text))
            {
                return Err(SchemaError::UnsupportedGeneratedId {
                    entity: entity.name.clone(),
                    field: field.name.clone(),
                });
            }
        }
        Ok(())
    }
}

impl SchemaProvider for Schema {
    fn entity(&self, name: &str) -> Option<&EntityTypeDescriptor> {
        self.entities.get(name)
    }

    fn entity_names(&self) -> Vec<TypeName> {
        self.entities.keys().cloned().collect()
    }
}
