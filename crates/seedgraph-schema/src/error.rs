//! Error types for schema construction and instance access

use crate::collection::ConcreteCollectionKind;
use crate::kind::TypeName;
use std::path::PathBuf;
use thiserror::Error;

/// Schema build and validation errors
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Duplicate entity type: {0}")]
    DuplicateEntity(TypeName),

    #[error("Duplicate field {entity}.{field}")]
    DuplicateField { entity: TypeName, field: String },

    #[error("Entity {0} declares no identifier field")]
    MissingIdentity(TypeName),

    #[error("Identifier {entity}.{field} must be a scalar")]
    InvalidIdentifier { entity: TypeName, field: String },

    #[error("Generated identifier {entity}.{field} must be the only identifier and of integral or text kind")]
    UnsupportedGeneratedId { entity: TypeName, field: String },

    #[error("Field {entity}.{field} references unknown entity type {target}")]
    UnknownTarget {
        entity: TypeName,
        field: String,
        target: TypeName,
    },

    #[error("Field {entity}.{field}: {relation} relation does not fit a {shape} field")]
    ShapeMismatch {
        entity: TypeName,
        field: String,
        relation: String,
        shape: &'static str,
    },

    #[error("Entity {entity} lists unknown field {field}")]
    UnknownField { entity: TypeName, field: String },

    #[error("Failed to read schema {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Schema parse error: {0}")]
    Parse(String),

    #[error("Unsupported schema format: {0}")]
    UnsupportedFormat(String),
}

impl From<toml::de::Error> for SchemaError {
    fn from(e: toml::de::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

impl From<serde_json::Error> for SchemaError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

impl From<serde_yaml::Error> for SchemaError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

/// Field lookup and assignment errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldAccessError {
    #[error("Unknown entity type: {0}")]
    UnknownEntity(TypeName),

    #[error("Unknown field {entity}.{field}")]
    UnknownField { entity: TypeName, field: String },

    #[error("Cannot assign {found} to {entity}.{field} of type {expected}")]
    TypeMismatch {
        entity: TypeName,
        field: String,
        expected: String,
        found: String,
    },

    #[error("Instance of {0} has no identity yet")]
    MissingIdentity(TypeName),
}

/// Collection insertion errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectionError {
    #[error("{collection} cannot order {element} elements")]
    Unorderable {
        collection: ConcreteCollectionKind,
        element: &'static str,
    },
}

/// Result alias for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;
