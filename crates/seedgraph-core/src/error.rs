//! Error types for the Seedgraph engine
//!
//! Provides the error taxonomy for:
//! - Mocking configuration problems
//! - Unresolvable relationship cycles
//! - Persistence gateway failures

use seedgraph_schema::{CollectionError, CollectionKind, FieldAccessError, TypeName};
use std::path::PathBuf;

/// Main engine error type
#[derive(Debug, thiserror::Error)]
pub enum MockError {
    /// Directive or schema cannot be mocked
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Relationship cycle admits no build order
    #[error("circular reference: {0}")]
    CircularReference(#[from] CircularReferenceError),

    /// Field lookup or assignment failed
    #[error("field access error: {0}")]
    FieldAccess(#[from] FieldAccessError),

    /// Collection rejected an element
    #[error("collection error: {0}")]
    Collection(#[from] CollectionError),

    /// Persistence gateway failed
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

impl MockError {
    #[inline]
    #[must_use]
    pub fn is_circular_reference(&self) -> bool {
        matches!(self, Self::CircularReference(_))
    }

    #[inline]
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Underlying cycle error, if any
    #[must_use]
    pub fn as_circular_reference(&self) -> Option<&CircularReferenceError> {
        match self {
            Self::CircularReference(e) => Some(e),
            _ => None,
        }
    }
}

/// Mocking configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    /// Directive present but no strategy applies
    #[error("cannot determine data mocking strategy for {entity}.{field}")]
    NoStrategy { entity: TypeName, field: String },

    /// Custom keyword never registered
    #[error("no custom keyword registered as '{0}'")]
    UnknownCustomKeyword(String),

    /// Factory never registered
    #[error("no mock factory registered as '{0}'")]
    UnknownFactory(String),

    /// No concrete collection kind accepted a sample element
    #[error("unrecognized collection kind: {kind}<{element}>")]
    UnrecognizedCollectionKind { kind: CollectionKind, element: String },

    /// Numeric range on a non-numeric field
    #[error("range directive unsupported for {entity}.{field} of kind {kind}")]
    RangeUnsupported {
        entity: TypeName,
        field: String,
        kind: String,
    },

    /// Reference data category has no entries
    #[error("no reference data for '{0}'")]
    EmptyCorpus(String),

    /// Recursion bound reached
    #[error("recursion limit {depth} reached while instantiating {entity}")]
    RecursionLimit { entity: TypeName, depth: usize },

    /// Relationship kind does not fit the field shape
    #[error("{entity}.{field}: {relation} relation does not fit a {shape} field")]
    RelationShapeMismatch {
        entity: TypeName,
        field: String,
        relation: String,
        shape: &'static str,
    },
}

/// Relationship cycle errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CircularReferenceError {
    #[error("Two way non-nullable one-to-one relationship detected: {entity}.{field}<-->{target}.{back_pointer}")]
    OneToOne {
        entity: TypeName,
        field: String,
        target: TypeName,
        back_pointer: String,
    },

    #[error("Two way non-nullable one-to-many relationship detected: {entity}.{field}<-->{target}.{back_pointer}")]
    OneToMany {
        entity: TypeName,
        field: String,
        target: TypeName,
        back_pointer: String,
    },

    #[error("Two way non-nullable many-to-many relationship detected: {entity}.{field}<-->{target}.{back_pointer}")]
    ManyToMany {
        entity: TypeName,
        field: String,
        target: TypeName,
        back_pointer: String,
    },

    #[error("Two way non-nullable many-to-one relationship detected: {entity}.{field}<-->{target}.{back_pointer}")]
    ManyToOne {
        entity: TypeName,
        field: String,
        target: TypeName,
        back_pointer: String,
    },

    /// Mandatory reference found nothing to point at
    #[error("Circular reference found: {entity}.{field} contains a circular dependency to entity: {target}")]
    General {
        entity: TypeName,
        field: String,
        target: TypeName,
    },
}

impl CircularReferenceError {
    /// Cycle error for a relation kind that has a mirrored back-pointer
    #[must_use]
    pub(crate) fn two_way(
        kind: seedgraph_schema::RelationKind,
        entity: TypeName,
        field: String,
        target: TypeName,
        back_pointer: String,
    ) -> Self {
        use seedgraph_schema::RelationKind as R;
        match kind {
            R::OneToOne => Self::OneToOne {
                entity,
                field,
                target,
                back_pointer,
            },
            R::OneToMany => Self::OneToMany {
                entity,
                field,
                target,
                back_pointer,
            },
            R::ManyToMany => Self::ManyToMany {
                entity,
                field,
                target,
                back_pointer,
            },
            R::ManyToOne => Self::ManyToOne {
                entity,
                field,
                target,
                back_pointer,
            },
            R::None => Self::General {
                entity,
                field,
                target,
            },
        }
    }

    /// Relation kind the cycle was detected on, `None` for general cycles
    #[must_use]
    pub fn relation(&self) -> Option<seedgraph_schema::RelationKind> {
        use seedgraph_schema::RelationKind as R;
        match self {
            Self::OneToOne { .. } => Some(R::OneToOne),
            Self::OneToMany { .. } => Some(R::OneToMany),
            Self::ManyToMany { .. } => Some(R::ManyToMany),
            Self::ManyToOne { .. } => Some(R::ManyToOne),
            Self::General { .. } => None,
        }
    }
}

/// Persistence gateway errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistenceError {
    /// Saved instance has no usable identity
    #[error("cannot persist {0} without an identity")]
    MissingIdentity(TypeName),

    /// Generated identifier could not be produced for the field kind
    #[error("cannot generate identifier for {entity}.{field}")]
    IdGeneration { entity: TypeName, field: String },

    /// Backend-specific failure
    #[error("backend error: {0}")]
    Backend(String),
}

/// Errors loading engine configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error during file read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed configuration document
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Environment override is not a number
    #[error("invalid value for {name}: '{value}'")]
    InvalidEnv { name: String, value: String },
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, MockError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_messages_name_both_sides() {
        let err = CircularReferenceError::two_way(
            seedgraph_schema::RelationKind::OneToOne,
            TypeName::new("A"),
            "b".into(),
            TypeName::new("B"),
            "a".into(),
        );
        assert_eq!(
            err.to_string(),
            "Two way non-nullable one-to-one relationship detected: A.b<-->B.a"
        );
        assert_eq!(err.relation(), Some(seedgraph_schema::RelationKind::OneToOne));
    }

    #[test]
    fn general_message() {
        let err = CircularReferenceError::General {
            entity: TypeName::new("Employee"),
            field: "manager".into(),
            target: TypeName::new("Employee"),
        };
        assert_eq!(
            err.to_string(),
            "Circular reference found: Employee.manager contains a circular dependency to entity: Employee"
        );
    }

    #[test]
    fn predicates() {
        let err: MockError = ConfigurationError::UnknownFactory("x".into()).into();
        assert!(err.is_configuration());
        assert!(!err.is_circular_reference());
        assert!(err.as_circular_reference().is_none());
    }
}
