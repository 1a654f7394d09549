//! Seedgraph Schema
//!
//! Entity descriptors, runtime values and instances for synthetic graph
//! generation.
//!
//! # Core Concepts
//!
//! - [`EntityTypeDescriptor`] / [`FieldDescriptor`]: explicit per-type metadata,
//!   including relationship, join, column and mocking directives
//! - [`Value`]: field value; references are [`EntityRef`]s, never pointers
//! - [`Instance`]: ordered field values of one entity
//! - [`CollectionKind`] / [`CollectionValue`]: declared and concrete collections
//! - [`SchemaProvider`]: the seam the engine reads metadata through
//! - [`Schema`]: validated declarative schema loaded from TOML, JSON or YAML
//!
//! # Example
//!
//! ```rust,ignore
//! use seedgraph_schema::prelude::*;
//!
//! let schema = Schema::load("schema.toml")?;
//! let mut person = schema.default_instance("Person")?;
//! schema.set(&mut person, "name", Value::from("Ada"))?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod collection;
mod descriptor;
mod error;
mod instance;
mod kind;
mod provider;
mod value;

pub use collection::{CollectionKind, CollectionValue, ConcreteCollectionKind, ElementType};
pub use descriptor::{
    ColumnSpec, EntityTypeDescriptor, FieldDescriptor, FieldMarkers, IdentifierKind, JoinColumn,
    MockDirective, Relation,
};
pub use error::{CollectionError, FieldAccessError, Result, SchemaError};
pub use instance::Instance;
pub use kind::{FieldShape, Keyword, RelationKind, ScalarKind, TypeName};
pub use provider::{Schema, SchemaDocument, SchemaProvider};
pub use value::{EntityKey, EntityRef, Value};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        CollectionKind, CollectionValue, ConcreteCollectionKind, ElementType,
        EntityKey, EntityRef, EntityTypeDescriptor, FieldAccessError, FieldDescriptor, FieldShape,
        IdentifierKind, Instance, Keyword, MockDirective, RelationKind, ScalarKind, Schema,
        SchemaError, SchemaProvider, TypeName, Value,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
