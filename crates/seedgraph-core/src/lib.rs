//! Seedgraph Core - entity graph mocking engine
//!
//! Builds relationally consistent synthetic object graphs:
//! - Classifies every field (populate, skip, empty collection) and detects
//!   relationship cycles that admit no build order
//! - Resolves declared collection kinds to concrete ones
//! - Assigns scalar values from reference data and mocking directives
//! - Recursively builds, deduplicates and persists referenced entities
//! - Bulk-populates every persistable entity type
//!
//! # Example
//!
//! ```rust,ignore
//! use seedgraph_core::prelude::*;
//! use std::sync::Arc;
//!
//! let schema = Arc::new(Schema::load("schema.toml")?);
//! let store = Arc::new(MemoryStore::new());
//! let builder = GraphBuilder::new(schema, store).with_config(EngineConfig::new().with_seed(7));
//!
//! let order = builder.instantiate("Order")?;
//! println!("{}", serde_json::to_string_pretty(&order)?);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod assign;
pub mod builder;
pub mod classifier;
pub mod collections;
pub mod config;
pub mod error;
pub mod populate;
pub mod store;

// Re-exports for convenience
pub use assign::ValueAssigner;
pub use builder::{Built, GraphBuilder};
pub use classifier::{
    Classification, FieldClassifier, FieldMetaInfo, Instantiation, ReferenceShape, SkipReason,
    ValueSource,
};
pub use collections::CollectionResolver;
pub use config::{
    EngineConfig, PopulationConfig, SeedgraphConfig, POPULATE_ENV, QUANTITY_MAX_ENV,
    QUANTITY_MIN_ENV,
};
pub use error::{
    CircularReferenceError, ConfigError, ConfigurationError, MockError, PersistenceError, Result,
};
pub use populate::{PopulationReport, Populator};
pub use store::{MemoryStore, PersistenceGateway, Transaction};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the engine
    pub use crate::{
        CircularReferenceError, ConfigurationError, EngineConfig, GraphBuilder, MemoryStore,
        MockError, PersistenceGateway, PopulationConfig, PopulationReport, Populator,
    };
    pub use seedgraph_data::{Corpus, MockRegistry, ReferenceData};
    pub use seedgraph_schema::{Instance, Schema, SchemaProvider, TypeName, Value};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;
    use seedgraph_schema::{
        CollectionKind, EntityTypeDescriptor, FieldDescriptor, IdentifierKind, RelationKind,
        ScalarKind, Schema, TypeName, Value,
    };
    use std::sync::Arc;

    fn shop() -> Schema {
        let id = || {
            FieldDescriptor::scalar("id", ScalarKind::Long).identifier(IdentifierKind::Generated)
        };
        Schema::new([
            EntityTypeDescriptor::new("Customer")
                .with_field(id())
                .with_field(FieldDescriptor::scalar("name", ScalarKind::Text))
                .with_field(FieldDescriptor::reference_collection(
                    "orders",
                    CollectionKind::List,
                    "Order",
                    RelationKind::OneToMany,
                )),
            EntityTypeDescriptor::new("Order")
                .with_field(id())
                .with_field(
                    FieldDescriptor::reference("customer", "Customer", RelationKind::ManyToOne)
                        .optional(false)
                        .mandatory_join(),
                ),
        ])
        .unwrap()
    }

    #[test]
    fn order_reuses_nothing_and_creates_its_customer() {
        let store = Arc::new(MemoryStore::new());
        let builder = GraphBuilder::new(Arc::new(shop()), store.clone())
            .with_config(EngineConfig::new().with_seed(1));

        let order = builder.instantiate("Order").unwrap();
        let Some(Value::Ref(customer)) = order.get("customer") else {
            panic!("customer should be a persisted reference");
        };
        assert_eq!(customer.entity, TypeName::new("Customer"));
        assert_eq!(store.count(&TypeName::new("Customer")), 1);
        assert_eq!(store.count(&TypeName::new("Order")), 1);

        let saved = store.get(&customer.entity, &customer.key).unwrap();
        let Some(Value::Collection(orders)) = saved.get("orders") else {
            panic!("orders should be an empty collection");
        };
        assert!(orders.is_empty());
    }

    #[test]
    fn bulk_population_through_prelude() {
        use crate::prelude::*;
        let store = Arc::new(MemoryStore::new());
        let builder = Arc::new(
            GraphBuilder::new(Arc::new(shop()), store.clone())
                .with_config(EngineConfig::new().with_seed(2)),
        );
        let report = Populator::new(builder, PopulationConfig::new().with_quantity(2, 3))
            .populate()
            .unwrap();
        assert_eq!(report.total(), 4);
        // Each order creates its own customer.
        assert_eq!(store.count(&TypeName::new("Customer")), 4);
    }

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
