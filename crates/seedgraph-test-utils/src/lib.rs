//! Testing utilities for the Seedgraph workspace
//!
//! Fixture schemas and engine constructors shared by the integration tests.

#![allow(missing_docs)]

use seedgraph_core::{EngineConfig, GraphBuilder, MemoryStore};
use seedgraph_data::{Corpus, CustomKeywordProvider, MockFactory, MockRegistry};
use seedgraph_schema::{
    CollectionKind, EntityTypeDescriptor, FieldDescriptor, IdentifierKind, Keyword, MockDirective,
    RelationKind, ScalarKind, Schema, Value,
};
use std::collections::HashMap;
use std::sync::Arc;

pub fn generated_id() -> FieldDescriptor {
    FieldDescriptor::scalar("id", ScalarKind::Long).identifier(IdentifierKind::Generated)
}

fn one_to_one(name: &str, target: &str, mandatory: bool) -> FieldDescriptor {
    let field = FieldDescriptor::reference(name, target, RelationKind::OneToOne);
    if mandatory {
        field.optional(false).mandatory_join()
    } else {
        field
    }
}

/// `Gadget` with one field of every scalar kind
pub fn scalar_only() -> Schema {
    let gadget = [
        ("label", ScalarKind::Text),
        ("grade", ScalarKind::Char),
        ("active", ScalarKind::Bool),
        ("flags", ScalarKind::Byte),
        ("shelf", ScalarKind::Short),
        ("stock", ScalarKind::Int),
        ("serial", ScalarKind::Long),
        ("weight", ScalarKind::Float),
        ("volume", ScalarKind::Double),
        ("price", ScalarKind::Decimal),
        ("released", ScalarKind::Date),
        ("updated", ScalarKind::DateTime),
        ("homepage", ScalarKind::Url),
        (
            "color",
            ScalarKind::Enum(vec!["RED".into(), "GREEN".into(), "BLUE".into()]),
        ),
    ]
    .into_iter()
    .fold(
        EntityTypeDescriptor::new("Gadget").with_field(generated_id()),
        |entity, (name, kind)| entity.with_field(FieldDescriptor::scalar(name, kind)),
    );
    schema([gadget])
}

/// `Husband.wife` and `Wife.husband`, both mandatory
pub fn mandatory_one_to_one() -> Schema {
    schema([
        EntityTypeDescriptor::new("Husband")
            .with_field(generated_id())
            .with_field(one_to_one("wife", "Wife", true)),
        EntityTypeDescriptor::new("Wife")
            .with_field(generated_id())
            .with_field(one_to_one("husband", "Husband", true)),
    ])
}

/// `Person.passport` mandatory, `Passport.holder` optional
pub fn half_optional_one_to_one() -> Schema {
    schema([
        EntityTypeDescriptor::new("Person")
            .with_field(generated_id())
            .with_field(
                FieldDescriptor::scalar("name", ScalarKind::Text)
                    .mock(MockDirective::keyword(Keyword::Name)),
            )
            .with_field(one_to_one("passport", "Passport", true)),
        EntityTypeDescriptor::new("Passport")
            .with_field(generated_id())
            .with_field(one_to_one("holder", "Person", false)),
    ])
}

/// `Employee.manager` pointing at another employee
///
/// Identifiers are assigned from a small range so keys collide often.
pub fn self_reference(mandatory: bool) -> Schema {
    let manager = FieldDescriptor::reference("manager", "Employee", RelationKind::ManyToOne);
    let manager = if mandatory {
        manager.optional(false).mandatory_join()
    } else {
        manager
    };
    schema([EntityTypeDescriptor::new("Employee")
        .with_field(
            FieldDescriptor::scalar("id", ScalarKind::Int)
                .identifier(IdentifierKind::Assigned)
                .mock(MockDirective::range(1, 4)),
        )
        .with_field(FieldDescriptor::scalar("name", ScalarKind::Text))
        .with_field(manager)])
}

/// Customers, orders and order lines
pub fn order_items() -> Schema {
    schema([
        EntityTypeDescriptor::new("Customer")
            .with_field(generated_id())
            .with_field(
                FieldDescriptor::scalar("name", ScalarKind::Text)
                    .mock(MockDirective::keyword(Keyword::Name)),
            )
            .with_field(
                FieldDescriptor::scalar("email", ScalarKind::Text)
                    .mock(MockDirective::keyword(Keyword::Email)),
            )
            .with_field(FieldDescriptor::reference_collection(
                "orders",
                CollectionKind::List,
                "Order",
                RelationKind::OneToMany,
            )),
        EntityTypeDescriptor::new("Order")
            .with_field(generated_id())
            .with_field(
                FieldDescriptor::reference("customer", "Customer", RelationKind::ManyToOne)
                    .optional(false)
                    .mandatory_join(),
            )
            .with_field(
                FieldDescriptor::scalar("placed", ScalarKind::Date)
                    .mock(MockDirective::keyword(Keyword::PastDate)),
            )
            .with_field(FieldDescriptor::reference_collection(
                "items",
                CollectionKind::Set,
                "OrderItem",
                RelationKind::OneToMany,
            )),
        EntityTypeDescriptor::new("OrderItem")
            .with_composite(true)
            .with_field(generated_id())
            .with_field(
                FieldDescriptor::reference("order", "Order", RelationKind::ManyToOne)
                    .optional(false)
                    .mandatory_join(),
            )
            .with_field(
                FieldDescriptor::scalar("quantity", ScalarKind::Int)
                    .mock(MockDirective::range(1, 10)),
            )
            .with_field(
                FieldDescriptor::scalar("price", ScalarKind::Decimal)
                    .mock(MockDirective::range(1, 100)),
            )
            .with_field(
                FieldDescriptor::scalar("sku", ScalarKind::Text)
                    .mock(MockDirective::of_set(["A-100", "B-200", "C-300"])),
            ),
    ])
}

/// `Node.links`: a collection of other nodes, mandatory or not
pub fn fk_collection(mandatory: bool) -> Schema {
    let links = FieldDescriptor::reference_collection(
        "links",
        CollectionKind::Set,
        "Node",
        RelationKind::None,
    );
    let links = if mandatory {
        links.optional(false).mandatory_join()
    } else {
        links
    };
    schema([EntityTypeDescriptor::new("Node")
        .with_field(generated_id())
        .with_field(links)])
}

/// `Account` with locked and updatable fields
pub fn update_locked() -> Schema {
    schema([EntityTypeDescriptor::new("Account")
        .with_non_cascade_updatable("region")
        .with_field(generated_id())
        .with_field(FieldDescriptor::scalar("username", ScalarKind::Text).non_cascade_updatable())
        .with_field(FieldDescriptor::scalar("region", ScalarKind::Text))
        .with_field(FieldDescriptor::scalar("opened", ScalarKind::DateTime).not_updatable())
        .with_field(
            FieldDescriptor::scalar("email", ScalarKind::Text)
                .mock(MockDirective::keyword(Keyword::Email)),
        )
        .with_field(FieldDescriptor::scalar("balance", ScalarKind::Decimal))
        .with_field(FieldDescriptor::scalar("note", ScalarKind::Text))])
}

fn schema(entities: impl IntoIterator<Item = EntityTypeDescriptor>) -> Schema {
    match Schema::new(entities) {
        Ok(schema) => schema,
        Err(e) => panic!("fixture schema is invalid: {e}"),
    }
}

#[derive(Debug)]
pub struct Colors;

impl CustomKeywordProvider for Colors {
    fn custom_keywords(&self) -> HashMap<String, Vec<Value>> {
        HashMap::from([(
            "color".to_string(),
            vec![Value::from("RED"), Value::from("GREEN"), Value::from("BLUE")],
        )])
    }
}

#[derive(Debug)]
pub struct Constant(pub &'static str, pub Value);

impl MockFactory for Constant {
    fn key(&self) -> &str {
        self.0
    }

    fn value(&self) -> Value {
        self.1.clone()
    }
}

/// Registry with the `COLOR` keyword and an `answer` factory yielding 42
pub fn sample_registry() -> MockRegistry {
    MockRegistry::builder()
        .with_keywords(&Colors)
        .with_factory(Arc::new(Constant("answer", Value::Int(42))))
        .build()
}

/// Seeded builder over a fresh in-memory store
pub fn engine(schema: Schema, seed: u64) -> (GraphBuilder, Arc<MemoryStore>) {
    engine_with(schema, EngineConfig::new().with_seed(seed), MockRegistry::empty())
}

/// Builder with explicit configuration and registry
pub fn engine_with(
    schema: Schema,
    config: EngineConfig,
    registry: MockRegistry,
) -> (GraphBuilder, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let builder = GraphBuilder::new(Arc::new(schema), store.clone())
        .with_data(Arc::new(Corpus::builtin()), Arc::new(registry))
        .with_config(config);
    (builder, store)
}
