use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use seedgraph_core::{
    CircularReferenceError, ConfigurationError, EngineConfig, MockError, PopulationConfig,
    Populator,
};
use seedgraph_schema::{
    CollectionKind, ElementType, EntityKey, EntityTypeDescriptor, FieldDescriptor, MockDirective,
    RelationKind, ScalarKind, Schema, TypeName, Value,
};
use seedgraph_test_utils::{
    engine, engine_with, fk_collection, generated_id, half_optional_one_to_one,
    mandatory_one_to_one, order_items, sample_registry, scalar_only, self_reference,
    update_locked,
};
use std::sync::Arc;

fn reference(value: Option<&Value>) -> &seedgraph_schema::EntityRef {
    match value {
        Some(Value::Ref(reference)) => reference,
        other => panic!("expected a reference, got {other:?}"),
    }
}

#[test]
fn test_scalar_fields_are_populated_with_matching_kinds() {
    let (builder, _) = engine(scalar_only(), 11);
    let descriptor = builder.schema().descriptor("Gadget").unwrap().clone();

    for _ in 0..25 {
        let gadget = builder.instantiate("Gadget").unwrap();
        for field in &descriptor.fields {
            let value = gadget.get(&field.name).unwrap();
            let kind = field.shape.scalar().unwrap();
            assert!(!value.is_null(), "{} left null", field.name);
            assert!(kind.matches(value), "{} got {value:?}", field.name);
        }
    }
}

#[test]
fn test_same_seed_same_values() {
    let pick = |seed| {
        let (builder, _) = engine(scalar_only(), seed);
        let gadget = builder.instantiate("Gadget").unwrap();
        ["label", "grade", "stock", "color", "homepage"].map(|f| gadget.get(f).cloned())
    };
    assert_eq!(pick(99), pick(99));
}

#[test]
fn test_mandatory_one_to_one_fails_on_every_call() {
    let (builder, store) = engine(mandatory_one_to_one(), 1);
    for _ in 0..10 {
        for root in ["Husband", "Wife"] {
            let err = builder.instantiate(root).unwrap_err();
            let cycle = err.as_circular_reference().unwrap();
            assert_eq!(cycle.relation(), Some(RelationKind::OneToOne));
        }
    }
    assert_eq!(store.total(), 0);

    let err = builder.instantiate("Husband").unwrap_err();
    assert_eq!(
        err.to_string(),
        "circular reference: Two way non-nullable one-to-one relationship detected: Husband.wife<-->Wife.husband"
    );
}

#[test]
fn test_half_optional_one_to_one_reuses_existing_instance() {
    let (builder, store) = engine(half_optional_one_to_one(), 4);

    let person = builder.instantiate("Person").unwrap();
    let first_passport = reference(person.get("passport")).clone();
    let passport = store
        .get(&first_passport.entity, &first_passport.key)
        .unwrap();
    assert!(matches!(passport.get("holder"), None | Some(Value::Null)));

    let second = builder.instantiate("Passport").unwrap();
    let holder = reference(second.get("holder"));
    let new_person = store.get(&holder.entity, &holder.key).unwrap();
    assert_eq!(reference(new_person.get("passport")), &first_passport);

    assert_eq!(store.count(&TypeName::new("Person")), 2);
    assert_eq!(store.count(&TypeName::new("Passport")), 2);
}

#[test]
fn test_mandatory_fk_collection_without_candidates_fails() {
    let (builder, store) = engine(fk_collection(true), 2);
    let err = builder.instantiate("Node").unwrap_err();
    assert!(matches!(
        err,
        MockError::CircularReference(CircularReferenceError::General { ref field, .. })
            if field == "links"
    ));
    assert_eq!(store.total(), 0);
}

#[test]
fn test_optional_fk_collection_links_earlier_instances() {
    let (builder, store) = engine(fk_collection(false), 2);

    let first = builder.instantiate("Node").unwrap();
    let Some(Value::Collection(links)) = first.get("links") else {
        panic!("links should be a collection");
    };
    assert!(links.is_empty());

    for created in 1..5 {
        let node = builder.instantiate("Node").unwrap();
        let Some(Value::Collection(links)) = node.get("links") else {
            panic!("links should be a collection");
        };
        assert!(!links.is_empty());
        assert!(links.len() <= created);
        let own = node.get("id").and_then(Value::as_key);
        for link in links.iter() {
            let Value::Ref(link) = link else {
                panic!("links should hold references");
            };
            assert_ne!(Some(&link.key), own.as_ref());
            assert!(store.get(&link.entity, &link.key).is_some());
        }
    }
}

#[test]
fn test_resolved_collections_are_independent() {
    let (builder, _) = engine(order_items(), 3);
    let resolver = builder.resolver();
    let mut rng = StdRng::seed_from_u64(0);
    let element = ElementType::Scalar(ScalarKind::Int);

    let mut first = resolver
        .resolve(CollectionKind::Set, &element, &mut rng)
        .unwrap();
    let second = resolver
        .resolve(CollectionKind::Set, &element, &mut rng)
        .unwrap();
    first.insert(Value::Int(1)).unwrap();

    assert_eq!(first.len(), 1);
    assert!(second.is_empty());
    assert_eq!(first.kind(), second.kind());
    assert_eq!(resolver.cached(), 1);
}

#[test]
fn test_mock_update_leaves_locked_fields_alone() {
    let (builder, _) = engine(update_locked(), 8);
    let mut account = builder.instantiate("Account").unwrap();
    let locked = ["id", "username", "region", "opened"];
    let frozen = locked.map(|f| account.get(f).cloned());
    assert!(frozen.iter().all(|v| v.as_ref().is_some_and(|v| !v.is_null())));

    let mut notes_changed = 0;
    for _ in 0..100 {
        let before = account.get("note").cloned();
        builder.mock_update(&mut account).unwrap();
        assert_eq!(locked.map(|f| account.get(f).cloned()), frozen);
        if account.get("note").cloned() != before {
            notes_changed += 1;
        }
    }
    assert!(notes_changed > 0);
}

#[test]
fn test_mock_update_keeps_persisted_references() {
    let schema = Schema::new([
        EntityTypeDescriptor::new("Branch").with_field(generated_id()),
        EntityTypeDescriptor::new("Account")
            .with_field(generated_id())
            .with_field(FieldDescriptor::scalar("note", ScalarKind::Text))
            .with_field(
                FieldDescriptor::reference("branch", "Branch", RelationKind::ManyToOne)
                    .optional(false)
                    .mandatory_join(),
            ),
    ])
    .unwrap();
    let (builder, store) = engine(schema, 12);

    let mut account = builder.instantiate("Account").unwrap();
    let branch = reference(account.get("branch")).clone();
    for _ in 0..20 {
        builder.mock_update(&mut account).unwrap();
        assert_eq!(reference(account.get("branch")), &branch);
    }
    assert!(store.get(&branch.entity, &branch.key).is_some());
}

#[test]
fn test_optional_many_to_many_builds_empty_collections() {
    let side = |name: &str, target: &str| {
        FieldDescriptor::reference_collection(name, CollectionKind::Set, target, RelationKind::ManyToMany)
    };
    let schema = Schema::new([
        EntityTypeDescriptor::new("Student")
            .with_field(generated_id())
            .with_field(side("courses", "Course")),
        EntityTypeDescriptor::new("Course")
            .with_field(generated_id())
            .with_field(side("students", "Student")),
    ])
    .unwrap();
    let (builder, store) = engine(schema, 5);

    for (root, field) in [("Student", "courses"), ("Course", "students")] {
        let instance = builder.instantiate(root).unwrap();
        match instance.get(field) {
            Some(Value::Collection(items)) => assert!(items.is_empty(), "{root}.{field}"),
            other => panic!("expected a collection, got {other:?}"),
        }
    }
    assert_eq!(store.total(), 2);
}

#[test]
fn test_self_reference_never_points_at_itself() {
    let (builder, store) = engine(self_reference(false), 21);
    let employee = TypeName::new("Employee");

    let first = builder.instantiate("Employee").unwrap();
    assert!(matches!(first.get("manager"), None | Some(Value::Null)));

    for _ in 0..200 {
        let employee_row = builder.instantiate("Employee").unwrap();
        let own = employee_row.get("id").and_then(Value::as_i64).unwrap();
        assert!((1..4).contains(&own));
        if let Some(Value::Ref(manager)) = employee_row.get("manager") {
            assert_eq!(manager.entity, employee);
            assert_ne!(manager.key, EntityKey::Int(own));
        }
    }
    assert!(store.count(&employee) <= 3);
}

#[test]
fn test_mandatory_self_reference_without_candidates_fails() {
    let (builder, store) = engine(self_reference(true), 21);
    for _ in 0..5 {
        let err = builder.instantiate("Employee").unwrap_err();
        assert!(matches!(
            err.as_circular_reference(),
            Some(CircularReferenceError::General { .. })
        ));
    }
    assert_eq!(store.total(), 0);
}

#[test]
fn test_range_stays_within_bounds() {
    let schema = Schema::new([EntityTypeDescriptor::new("Dice")
        .with_field(generated_id())
        .with_field(
            FieldDescriptor::scalar("face", ScalarKind::Int).mock(MockDirective::range(10, 20)),
        )])
    .unwrap();
    let (builder, _) = engine(schema, 6);

    let mut seen = [false; 10];
    for _ in 0..10_000 {
        let Value::Int(face) = builder.mock_field_value("Dice", "face").unwrap() else {
            panic!("face should be an int");
        };
        assert!((10..20).contains(&face));
        seen[usize::try_from(face - 10).unwrap()] = true;
    }
    assert!(seen.iter().all(|s| *s));
}

#[test]
fn test_order_item_builds_its_order_chain() {
    let (builder, store) = engine(order_items(), 12);
    let item = builder.instantiate("OrderItem").unwrap();

    let quantity = item.get("quantity").and_then(Value::as_i64).unwrap();
    assert!((1..10).contains(&quantity));
    let Some(Value::Decimal(price)) = item.get("price") else {
        panic!("price should be a decimal");
    };
    assert!(*price >= 1.into() && *price <= 100.into());
    let Some(Value::Text(sku)) = item.get("sku") else {
        panic!("sku should be text");
    };
    assert!(["A-100", "B-200", "C-300"].contains(&sku.as_str()));

    let order = reference(item.get("order"));
    let order = store.get(&order.entity, &order.key).unwrap();
    let customer = reference(order.get("customer"));
    assert!(store.get(&customer.entity, &customer.key).is_some());
    let Some(Value::Collection(items)) = order.get("items") else {
        panic!("items should be an empty collection");
    };
    assert!(items.is_empty());
}

#[test]
fn test_population_skips_composites() {
    for parallel in [false, true] {
        let (builder, store) = engine(order_items(), 30);
        let report = Populator::new(
            Arc::new(builder),
            PopulationConfig::new()
                .with_quantity(2, 3)
                .with_parallel(parallel),
        )
        .populate()
        .unwrap();

        assert_eq!(report.counts.get("Customer"), Some(&2));
        assert_eq!(report.counts.get("Order"), Some(&2));
        assert!(!report.counts.contains_key("OrderItem"));
        assert_eq!(store.count(&TypeName::new("Customer")), 4);
        assert_eq!(store.count(&TypeName::new("OrderItem")), 0);
    }
}

#[test]
fn test_registry_keywords_and_factories() {
    let schema = Schema::new([EntityTypeDescriptor::new("Paint")
        .with_field(generated_id())
        .with_field(
            FieldDescriptor::scalar("shade", ScalarKind::Text)
                .mock(MockDirective::custom_keyword("Color")),
        )
        .with_field(
            FieldDescriptor::scalar("code", ScalarKind::Int).mock(MockDirective::factory("answer")),
        )])
    .unwrap();

    let (builder, _) = engine_with(
        schema.clone(),
        EngineConfig::new().with_seed(5),
        sample_registry(),
    );
    let paint = builder.instantiate("Paint").unwrap();
    assert_eq!(paint.get("code"), Some(&Value::Int(42)));
    let Some(Value::Text(shade)) = paint.get("shade") else {
        panic!("shade should be text");
    };
    assert!(["RED", "GREEN", "BLUE"].contains(&shade.as_str()));

    let (bare, store) = engine(schema, 5);
    let err = bare.instantiate("Paint").unwrap_err();
    assert!(matches!(
        err,
        MockError::Configuration(ConfigurationError::UnknownCustomKeyword(ref name)) if name == "COLOR"
    ));
    assert_eq!(store.total(), 0);
}
