//! Integration tests for type generation.

use std::rc::Rc;

use docschema_graphql::{
    build, load_definitions_str, sub_field_description, sub_field_name, BuildError, BuildRequest,
    ClassKind, FieldMap, FieldSource, FieldSpec, InstanceKind, LoadError, Scalar, Schema, TypeRef,
    TypeRegistry,
};
use serde_json::json;

fn animal_schema() -> Rc<Schema> {
    Schema::builder()
        .primitive("name", InstanceKind::String)
        .primitive("age", InstanceKind::Number)
        .build()
}

// === Basic Scenarios ===

mod scenarios {
    use super::*;

    #[test]
    fn primitive_fields() {
        let registry = TypeRegistry::new();
        let request = BuildRequest::new("Animal", ClassKind::Object, animal_schema())
            .description("Type which represents an animal");
        let animal = build(&registry, &request).unwrap();

        assert_eq!(
            animal.to_json().unwrap(),
            json!({
                "name": "Animal",
                "description": "Type which represents an animal",
                "kind": "type",
                "fields": {
                    "name": { "type": "String" },
                    "age": { "type": "Int" }
                }
            })
        );
    }

    #[test]
    fn excluded_field_is_omitted() {
        let schema = Schema::builder()
            .primitive("name", InstanceKind::String)
            .primitive("age", InstanceKind::Number)
            .primitive("password", InstanceKind::String)
            .build();
        let registry = TypeRegistry::new();
        let request =
            BuildRequest::new("Animal", ClassKind::Object, schema).exclude(["password"]);

        let fields = build(&registry, &request).unwrap().fields().unwrap();
        let names: Vec<&str> = fields.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["name", "age"]);
    }

    #[test]
    fn nested_schema() {
        let whatever = Schema::builder()
            .primitive("a", InstanceKind::String)
            .primitive("b", InstanceKind::String)
            .build();
        let schema = Schema::builder().embedded("whatever", &whatever).build();

        let registry = TypeRegistry::new();
        let request = BuildRequest::new("NestedTestSchema", ClassKind::Object, schema)
            .description("Testing")
            .exclude(["_id"]);
        let ty = build(&registry, &request).unwrap();

        assert_eq!(
            ty.to_json().unwrap(),
            json!({
                "name": "NestedTestSchema",
                "description": "Testing",
                "kind": "type",
                "fields": {
                    "whatever": {
                        "type": {
                            "name": sub_field_name("NestedTestSchema", "whatever"),
                            "description": sub_field_description("NestedTestSchema", "whatever"),
                            "kind": "type",
                            "fields": {
                                "a": { "type": "String" },
                                "b": { "type": "String" }
                            }
                        }
                    }
                }
            })
        );

        let nested = registry.lookup("NestedTestSchema_whatever").unwrap();
        assert_eq!(
            ty.fields().unwrap()["whatever"].ty,
            TypeRef::Named(nested)
        );
    }

    #[test]
    fn array_of_schemas() {
        let whatever = Schema::builder()
            .primitive("a", InstanceKind::Number)
            .primitive("b", InstanceKind::Number)
            .build();
        let schema = Schema::builder()
            .primitive("something", InstanceKind::String)
            .array_of_schema("whatever", &whatever)
            .build();

        let registry = TypeRegistry::new();
        let request = BuildRequest::new("ArrayTestSchema", ClassKind::Object, schema)
            .description("Testing");
        let ty = build(&registry, &request).unwrap();

        assert_eq!(
            ty.to_json().unwrap()["fields"],
            json!({
                "something": { "type": "String" },
                "whatever": {
                    "type": {
                        "listOf": {
                            "name": "ArrayTestSchema_whatever",
                            "description": "ArrayTestSchema's 'whatever' sub-field",
                            "kind": "type",
                            "fields": {
                                "a": { "type": "Int" },
                                "b": { "type": "Int" }
                            }
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn array_of_primitives() {
        let schema = Schema::builder()
            .primitive("something", InstanceKind::String)
            .array_of("whatever", InstanceKind::String)
            .build();

        let registry = TypeRegistry::new();
        let request = BuildRequest::new("ArrayTestSchema", ClassKind::Object, schema);
        let fields = build(&registry, &request).unwrap().fields().unwrap();

        assert_eq!(fields["something"].ty, TypeRef::Scalar(Scalar::String));
        assert_eq!(
            fields["whatever"].ty,
            TypeRef::list(TypeRef::Scalar(Scalar::String))
        );
    }
}

// === Memoization ===

mod memoization {
    use super::*;

    #[test]
    fn same_name_returns_identical_instance() {
        let registry = TypeRegistry::new();
        let request = BuildRequest::new("Animal", ClassKind::Object, animal_schema());

        let first = build(&registry, &request).unwrap();
        let second = build(&registry, &request).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn shared_sub_schema_builds_one_type_per_parent_field() {
        let place = Schema::builder().primitive("city", InstanceKind::String).build();
        let schema = Schema::builder()
            .embedded("home", &place)
            .embedded("work", &place)
            .build();

        let registry = TypeRegistry::new();
        build(
            &registry,
            &BuildRequest::new("Person", ClassKind::Object, schema),
        )
        .unwrap();

        assert_eq!(
            registry.names(),
            vec!["Person_home", "Person_work", "Person"]
        );
    }

    #[test]
    fn independent_registries_do_not_collide() {
        let one = TypeRegistry::new();
        let two = TypeRegistry::new();
        let request = BuildRequest::new("Animal", ClassKind::Object, animal_schema());

        let a = build(&one, &request).unwrap();
        let b = build(&two, &request).unwrap();
        assert!(!Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn duplicate_registration_fails() {
        let registry = TypeRegistry::new();
        let animal = build(
            &registry,
            &BuildRequest::new("Animal", ClassKind::Object, animal_schema()),
        )
        .unwrap();

        let err = registry.register("Animal", animal).unwrap_err();
        assert_eq!(
            err,
            BuildError::DuplicateName {
                name: "Animal".into()
            }
        );
    }
}

// === Exclusion ===

mod exclusion {
    use super::*;

    #[test]
    fn excludes_every_descriptor_kind() {
        let place = Schema::builder().primitive("city", InstanceKind::String).build();
        let schema = Schema::cyclic(|me| {
            Schema::builder()
                .primitive("keep", InstanceKind::String)
                .primitive("p", InstanceKind::String)
                .embedded("e", &place)
                .embedded("se", me)
                .array_of("a", InstanceKind::Number)
                .array_of_schema("ae", &place)
                .array_of_schema("ase", me)
                .reference("r", "Nobody")
                .array_of_refs("ar", "Nobody")
        });
        let excluded = ["p", "e", "se", "a", "ae", "ase", "r", "ar"];

        let registry = TypeRegistry::new();
        let request = BuildRequest::new("T", ClassKind::Object, schema).exclude(excluded);
        let fields = build(&registry, &request).unwrap().fields().unwrap();

        assert_eq!(fields.keys().collect::<Vec<_>>(), vec!["keep"]);
        for field in excluded {
            assert!(!registry.contains(&sub_field_name("T", field)), "{}", field);
        }
        assert_eq!(registry.names(), vec!["T"]);
    }

    #[test]
    fn exclusion_applies_to_nested_levels() {
        let inner = Schema::builder()
            .primitive("secret", InstanceKind::String)
            .primitive("visible", InstanceKind::String)
            .build();
        let schema = Schema::builder()
            .primitive("secret", InstanceKind::String)
            .embedded("inner", &inner)
            .build();

        let registry = TypeRegistry::new();
        let request = BuildRequest::new("Outer", ClassKind::Object, schema).exclude(["secret"]);
        build(&registry, &request).unwrap();

        let nested = registry.lookup("Outer_inner").unwrap().fields().unwrap();
        assert!(nested.get("secret").is_none());
        assert!(nested.get("visible").is_some());
    }

    #[test]
    fn excluding_unknown_kind_avoids_error() {
        let schema = Schema::builder()
            .primitive("name", InstanceKind::String)
            .primitive("price", InstanceKind::parse("Decimal128"))
            .build();

        let registry = TypeRegistry::new();
        let request = BuildRequest::new("Item", ClassKind::Object, schema).exclude(["price"]);
        assert!(build(&registry, &request).is_ok());
    }
}

// === Self and Population References ===

mod references {
    use super::*;

    #[test]
    fn self_embedding_is_reference_equal_to_root() {
        let schema = Schema::cyclic(|me| {
            Schema::builder()
                .primitive("name", InstanceKind::String)
                .embedded("parent", me)
                .array_of_schema("children", me)
        });

        let registry = TypeRegistry::new();
        let node = build(&registry, &BuildRequest::new("Node", ClassKind::Object, schema)).unwrap();
        let fields = node.fields().unwrap();

        match &fields["parent"].ty {
            TypeRef::Named(parent) => assert!(Rc::ptr_eq(parent, &node)),
            other => panic!("expected named type, got {:?}", other),
        }
        assert_eq!(fields["children"].ty, TypeRef::list(TypeRef::named(&node)));

        assert_eq!(
            node.to_json().unwrap()["fields"]["parent"],
            json!({ "type": { "$ref": "Node" } })
        );
    }

    #[test]
    fn population_reference_resolves_types_built_later() {
        let animal = Schema::builder()
            .primitive("name", InstanceKind::String)
            .reference("owner", "Person")
            .build();
        let person = Schema::builder().primitive("name", InstanceKind::String).build();

        let registry = TypeRegistry::new();
        let animal = build(
            &registry,
            &BuildRequest::new("Animal", ClassKind::Object, animal),
        )
        .unwrap();

        assert_eq!(
            animal.fields().unwrap_err(),
            BuildError::UnresolvedReference {
                reference: "Person".into(),
                type_name: "Animal".into(),
            }
        );

        let person = build(
            &registry,
            &BuildRequest::new("Person", ClassKind::Object, person),
        )
        .unwrap();
        assert_eq!(animal.fields().unwrap()["owner"].ty, TypeRef::named(&person));
    }

    #[test]
    fn array_of_references_resolves_to_referenced_type() {
        let person = Schema::builder().primitive("name", InstanceKind::String).build();
        let animal = Schema::builder().array_of_refs("owners", "Person").build();

        let registry = TypeRegistry::new();
        let person = build(
            &registry,
            &BuildRequest::new("Person", ClassKind::Object, person),
        )
        .unwrap();
        let animal = build(
            &registry,
            &BuildRequest::new("Animal", ClassKind::Object, animal),
        )
        .unwrap();

        assert_eq!(animal.fields().unwrap()["owners"].ty, TypeRef::named(&person));
    }

    #[test]
    fn json_snapshot_cuts_reference_ring() {
        let registry = TypeRegistry::new();
        let mut types = Vec::new();
        for (name, next) in [("A", "B"), ("B", "C"), ("C", "A")] {
            let schema = Schema::builder()
                .primitive("name", InstanceKind::String)
                .reference("next", next)
                .build();
            let request = BuildRequest::new(name, ClassKind::Object, schema);
            types.push(build(&registry, &request).unwrap());
        }

        let snapshot = types[0].to_json().unwrap();
        let b = &snapshot["fields"]["next"]["type"];
        let c = &b["fields"]["next"]["type"];
        assert_eq!(b["name"], "B");
        assert_eq!(c["name"], "C");
        assert_eq!(c["fields"]["next"]["type"], json!({ "$ref": "A" }));
    }

    #[test]
    fn json_snapshot_expands_each_type_once() {
        let names = ["A", "B", "C", "D", "E", "F", "G", "H"];
        let registry = TypeRegistry::new();
        let mut types = Vec::new();
        for name in names {
            let schema = names
                .iter()
                .filter(|other| **other != name)
                .fold(Schema::builder(), |builder, other| {
                    builder.reference(other.to_lowercase(), *other)
                })
                .build();
            let request = BuildRequest::new(name, ClassKind::Object, schema);
            types.push(build(&registry, &request).unwrap());
        }

        let text = types[0].to_json().unwrap().to_string();
        assert_eq!(text.matches(r#""kind":"type""#).count(), names.len());
        // n * (n - 1) reference edges, n - 1 of them expanded
        assert_eq!(text.matches(r#""$ref""#).count(), (names.len() - 1).pow(2));
    }

    #[test]
    fn unresolved_reference_message_names_both_types() {
        let schema = Schema::builder().reference("owner", "Ghost").build();
        let registry = TypeRegistry::new();
        let ty = build(&registry, &BuildRequest::new("Animal", ClassKind::Object, schema)).unwrap();

        let msg = ty.fields().unwrap_err().to_string();
        assert!(msg.contains("Ghost"));
        assert!(msg.contains("Animal"));
    }
}

// === Override Precedence ===

mod overrides {
    use super::*;

    fn single(name: &str, scalar: Scalar) -> FieldMap {
        let mut map = FieldMap::new();
        map.insert(name.to_string(), FieldSpec::new(scalar));
        map
    }

    #[test]
    fn extend_overrides_generated_field() {
        let registry = TypeRegistry::new();
        let request = BuildRequest::new("Animal", ClassKind::Object, animal_schema())
            .extend(single("age", Scalar::Float));
        let fields = build(&registry, &request).unwrap().fields().unwrap();

        assert_eq!(fields["age"].ty, TypeRef::Scalar(Scalar::Float));
    }

    #[test]
    fn props_override_extend() {
        let registry = TypeRegistry::new();
        let request = BuildRequest::new("Animal", ClassKind::Object, animal_schema())
            .extend(single("age", Scalar::Float))
            .props(single("age", Scalar::Id));
        let fields = build(&registry, &request).unwrap().fields().unwrap();

        assert_eq!(fields["age"].ty, TypeRef::Scalar(Scalar::Id));
    }

    #[test]
    fn extend_adds_new_fields() {
        let mut problems = FieldMap::new();
        problems.insert(
            "problems".into(),
            FieldSpec::new(TypeRef::list(Scalar::String.into()))
                .with_description("Animals also have problems"),
        );

        let registry = TypeRegistry::new();
        let request =
            BuildRequest::new("Animal", ClassKind::Object, animal_schema()).extend(problems);
        let fields = build(&registry, &request).unwrap().fields().unwrap();

        let names: Vec<&str> = fields.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["name", "age", "problems"]);
        assert_eq!(
            fields["problems"].description.as_deref(),
            Some("Animals also have problems")
        );
    }

    #[test]
    fn deferred_extend_sees_registry_at_evaluation() {
        let registry = TypeRegistry::new();
        let lookup = registry.downgrade();
        let extend = FieldSource::deferred(move || {
            let mut map = FieldMap::new();
            if let Some(person) = lookup.lookup("Person") {
                map.insert("owner".into(), FieldSpec::new(TypeRef::Named(person)));
            }
            Ok(map)
        });

        let animal = build(
            &registry,
            &BuildRequest::new("Animal", ClassKind::Object, animal_schema()).extend(extend),
        )
        .unwrap();
        assert!(animal.fields().unwrap().get("owner").is_none());

        let person_schema = Schema::builder().primitive("name", InstanceKind::String).build();
        build(&registry, &BuildRequest::new("Person", ClassKind::Object, person_schema)).unwrap();
        assert!(animal.fields().unwrap().get("owner").is_some());
    }
}

// === Errors ===

mod errors {
    use super::*;

    #[test]
    fn unknown_primitive_kind() {
        let schema = Schema::builder()
            .primitive("tags", InstanceKind::parse("Map"))
            .build();
        let registry = TypeRegistry::new();
        let err = build(
            &registry,
            &BuildRequest::new("Item", ClassKind::Object, schema),
        )
        .unwrap_err();

        assert_eq!(err, BuildError::UnknownPrimitiveKind { kind: "Map".into() });
        assert!(registry.is_empty());
    }

    #[test]
    fn unknown_primitive_kind_in_array() {
        let schema = Schema::builder()
            .array_of("prices", InstanceKind::parse("Decimal128"))
            .build();
        let registry = TypeRegistry::new();
        let err = build(
            &registry,
            &BuildRequest::new("Item", ClassKind::Object, schema),
        )
        .unwrap_err();

        assert!(err.to_string().contains("Decimal128"));
    }

    #[test]
    fn mutual_embedding_is_a_cycle_error() {
        let schema = Schema::cyclic(|a| {
            Schema::builder().embedded(
                "b",
                Schema::builder()
                    .primitive("x", InstanceKind::String)
                    .embedded("a", a)
                    .build(),
            )
        });

        let registry = TypeRegistry::new();
        let err = build(&registry, &BuildRequest::new("A", ClassKind::Object, schema)).unwrap_err();

        assert_eq!(
            err,
            BuildError::EmbeddingCycle {
                path: vec!["A".into(), "A_b".into(), "A_b_a".into()]
            }
        );
        assert!(err.to_string().contains("A -> A_b -> A_b_a"));
        assert!(registry.is_empty());
    }

    #[test]
    fn cycle_below_the_root_is_detected() {
        // Root -> Loop -> Inner -> Loop
        let looped = Schema::cyclic(|me| {
            Schema::builder().embedded(
                "inner",
                Schema::builder().array_of_schema("back", me).build(),
            )
        });
        let root = Schema::builder()
            .primitive("name", InstanceKind::String)
            .embedded("loop", &looped)
            .build();

        let registry = TypeRegistry::new();
        let err = build(
            &registry,
            &BuildRequest::new("Root", ClassKind::Object, root),
        )
        .unwrap_err();

        assert_eq!(
            err,
            BuildError::EmbeddingCycle {
                path: vec![
                    "Root_loop".into(),
                    "Root_loop_inner".into(),
                    "Root_loop_inner_back".into(),
                ]
            }
        );
        assert!(!registry.contains("Root"));
    }

    #[test]
    fn missing_name() {
        let registry = TypeRegistry::new();
        let err = build(
            &registry,
            &BuildRequest::new("", ClassKind::Object, animal_schema()),
        )
        .unwrap_err();
        assert_eq!(err, BuildError::MissingOption { option: "name" });
    }

    #[test]
    fn invalid_class_kind() {
        let err = "GraphQLScalarType".parse::<ClassKind>().unwrap_err();
        assert!(matches!(err, BuildError::InvalidClassKind { .. }));
    }
}

// === Class Kinds ===

mod class_kinds {
    use super::*;

    #[test]
    fn nested_types_inherit_class_kind() {
        let place = Schema::builder().primitive("city", InstanceKind::String).build();
        let schema = Schema::builder()
            .primitive("name", InstanceKind::String)
            .embedded("home", &place)
            .build();

        let registry = TypeRegistry::new();
        let input = build(
            &registry,
            &BuildRequest::new("AnimalInput", ClassKind::InputObject, schema),
        )
        .unwrap();

        assert_eq!(input.kind(), ClassKind::InputObject);
        assert_eq!(
            registry.lookup("AnimalInput_home").unwrap().kind(),
            ClassKind::InputObject
        );
    }
}

// === Definitions Documents ===

mod definitions {
    use super::*;

    const DOCUMENT: &str = r#"{
        "schemas": {
            "Animal": {
                "name": "String",
                "age": "Number",
                "password": "String",
                "home": { "schema": "Place" },
                "children": [{ "schema": "Animal" }],
                "owner": { "ref": "Person" }
            },
            "Place": { "city": "String" },
            "Person": { "name": "String", "born": "Date" }
        },
        "types": [
            {
                "name": "Animal",
                "schema": "Animal",
                "class": "object",
                "description": "Type which represents an animal",
                "exclude": ["password"],
                "extend": { "problems": "[String]", "vet": "Person" },
                "props": { "age": "Float" }
            },
            { "name": "Person", "schema": "Person", "class": "GraphQLObjectType" }
        ]
    }"#;

    #[test]
    fn builds_declared_types_in_order() {
        let defs = load_definitions_str(DOCUMENT).unwrap();
        let registry = TypeRegistry::new();
        let types = defs.build_all(&registry).unwrap();

        let names: Vec<&str> = types.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["Animal", "Person"]);
        assert!(registry.contains("Animal_home"));
        assert!(registry.evaluate_all().is_empty());
    }

    #[test]
    fn declared_fields_resolve_lazily() {
        let defs = load_definitions_str(DOCUMENT).unwrap();
        let registry = TypeRegistry::new();
        let types = defs.build_all(&registry).unwrap();
        let animal = &types[0];
        let person = registry.lookup("Person").unwrap();

        let fields = animal.fields().unwrap();
        let names: Vec<&str> = fields.keys().map(String::as_str).collect();
        assert_eq!(
            names,
            vec!["name", "age", "home", "children", "owner", "problems", "vet"]
        );
        assert_eq!(fields["age"].ty, TypeRef::Scalar(Scalar::Float));
        assert_eq!(fields["owner"].ty, TypeRef::named(&person));
        assert_eq!(fields["vet"].ty, TypeRef::named(&person));
        assert_eq!(fields["children"].ty, TypeRef::list(TypeRef::named(animal)));
    }

    #[test]
    fn missing_reference_is_reported_by_evaluate_all() {
        let defs = load_definitions_str(
            r#"{
                "schemas": { "Animal": { "owner": { "ref": "Person" } } },
                "types": [{ "name": "Animal", "schema": "Animal", "class": "object" }]
            }"#,
        )
        .unwrap();
        let registry = TypeRegistry::new();
        defs.build_all(&registry).unwrap();

        let failures = registry.evaluate_all();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "Animal");
    }

    #[test]
    fn unknown_schema_in_declaration() {
        let defs = load_definitions_str(
            r#"{
                "schemas": { "Animal": { "name": "String" } },
                "types": [{ "name": "Animal", "schema": "Beast", "class": "object" }]
            }"#,
        )
        .unwrap();
        let registry = TypeRegistry::new();

        let err = defs.build_all(&registry).unwrap_err();
        assert!(matches!(err, LoadError::UnknownSchema { schema, .. } if schema == "Beast"));
    }

    #[test]
    fn invalid_type_expression() {
        let defs = load_definitions_str(
            r#"{
                "schemas": { "Animal": { "name": "String" } },
                "types": [{ "name": "Animal", "schema": "Animal", "class": "object",
                            "extend": { "bad": "[String" } }]
            }"#,
        )
        .unwrap();
        let registry = TypeRegistry::new();

        let err = defs.build_all(&registry).unwrap_err();
        assert!(matches!(err, LoadError::InvalidTypeExpr { expr } if expr == "[String"));
    }
}
