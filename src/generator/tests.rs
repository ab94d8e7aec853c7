#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use crate::assembly::{DaoAssembly, DaoType, TypeRef};
use crate::config::GeneratorConfig;
use crate::error::GeneratorError;
use askama::Template;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};

fn billing_assembly() -> DaoAssembly {
    DaoAssembly::new(
        "Billing",
        vec![
            DaoType::new("Acme.Billing", "Invoice")
                .as_table()
                .with_member("Id", "int")
                .with_member("Number", "string")
                .with_member("Total", "decimal?"),
            DaoType::new("Acme.Billing", "Customer")
                .as_table()
                .with_member("Id", "int")
                .with_member("Name", "string"),
            DaoType::new("Acme.Billing", "AuditHelper").with_member("Note", "string"),
        ],
    )
}

fn generator(assembly: DaoAssembly) -> DtoGenerator {
    DtoGenerator::new(assembly, GeneratorConfig::with_data_root("/unused"))
}

#[test]
fn test_table_types_yield_one_shape_each() {
    let gen = generator(billing_assembly());
    let shapes = gen.shapes("Acme.Billing.Dtos").unwrap();
    let names: Vec<_> = shapes.iter().map(|s| s.type_name.as_str()).collect();
    assert_eq!(names, vec!["Invoice", "Customer"]);

    let invoice = &shapes[0];
    assert_eq!(invoice.namespace, "Acme.Billing.Dtos");
    assert_eq!(
        invoice.properties,
        vec![
            "pub Id: i32,".to_string(),
            "pub Number: String,".to_string(),
            "pub Total: f64,".to_string(),
        ]
    );
    // Nullable wrapper is stripped from the recorded source type as well.
    assert_eq!(
        invoice.member("Total").unwrap().source_type,
        TypeRef::named("decimal")
    );
    assert!(invoice.reference_types.contains(&TypeRef::named("int")));
}

#[test]
fn test_default_namespace_and_name() {
    let gen = generator(billing_assembly());
    assert_eq!(gen.derive_namespace().unwrap(), "Acme.Billing");
    assert_eq!(gen.dto_namespace().unwrap(), "Acme.Billing.Dtos");

    let name = gen.default_artifact_name().unwrap();
    let fingerprint = gen.fingerprint();
    assert_eq!(fingerprint.len(), 64);
    assert!(fingerprint.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    assert_eq!(name, format!("_Acme.Billing_{fingerprint}_.rlib"));
}

#[test]
fn test_artifact_name_ignores_declaration_order() {
    let forward = billing_assembly();
    let mut reversed = billing_assembly();
    reversed.types.reverse();

    let a = compute_default_artifact_name("Acme.Billing", forward.table_types(), "rlib");
    let b = compute_default_artifact_name("Acme.Billing", reversed.table_types(), "rlib");
    assert_eq!(a, b);
}

#[test]
fn test_artifact_name_changes_with_table_set() {
    let base = billing_assembly();
    let mut extended = billing_assembly();
    extended
        .types
        .push(DaoType::new("Acme.Billing", "Payment").as_table().with_member("Id", "int"));

    assert_ne!(
        generator(base).default_artifact_name().unwrap(),
        generator(extended).default_artifact_name().unwrap()
    );
}

#[test]
fn test_non_table_types_do_not_affect_fingerprint() {
    let base = billing_assembly();
    let mut extra = billing_assembly();
    extra
        .types
        .push(DaoType::new("Acme.Billing", "Scratch").with_member("X", "int"));
    assert_eq!(generator(base).fingerprint(), generator(extra).fingerprint());
}

#[test]
fn test_fingerprint_is_case_sensitive() {
    let lower = DaoAssembly::new("A", vec![DaoType::new("ns", "order").as_table().with_member("Id", "int")]);
    let upper = DaoAssembly::new("A", vec![DaoType::new("ns", "Order").as_table().with_member("Id", "int")]);
    assert_ne!(generator(lower).fingerprint(), generator(upper).fingerprint());
}

#[test]
fn test_namespace_falls_back_to_first_type() {
    let assembly = DaoAssembly::new(
        "Util",
        vec![DaoType::new("Acme.Util", "Helper").with_member("X", "int")],
    );
    let gen = generator(assembly);
    assert_eq!(gen.derive_namespace().unwrap(), "Acme.Util");
}

#[test]
fn test_empty_assembly_has_no_namespace() {
    let gen = generator(DaoAssembly::new("Empty", vec![]));
    match gen.derive_namespace().unwrap_err() {
        GeneratorError::EmptyAssembly { assembly } => assert_eq!(assembly, "Empty"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(matches!(
        gen.default_artifact_name(),
        Err(GeneratorError::EmptyAssembly { .. })
    ));
}

#[test]
fn test_type_names_are_sanitized() {
    let mut extractor = ShapeExtractor::default();
    let shape = extractor
        .from_properties(
            "Acme.Dtos",
            "Billing.Customer/Nested",
            &[PropertyModel::new("Id", TypeRef::named("int"))],
        )
        .unwrap();
    assert_eq!(shape.type_name, "Billing_CustomerNested");
    assert_eq!(shape.source_name, "Billing.Customer/Nested");
    assert_eq!(clean_type_name("9Lives"), "_9Lives");
}

#[test]
fn test_keyword_type_names_become_valid_identifiers() {
    assert_eq!(clean_type_name("type"), "r#type");
    assert_eq!(clean_type_name("match"), "r#match");
    assert_eq!(clean_type_name("Self"), "Self_");
    assert_eq!(clean_type_name("crate"), "crate_");
    assert_eq!(clean_type_name("_"), "__");
    assert_eq!(clean_type_name("Type"), "Type");
    assert_eq!(clean_type_name(""), "");
}

#[test]
fn test_keyword_table_renders_raw_struct_and_sibling_reference() {
    let assembly = DaoAssembly::new(
        "Odd",
        vec![
            DaoType::new("Acme", "type").as_table().with_member("Id", "int"),
            DaoType::new("Acme", "Self").as_table().with_member("Kind", "Acme.type"),
        ],
    );
    let source = generator(assembly).render_source("Acme.Dtos").unwrap();
    assert!(source.contains("pub struct r#type {"));
    assert!(source.contains("pub struct Self_ {"));
    assert!(source.contains("    pub Kind: r#type,"));
    assert!(!source.contains("pub struct type "));
    assert!(!source.contains("pub struct Self "));
}

#[test]
fn test_same_struct_name_in_two_namespaces_is_rejected() {
    let assembly = DaoAssembly::new(
        "Split",
        vec![
            DaoType::new("A", "Customer").as_table().with_member("Id", "int"),
            DaoType::new("B", "Customer").as_table().with_member("Id", "int"),
        ],
    );
    let gen = generator(assembly);
    match gen.render_source("A.Dtos").unwrap_err() {
        GeneratorError::InvalidInput(message) => {
            assert!(message.contains("`A.Customer`"));
            assert!(message.contains("`B.Customer`"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(matches!(gen.shapes("A.Dtos"), Err(GeneratorError::InvalidInput(_))));
}

#[test]
fn test_sanitized_names_that_clash_are_rejected() {
    let assembly = DaoAssembly::new(
        "Clash",
        vec![
            DaoType::new("Acme", "Order.Line").as_table().with_member("Id", "int"),
            DaoType::new("Acme", "Order_Line").as_table().with_member("Id", "int"),
        ],
    );
    assert!(matches!(
        generator(assembly).shapes("Acme.Dtos"),
        Err(GeneratorError::InvalidInput(_))
    ));
}

#[test]
fn test_field_names_are_sanitized() {
    let mut extractor = ShapeExtractor::default();
    let shape = extractor
        .from_properties(
            "ns",
            "Row",
            &[
                PropertyModel::new("type", TypeRef::named("string")),
                PropertyModel::new("self", TypeRef::named("int")),
                PropertyModel::new("first-name", TypeRef::named("string")),
            ],
        )
        .unwrap();
    let names: Vec<_> = shape.members.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["r#type", "self_", "first_name"]);
    assert_eq!(shape.member("first-name").unwrap().name, "first_name");
}

#[test]
fn test_from_properties_keeps_types_as_given() {
    let mut extractor = ShapeExtractor::default();
    let shape = extractor
        .from_properties(
            "ns",
            "Reading",
            &[
                PropertyModel::new("Value", TypeRef::named("double").nullable()),
                PropertyModel::new("Tags", TypeRef::Array(Box::new(TypeRef::named("string")))),
            ],
        )
        .unwrap();
    assert_eq!(
        shape.properties,
        vec![
            "pub Value: Option<f64>,".to_string(),
            "pub Tags: Vec<String>,".to_string(),
        ]
    );
}

#[test]
fn test_from_values_uses_runtime_types() {
    let mut extractor = ShapeExtractor::default();
    let shape = extractor
        .from_values(
            "ns",
            "Sample",
            vec![
                ("count", json!(3)),
                ("ratio", json!(0.5)),
                ("label", json!("x")),
                ("flags", json!([null, true])),
                ("missing", json!(null)),
            ],
        )
        .unwrap();
    assert_eq!(
        shape.properties,
        vec![
            "pub count: i64,".to_string(),
            "pub ratio: f64,".to_string(),
            "pub label: String,".to_string(),
            "pub flags: Vec<bool>,".to_string(),
            "pub missing: (),".to_string(),
        ]
    );
    assert_eq!(
        shape.member("missing").unwrap().source_type,
        TypeRef::named(PLACEHOLDER_TYPE)
    );
}

#[test]
fn test_from_values_requires_values() {
    let mut extractor = ShapeExtractor::default();
    let err = extractor
        .from_values("ns", "Nothing", Vec::<(String, serde_json::Value)>::new())
        .unwrap_err();
    assert!(matches!(err, GeneratorError::InvalidInput(_)));
}

#[test]
fn test_type_without_members_is_invalid() {
    let mut extractor = ShapeExtractor::default();
    let err = extractor
        .from_type(&DaoType::new("ns", "Hollow").as_table(), "ns.Dtos")
        .unwrap_err();
    assert!(matches!(err, GeneratorError::InvalidInput(_)));
}

#[test]
fn test_duplicate_member_is_rejected() {
    let table = DaoType::new("ns", "Twice")
        .as_table()
        .with_member("Id", "int")
        .with_member("Id", "long");
    let mut extractor = ShapeExtractor::default();
    let err = extractor.from_type(&table, "ns.Dtos").unwrap_err();
    assert!(matches!(err, GeneratorError::InvalidInput(_)));
}

#[test]
fn test_unresolvable_member_type_is_missing_reference() {
    let table = DaoType::new("Acme", "Order")
        .as_table()
        .with_member("Id", "int")
        .with_member("Shipper", "Acme.Logistics.Carrier");
    let mut extractor = ShapeExtractor::default();
    match extractor.from_type(&table, "Acme.Dtos").unwrap_err() {
        GeneratorError::MissingReference { member, type_name } => {
            assert_eq!(member, "Order.Shipper");
            assert_eq!(type_name, "Acme.Logistics.Carrier");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_unparseable_member_type_is_missing_reference() {
    let table = DaoType::new("Acme", "Order")
        .as_table()
        .with_member("Blob", "Map<string,int>");
    let mut extractor = ShapeExtractor::default();
    match extractor.from_type(&table, "Acme.Dtos").unwrap_err() {
        GeneratorError::MissingReference { member, type_name } => {
            assert_eq!(member, "Acme.Order.Blob");
            assert_eq!(type_name, "Map<string,int>");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_sibling_table_reference_resolves() {
    let assembly = DaoAssembly::new(
        "Shop",
        vec![
            DaoType::new("Acme.Shop", "Customer").as_table().with_member("Id", "int"),
            DaoType::new("Acme.Shop", "Order")
                .as_table()
                .with_member("Buyer", "Acme.Shop.Customer?")
                .with_member("Related", "Customer[]"),
        ],
    );
    let gen = generator(assembly);
    let shapes = gen.shapes("Acme.Shop.Dtos").unwrap();
    assert_eq!(
        shapes[1].properties,
        vec![
            "pub Buyer: Customer,".to_string(),
            "pub Related: Vec<Customer>,".to_string(),
        ]
    );
}

#[test]
fn test_type_map_overrides_and_imports() {
    let mut type_map = BTreeMap::new();
    type_map.insert("Decimal".to_string(), "rust_decimal::Decimal".to_string());
    type_map.insert("System.Guid".to_string(), "uuid::Uuid".to_string());

    let table = DaoType::new("Acme", "Payment")
        .as_table()
        .with_member("Amount", "decimal")
        .with_member("Ref", "System.Guid")
        .with_member("Refunds", "decimal[]");
    let mut extractor = ShapeExtractor::new(&type_map);
    let shape = extractor.from_type(&table, "Acme.Dtos").unwrap();

    assert_eq!(
        shape.properties,
        vec![
            "pub Amount: Decimal,".to_string(),
            "pub Ref: Uuid,".to_string(),
            "pub Refunds: Vec<Decimal>,".to_string(),
        ]
    );
    let expected: BTreeSet<String> = ["rust_decimal::Decimal", "uuid::Uuid"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(shape.imports, expected);
    assert_eq!(
        shape.usings(),
        "use rust_decimal::Decimal;\nuse uuid::Uuid;\n"
    );
}

#[test]
fn test_builtin_paths_are_imported() {
    let table = DaoType::new("Acme", "Event")
        .as_table()
        .with_member("At", "DateTime")
        .with_member("Took", "TimeSpan?");
    let mut extractor = ShapeExtractor::default();
    let shape = extractor.from_type(&table, "Acme.Dtos").unwrap();
    assert_eq!(
        shape.properties,
        vec!["pub At: SystemTime,".to_string(), "pub Took: Duration,".to_string()]
    );
    assert!(shape.imports.contains("std::time::SystemTime"));
    assert!(shape.imports.contains("std::time::Duration"));
}

#[test]
fn test_colliding_import_names_use_full_path() {
    let mut type_map = BTreeMap::new();
    type_map.insert("money".to_string(), "billing::Amount".to_string());
    type_map.insert("weight".to_string(), "shipping::Amount".to_string());

    let table = DaoType::new("Acme", "Parcel")
        .as_table()
        .with_member("Cost", "money")
        .with_member("Mass", "weight");
    let mut extractor = ShapeExtractor::new(&type_map);
    let shape = extractor.from_type(&table, "Acme.Dtos").unwrap();
    assert_eq!(
        shape.properties,
        vec![
            "pub Cost: Amount,".to_string(),
            "pub Mass: shipping::Amount,".to_string(),
        ]
    );
    assert_eq!(shape.imports.len(), 1);
    assert!(shape.imports.contains("billing::Amount"));
}

#[test]
fn test_import_never_shadows_generated_struct() {
    let mut type_map = BTreeMap::new();
    type_map.insert("ext".to_string(), "other::Customer".to_string());
    let assembly = DaoAssembly::new(
        "Shop",
        vec![
            DaoType::new("Acme", "Customer").as_table().with_member("Id", "int"),
            DaoType::new("Acme", "Order").as_table().with_member("Legacy", "ext"),
        ],
    );
    let mut extractor = ShapeExtractor::for_assembly(&assembly, &type_map);
    let shape = extractor.from_type(&assembly.types[1], "Acme.Dtos").unwrap();
    assert_eq!(shape.properties, vec!["pub Legacy: other::Customer,".to_string()]);
    assert!(shape.imports.is_empty());
}

#[test]
fn test_value_type_mapping() {
    assert_eq!(value_type(&json!(null)), TypeRef::named(PLACEHOLDER_TYPE));
    assert_eq!(value_type(&json!({"a": 1})), TypeRef::named(PLACEHOLDER_TYPE));
    assert_eq!(value_type(&json!(false)), TypeRef::named("bool"));
    assert_eq!(value_type(&json!(-1)), TypeRef::named("long"));
    assert_eq!(value_type(&json!(u64::MAX)), TypeRef::named("ulong"));
    assert_eq!(value_type(&json!(1.5)), TypeRef::named("double"));
    assert_eq!(
        value_type(&json!([])),
        TypeRef::Array(Box::new(TypeRef::named(PLACEHOLDER_TYPE)))
    );
}

#[test]
fn test_primitive_aliases() {
    assert_eq!(primitive_rust_type("Int32"), Some("i32"));
    assert_eq!(primitive_rust_type("decimal"), Some("f64"));
    assert_eq!(primitive_rust_type("String"), Some("String"));
    assert_eq!(primitive_rust_type("object"), Some("()"));
    assert_eq!(primitive_rust_type("Carrier"), None);
}

#[test]
fn test_rendered_unit_contains_all_tables() {
    let gen = generator(billing_assembly());
    let source = gen.render_source("Acme.Billing.Dtos").unwrap();

    assert!(source.contains("// Generated by dtogen from assembly `Billing`. Do not edit."));
    assert!(source.contains("// namespace: Acme.Billing.Dtos"));
    assert!(source.contains(&format!("// fingerprint: {}", gen.fingerprint())));
    assert!(source.contains("#[derive(Debug, Clone, PartialEq)]"));
    assert!(source.contains("pub struct Invoice {"));
    assert!(source.contains("    pub Total: f64,"));
    assert!(source.contains("pub struct Customer {"));
    assert!(!source.contains("AuditHelper"));
    assert!(!source.contains("use "));
}

#[test]
fn test_rendered_unit_without_derives() {
    let mut extractor = ShapeExtractor::default();
    let shape = extractor
        .from_properties("ns", "Bare", &[PropertyModel::new("Id", TypeRef::named("int"))])
        .unwrap();
    let shapes = vec![shape];
    let unit = DtoUnitTemplate::new("A", "ns", "fp", &[], &shapes);
    let source = unit.render().unwrap();
    assert!(!source.contains("#[derive("));
    assert!(source.contains("pub struct Bare {\n    pub Id: i32,\n}"));
}

#[test]
fn test_rendered_unit_lists_imports_once() {
    let mut type_map = BTreeMap::new();
    type_map.insert("guid".to_string(), "uuid::Uuid".to_string());
    let assembly = DaoAssembly::new(
        "Ids",
        vec![
            DaoType::new("Acme", "A").as_table().with_member("Id", "guid"),
            DaoType::new("Acme", "B").as_table().with_member("Id", "guid"),
        ],
    );
    let mut config = GeneratorConfig::with_data_root("/unused");
    config.type_map = type_map;
    let gen = DtoGenerator::new(assembly, config);
    let source = gen.render_source("Acme.Dtos").unwrap();
    assert_eq!(source.matches("use uuid::Uuid;").count(), 1);
}

#[test]
fn test_render_requires_table_types() {
    let assembly = DaoAssembly::new(
        "Util",
        vec![DaoType::new("Acme.Util", "Helper").with_member("X", "int")],
    );
    let err = generator(assembly).render_source("Acme.Util.Dtos").unwrap_err();
    assert!(matches!(err, GeneratorError::InvalidInput(_)));
}

#[test]
fn test_scratch_dir_follows_connection() {
    let mut assembly = billing_assembly();
    assert_eq!(
        generator(assembly.clone()).scratch_dir(),
        std::path::PathBuf::from("/unused/DtoTemp_default")
    );
    assembly.default_connection = Some("Warehouse".to_string());
    assert_eq!(
        generator(assembly.clone()).scratch_dir(),
        std::path::PathBuf::from("/unused/DtoTemp_Warehouse")
    );
    assembly.types[0] = assembly.types[0].clone().with_connection("Primary");
    assert_eq!(
        generator(assembly).scratch_dir(),
        std::path::PathBuf::from("/unused/DtoTemp_Primary")
    );
}
