//! Integration tests for schema synthesis: generated fields, nesting,
//! restrictions and unknown-field rejection.

mod common;

use std::sync::Arc;

use common::*;
use ormschema::catalog::{Color, Country, FieldDef, FieldType, MemoryRegistry, ModelDef, Record, Registry, Value};
use ormschema::{Loaded, Partial, SchemaDeclaration, SchemaError, SchemaSettings, SchemaWrapper};
use pretty_assertions::assert_eq;
use serde_json::json;

fn customer_json() -> serde_json::Value {
    json!({
        "id": 1,
        "name": "Alice",
        "addresses": [{
            "id": 1,
            "street": "1 rue du Gros Horloge",
            "city": {"id": 1, "name": "Rouen", "zipcode": "76000"},
        }],
        "tags": [{"id": 1, "name": "foo"}, {"id": 2, "name": "bar"}],
    })
}

// ============== Tests ==============

#[test]
fn test_complex_model_dump() {
    let ctx = TestContext::new();
    let wrapper = SchemaWrapper::new(&customer_declaration()).with_registry(ctx.registry());

    assert_eq!(wrapper.dump(&customer()).unwrap(), customer_json());
}

#[test]
fn test_complex_model_load() {
    let ctx = TestContext::new();
    let wrapper = SchemaWrapper::new(&customer_declaration()).with_registry(ctx.registry());

    let loaded = wrapper.load(&customer_json()).unwrap();
    assert!(matches!(loaded, Loaded::Data(_)));
    assert_eq!(loaded.to_json(), customer_json());
}

#[test]
fn test_complex_model_round_trip() {
    let ctx = TestContext::new();
    let wrapper = SchemaWrapper::new(&customer_declaration()).with_registry(ctx.registry());

    let dumped = wrapper.dump(&customer()).unwrap();
    let loaded = wrapper.load(&dumped).unwrap();
    assert_eq!(wrapper.dump(&loaded).unwrap(), dumped);
}

#[test]
fn test_nested_errors_are_keyed_by_index() {
    let ctx = TestContext::new();
    let wrapper = SchemaWrapper::new(&customer_declaration()).with_registry(ctx.registry());

    let errors = wrapper
        .validate(&json!({
            "id": 1,
            "name": "Alice",
            "addresses": [
                {"id": 1, "city": {"id": 1, "name": "Rouen"}},
                {"id": "x", "city": {"id": 2}},
            ],
        }))
        .unwrap();

    assert_eq!(
        errors.to_json(),
        json!({
            "addresses": {
                "1": {
                    "id": ["Not a valid integer."],
                    "city": {"name": ["Missing data for required field."]},
                },
            },
        })
    );
}

#[test]
fn test_generated_relationships_hold_primary_keys() {
    let ctx = TestContext::new();
    let declaration = SchemaDeclaration::builder("CustomerSchema")
        .model("Model.Customer")
        .build();
    let wrapper = SchemaWrapper::new(&declaration).with_registry(ctx.registry());

    assert_eq!(
        wrapper.dump(&customer()).unwrap(),
        json!({
            "id": 1,
            "name": "Alice",
            "addresses": [{"id": 1}],
            "tags": [{"id": 1}, {"id": 2}],
        })
    );

    let errors = wrapper
        .validate(&json!({"id": 1, "name": "Alice", "tags": [{"id": 1, "name": "foo"}]}))
        .unwrap();
    assert_eq!(
        errors.to_json(),
        json!({"tags": {"0": {"name": ["Unknown fields {'name'} on Model Model.Tag"]}}})
    );
}

#[test]
fn test_nested_schema_uses_call_registry() {
    let ctx = TestContext::new();
    let wrapper = SchemaWrapper::new(&customer_declaration());
    let call = SchemaSettings::new().with_registry(ctx.registry());

    assert_eq!(wrapper.dump_with(&customer(), &call).unwrap(), customer_json());

    // The nested city model is missing from this registry.
    let partial: Arc<dyn Registry> = Arc::new(
        MemoryRegistry::new()
            .with_model(customer_model())
            .with_model(address_model())
            .with_model(tag_model()),
    );
    let err = wrapper
        .dump_with(&customer(), &SchemaSettings::new().with_registry(partial))
        .unwrap_err();
    assert!(matches!(err, SchemaError::Catalog(_)));
}

#[test]
fn test_prefix_stripping() {
    let ctx = TestContext::new();
    let wrapper = SchemaWrapper::new(&exemple_declaration()).with_registry(ctx.registry());

    let schema = wrapper.schema().unwrap();
    assert_eq!(schema.field_names(), vec!["id", "name", "number", "properties"]);
    assert!(schema.field("orm_name").is_none());
}

#[test]
fn test_custom_column_prefix() {
    let registry: Arc<dyn Registry> = Arc::new(
        MemoryRegistry::new().with_column_prefix("x_").with_model(
            ModelDef::new("Model.Legacy")
                .with_field(FieldDef::primary_key("x_id", FieldType::Integer))
                .with_field(FieldDef::new("x_code", FieldType::String))
                .with_field(FieldDef::new("orm_label", FieldType::String)),
        ),
    );
    let declaration = SchemaDeclaration::builder("LegacySchema")
        .model("Model.Legacy")
        .registry(registry)
        .build();

    let schema = SchemaWrapper::new(&declaration).schema().unwrap();
    assert_eq!(schema.field_names(), vec!["id", "code", "orm_label"]);
}

#[test]
fn test_unknown_fields_rejected() {
    let ctx = TestContext::new();
    let wrapper = SchemaWrapper::new(&exemple_declaration()).with_registry(ctx.registry());

    let err = wrapper
        .load(&json!({"id": 1, "name": "foo", "unknown": 1, "another": "x"}))
        .unwrap_err();
    let messages = err.messages().unwrap();

    assert_eq!(
        messages.to_json(),
        json!({
            "another": ["Unknown fields {'another', 'unknown'} on Model Model.Exemple"],
            "unknown": ["Unknown fields {'another', 'unknown'} on Model Model.Exemple"],
        })
    );
}

#[test]
fn test_only_and_exclude_restrict_fields() {
    let ctx = TestContext::new();
    let wrapper = SchemaWrapper::new(&exemple_declaration())
        .with_registry(ctx.registry())
        .with_only(["id", "name", "number"])
        .with_exclude(["number"]);

    assert_eq!(wrapper.dump(&exemple(1, "foo")).unwrap(), json!({"id": 1, "name": "foo"}));

    let invalid = SchemaWrapper::new(&exemple_declaration())
        .with_registry(ctx.registry())
        .with_only(["nope"]);
    assert!(matches!(invalid.schema().unwrap_err(), SchemaError::Construction(_)));
}

#[test]
fn test_partial_reaches_nested_data() {
    let ctx = TestContext::new();
    let wrapper = SchemaWrapper::new(&customer_declaration())
        .with_registry(ctx.registry())
        .with_partial(Partial::All);

    let errors = wrapper
        .validate(&json!({"addresses": [{"city": {"id": 1}}]}))
        .unwrap();
    assert!(errors.is_empty());
}

#[test]
fn test_adapter_types_round_trip() {
    let registry: Arc<dyn Registry> = Arc::new(
        MemoryRegistry::new().with_model(
            ModelDef::new("Model.Kinds")
                .with_field(FieldDef::primary_key("id", FieldType::Integer))
                .with_field(FieldDef::new("blob", FieldType::Bytes))
                .with_field(FieldDef::new("color", FieldType::Color))
                .with_field(FieldDef::new("country", FieldType::Country))
                .with_field(FieldDef::new("phone", FieldType::PhoneNumber))
                .with_field(FieldDef::new("price", FieldType::Float))
                .with_field(FieldDef::new("active", FieldType::Boolean)),
        ),
    );
    let declaration = SchemaDeclaration::builder("KindsSchema")
        .model("Model.Kinds")
        .registry(registry)
        .build();
    let wrapper = SchemaWrapper::new(&declaration);

    let phone = phonenumber::parse(None, "+33 1 23 45 67 89").unwrap();
    let record = Record::new("Model.Kinds")
        .with("id", 1)
        .with("blob", b"hello".to_vec())
        .with("color", Color::new(255, 0, 16))
        .with("country", Country::from_alpha2("FR").unwrap())
        .with("phone", phone)
        .with("price", 9.5)
        .with("active", true);

    let dumped = wrapper.dump(&record).unwrap();
    assert_eq!(dumped["blob"], json!("aGVsbG8="));
    assert_eq!(dumped["color"], json!("#ff0010"));
    assert_eq!(dumped["country"], json!("FRA"));

    let loaded = wrapper.load(&dumped).unwrap();
    let data = loaded.data().unwrap();
    assert_eq!(data.get("blob"), Some(&Value::Bytes(b"hello".to_vec())));
    assert_eq!(wrapper.dump(&loaded).unwrap(), dumped);
}
