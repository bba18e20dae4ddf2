//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use ormschema::catalog::{FieldDef, FieldType, MemoryRegistry, ModelDef, RelationDef, Record, Registry, Value};
use ormschema::{Field, Nested, SchemaDeclaration};
use serde_json::json;

pub struct TestContext {
    pub registry: Arc<MemoryRegistry>,
}

impl TestContext {
    pub fn new() -> Self {
        init_tracing();
        let registry = MemoryRegistry::new()
            .with_model(exemple_model())
            .with_model(city_model())
            .with_model(address_model())
            .with_model(tag_model())
            .with_model(customer_model());
        Self {
            registry: Arc::new(registry),
        }
    }

    /// The registry as the trait object schemas consume.
    pub fn registry(&self) -> Arc<dyn Registry> {
        self.registry.clone()
    }

    pub fn insert(&self, record: Record) {
        self.registry.insert(record).unwrap();
    }

    /// Exemple records 1 "foo", 2 "bar", 3 "bar".
    pub fn seed_exemples(&self) {
        for (id, name) in [(1, "foo"), (2, "bar"), (3, "bar")] {
            self.insert(exemple(id, name));
        }
    }
}

/// Route the library's events to the test output, filtered by `RUST_LOG`.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn exemple_model() -> ModelDef {
    ModelDef::new("Model.Exemple")
        .with_field(FieldDef::primary_key("id", FieldType::Integer))
        .with_field(FieldDef::new("orm_name", FieldType::String).not_null())
        .with_field(FieldDef::new("number", FieldType::Integer))
        .with_field(FieldDef::new("properties", FieldType::Json))
}

pub fn city_model() -> ModelDef {
    ModelDef::new("Model.City")
        .with_field(FieldDef::primary_key("id", FieldType::Integer))
        .with_field(FieldDef::new("name", FieldType::String).not_null())
        .with_field(FieldDef::new("zipcode", FieldType::String))
}

pub fn address_model() -> ModelDef {
    ModelDef::new("Model.Address")
        .with_field(FieldDef::primary_key("id", FieldType::Integer))
        .with_field(FieldDef::new("street", FieldType::String))
        .with_field(FieldDef::relationship("city", RelationDef::many_to_one("Model.City")))
}

pub fn tag_model() -> ModelDef {
    ModelDef::new("Model.Tag")
        .with_field(FieldDef::primary_key("id", FieldType::Integer))
        .with_field(FieldDef::new("orm_name", FieldType::String))
}

pub fn customer_model() -> ModelDef {
    ModelDef::new("Model.Customer")
        .with_field(FieldDef::primary_key("id", FieldType::Integer))
        .with_field(FieldDef::new("orm_name", FieldType::String).not_null())
        .with_field(FieldDef::relationship(
            "addresses",
            RelationDef::one_to_many("Model.Address"),
        ))
        .with_field(FieldDef::relationship("tags", RelationDef::many_to_many("Model.Tag")))
}

pub fn exemple(id: i32, name: &str) -> Record {
    Record::new("Model.Exemple")
        .with("id", id)
        .with("name", name)
        .with("number", None::<i64>)
        .with("properties", Value::Json(json!({"name": ["foo", "bar"]})))
}

pub fn exemple_declaration() -> SchemaDeclaration {
    SchemaDeclaration::builder("ExempleSchema")
        .model("Model.Exemple")
        .build()
}

pub fn city_declaration() -> SchemaDeclaration {
    SchemaDeclaration::builder("CitySchema")
        .model("Model.City")
        .build()
}

pub fn tag_declaration() -> SchemaDeclaration {
    SchemaDeclaration::builder("TagSchema").model("Model.Tag").build()
}

pub fn address_declaration() -> SchemaDeclaration {
    SchemaDeclaration::builder("AddressSchema")
        .model("Model.Address")
        .field("city", Field::nested(Nested::schema(&city_declaration())))
        .build()
}

/// Customer with its addresses, their cities and its tags fully nested.
pub fn customer_declaration() -> SchemaDeclaration {
    SchemaDeclaration::builder("CustomerSchema")
        .model("Model.Customer")
        .field(
            "addresses",
            Field::nested(Nested::schema(&address_declaration()).many()),
        )
        .field("tags", Field::nested(Nested::schema(&tag_declaration()).many()))
        .build()
}

pub fn customer() -> Record {
    let city = Record::new("Model.City")
        .with("id", 1)
        .with("name", "Rouen")
        .with("zipcode", "76000");
    let address = Record::new("Model.Address")
        .with("id", 1)
        .with("street", "1 rue du Gros Horloge")
        .with("city", city);
    let tags = vec![
        Record::new("Model.Tag").with("id", 1).with("name", "foo"),
        Record::new("Model.Tag").with("id", 2).with("name", "bar"),
    ];

    Record::new("Model.Customer")
        .with("id", 1)
        .with("name", "Alice")
        .with("addresses", vec![address])
        .with("tags", tags)
}
