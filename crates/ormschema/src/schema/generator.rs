//! Field generation from model descriptors.

use ormschema_catalog::{FieldDef, FieldType, ModelHandle};
use tracing::{trace, warn};

use crate::config::RequiredFields;
use crate::fields::{Field, Nested};

/// Generate one field per model attribute, keyed by public name.
///
/// Prefixed attribute names lose the registry's column prefix. When the
/// stripped name is also the name of an unprefixed attribute, the
/// unprefixed attribute wins. Never fails: attributes the generator cannot
/// describe further become raw fields.
pub fn generate_fields(
    model: &ModelHandle,
    required: Option<&RequiredFields>,
) -> Vec<(String, Field)> {
    let descriptors = model.field_descriptors();
    let mut fields: Vec<(String, Field)> = Vec::with_capacity(descriptors.len());

    for descriptor in descriptors {
        let name = model.public_name(descriptor);
        let prefixed = name.len() != descriptor.name.len();
        let field = field_for(model, descriptor, name, required);

        match fields.iter().position(|(existing, _)| existing == name) {
            Some(_) if prefixed => {
                warn!(
                    model = model.name(),
                    attribute = %descriptor.name,
                    field = name,
                    "Prefixed attribute shadowed by an unprefixed one, skipping"
                );
                continue;
            }
            Some(index) => {
                warn!(
                    model = model.name(),
                    field = name,
                    "Unprefixed attribute replaces a prefixed one"
                );
                fields[index].1 = field;
            }
            None => {
                trace!(
                    model = model.name(),
                    field = name,
                    kind = field.type_name(),
                    required = field.is_required(),
                    allow_none = field.allows_none(),
                    "Generated field"
                );
                fields.push((name.to_string(), field));
            }
        }
    }

    fields
}

fn field_for(
    model: &ModelHandle,
    descriptor: &FieldDef,
    name: &str,
    required: Option<&RequiredFields>,
) -> Field {
    let field = match &descriptor.field_type {
        FieldType::Boolean => Field::boolean(),
        FieldType::Integer | FieldType::BigInteger => Field::integer(),
        FieldType::Float | FieldType::Decimal { .. } => Field::float(),
        FieldType::String => Field::string(),
        FieldType::Text => Field::text(),
        FieldType::Email => Field::email(),
        FieldType::Url => Field::url(),
        FieldType::Selection => match model.selection_choices(descriptor) {
            Some(choices) => Field::string().one_of(choices),
            None => Field::string(),
        },
        FieldType::Uuid => Field::uuid(),
        FieldType::Date => Field::date(),
        FieldType::DateTime => Field::datetime(),
        FieldType::Time => Field::time(),
        FieldType::Bytes => Field::file(),
        FieldType::Json => Field::dict(),
        FieldType::PhoneNumber => Field::phone_number(),
        FieldType::Country => Field::country(),
        FieldType::Color => Field::color(),
        FieldType::Relationship => match &descriptor.relation {
            Some(relation) => {
                Field::nested(Nested::related(&relation.model).with_many(relation.is_many()))
            }
            None => Field::raw(),
        },
        FieldType::Function | FieldType::Opaque(_) => Field::raw(),
    };

    let (is_required, allow_none) = match required {
        Some(RequiredFields::All) => (true, false),
        Some(RequiredFields::Only(names)) if names.iter().any(|n| n == name) => (true, false),
        Some(RequiredFields::Only(_)) => (false, descriptor.nullable),
        None => (descriptor.natively_required(), descriptor.nullable),
    };

    field.with_required(is_required).with_allow_none(allow_none)
}
