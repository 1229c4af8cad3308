//! Derive create/update descriptors from a base descriptor.

use super::descriptor::{PkType, SchemaDescriptor};

/// Builds `<base.name><suffix>` with every field of `base` except `pk_field`, all required.
/// Nullability is kept: a required nullable field must be sent, possibly as null.
pub fn schema_factory(base: &SchemaDescriptor, pk_field: &str, suffix: &str) -> SchemaDescriptor {
    let fields = base
        .fields
        .iter()
        .filter(|f| f.name != pk_field)
        .cloned()
        .map(|mut f| {
            f.required = true;
            f
        })
        .collect();
    SchemaDescriptor {
        name: format!("{}{}", base.name, suffix),
        pk_field: pk_field.to_string(),
        fields,
    }
}

pub fn derive_create_schema(base: &SchemaDescriptor) -> SchemaDescriptor {
    schema_factory(base, &base.pk_field, "Create")
}

pub fn derive_update_schema(base: &SchemaDescriptor) -> SchemaDescriptor {
    schema_factory(base, &base.pk_field, "Update")
}

/// Create descriptor used when the caller does not supply one.
/// Client-supplied (text) keys stay in the body, so the base schema is used as is.
pub fn default_create_schema(base: &SchemaDescriptor, pk_type: PkType) -> SchemaDescriptor {
    if pk_type.is_generated() {
        derive_create_schema(base)
    } else {
        let mut schema = base.clone();
        schema.name = format!("{}Create", base.name);
        schema
    }
}
