//! The six-operation CRUD contract and its backends.

pub mod integrity;
pub mod memory;
pub mod postgres;
pub mod sqlite;

use crate::error::{ConfigError, CrudError, ValidationIssue};
use crate::pagination::Pagination;
use crate::schema::{PkType, Schema, SchemaDescriptor};
use async_trait::async_trait;
use regex::Regex;
use serde_json::{Map, Value};

pub use integrity::DbDriver;
pub use memory::MemoryBackend;
pub use postgres::PgBackend;
pub use sqlite::SqliteBackend;

/// Persistence strategy behind a generated resource.
///
/// Bodies arrive already validated and restricted to the descriptor's fields; ids arrive parsed
/// according to the primary key type.
#[async_trait]
pub trait CrudBackend<S: Schema>: Send + Sync + 'static {
    fn descriptor(&self) -> &SchemaDescriptor;

    /// URL prefix used when the router is not given one.
    fn default_prefix(&self) -> String;

    async fn list(&self, page: Pagination) -> Result<Vec<S>, CrudError>;

    async fn get_one(&self, id: &Value) -> Result<S, CrudError>;

    async fn create(&self, body: Map<String, Value>) -> Result<S, CrudError>;

    async fn update(&self, id: &Value, body: Map<String, Value>) -> Result<S, CrudError>;

    async fn delete_one(&self, id: &Value) -> Result<S, CrudError>;

    /// Clears the store and returns the remaining (empty) collection, unpaginated.
    async fn delete_all(&self) -> Result<Vec<S>, CrudError>;
}

const IDENTIFIER_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*$";

/// Reject table and column names that are not plain SQL identifiers.
pub fn validate_identifier(name: &str) -> Result<(), ConfigError> {
    let re = Regex::new(IDENTIFIER_PATTERN).map_err(|e| ConfigError::Validation(e.to_string()))?;
    if re.is_match(name) {
        Ok(())
    } else {
        Err(ConfigError::InvalidIdentifier(name.to_string()))
    }
}

/// Validate the table name and every field name of a descriptor, and that it declares its key.
pub fn validate_table(table: &str, schema: &SchemaDescriptor) -> Result<(), ConfigError> {
    validate_identifier(table)?;
    for name in schema.field_names() {
        validate_identifier(name)?;
    }
    schema.pk_type()?;
    Ok(())
}

/// Fill in or require the primary key of a create body for a SQL backend.
/// Integer keys are left to the database, uuid keys are generated here, text keys must be supplied.
pub(crate) fn prepare_key(
    schema: &SchemaDescriptor,
    pk_type: PkType,
    body: &mut Map<String, Value>,
) -> Result<(), CrudError> {
    let pk = &schema.pk_field;
    if body.get(pk).is_some_and(|v| !v.is_null()) {
        return Ok(());
    }
    body.remove(pk);
    match pk_type {
        PkType::Int => Ok(()),
        PkType::Uuid => {
            body.insert(pk.clone(), Value::String(uuid::Uuid::new_v4().to_string()));
            Ok(())
        }
        PkType::Text => Err(CrudError::validation(ValidationIssue::new(
            "body",
            pk,
            "field required",
            "value_error.missing",
        ))),
    }
}

/// Decode a JSON row into the schema type.
pub(crate) fn from_row<S: Schema>(row: Value) -> Result<S, CrudError> {
    Ok(serde_json::from_value(row)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldDef;

    #[test]
    fn identifiers() {
        assert!(validate_identifier("order_items").is_ok());
        assert!(validate_identifier("_x1").is_ok());
        assert!(validate_identifier("1abc").is_err());
        assert!(validate_identifier("items; DROP TABLE x").is_err());
        assert!(validate_identifier("").is_err());
    }

    #[test]
    fn keys_by_type() {
        let schema = SchemaDescriptor::new("Doc").field(FieldDef::uuid("id"));
        let mut body = Map::new();
        prepare_key(&schema, PkType::Uuid, &mut body).unwrap();
        assert!(uuid::Uuid::parse_str(body["id"].as_str().unwrap()).is_ok());

        let mut body = Map::new();
        body.insert("id".into(), Value::Null);
        prepare_key(&schema, PkType::Int, &mut body).unwrap();
        assert!(body.is_empty());

        let mut body = Map::new();
        assert!(matches!(
            prepare_key(&schema, PkType::Text, &mut body),
            Err(CrudError::Validation(_))
        ));
    }

    #[test]
    fn table_needs_its_primary_key() {
        let schema = SchemaDescriptor::new("Item").field(FieldDef::string("name"));
        assert!(matches!(
            validate_table("items", &schema),
            Err(ConfigError::MissingPrimaryKey { .. })
        ));
    }
}
