//! Runtime field list of a schema: used for validation, derivation, and SQL generation.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Value kind of one field. Drives body validation, parameter binding, and column types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Integer,
    Float,
    String,
    Boolean,
    Uuid,
    DateTime,
    Json,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Integer => "integer",
            FieldKind::Float => "float",
            FieldKind::String => "string",
            FieldKind::Boolean => "boolean",
            FieldKind::Uuid => "uuid",
            FieldKind::DateTime => "datetime",
            FieldKind::Json => "json",
        }
    }
}

/// Primary key type for parsing path ids and choosing key generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PkType {
    Int,
    Uuid,
    Text,
}

impl PkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PkType::Int => "integer",
            PkType::Uuid => "uuid",
            PkType::Text => "text",
        }
    }

    /// Int keys come from a counter or the database; Uuid keys are generated in process.
    pub fn is_generated(&self) -> bool {
        matches!(self, PkType::Int | PkType::Uuid)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub kind: FieldKind,
    /// Must be present in a full (create) body.
    #[serde(default = "default_true")]
    pub required: bool,
    /// May be JSON null.
    #[serde(default)]
    pub nullable: bool,
    /// Backed by a UNIQUE column on the SQL backends.
    #[serde(default)]
    pub unique: bool,
}

fn default_true() -> bool {
    true
}

impl FieldDef {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        FieldDef {
            name: name.into(),
            kind,
            required: true,
            nullable: false,
            unique: false,
        }
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Float)
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::String)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    pub fn uuid(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Uuid)
    }

    pub fn datetime(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::DateTime)
    }

    pub fn json(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Json)
    }

    /// Not required and nullable, like an `Option<T>` field with a `None` default.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self.nullable = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    pub name: String,
    #[serde(default = "default_pk_field")]
    pub pk_field: String,
    pub fields: Vec<FieldDef>,
}

fn default_pk_field() -> String {
    "id".to_string()
}

impl SchemaDescriptor {
    /// New descriptor with primary key field `id` and no fields.
    pub fn new(name: impl Into<String>) -> Self {
        SchemaDescriptor {
            name: name.into(),
            pk_field: default_pk_field(),
            fields: Vec::new(),
        }
    }

    pub fn with_pk(mut self, pk_field: impl Into<String>) -> Self {
        self.pk_field = pk_field.into();
        self
    }

    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Primary key field definition. Errors when the descriptor does not declare it.
    pub fn primary_key(&self) -> Result<&FieldDef, ConfigError> {
        self.get(&self.pk_field).ok_or_else(|| ConfigError::MissingPrimaryKey {
            schema: self.name.clone(),
            field: self.pk_field.clone(),
        })
    }

    /// Primary key type introspected from the key field's kind.
    pub fn pk_type(&self) -> Result<PkType, ConfigError> {
        let pk = self.primary_key()?;
        match pk.kind {
            FieldKind::Integer => Ok(PkType::Int),
            FieldKind::Uuid => Ok(PkType::Uuid),
            FieldKind::String => Ok(PkType::Text),
            other => Err(ConfigError::Validation(format!(
                "primary key {}.{} cannot be of kind {}",
                self.name,
                pk.name,
                other.as_str()
            ))),
        }
    }
}

/// A record type served by the generated routes.
///
/// ```
/// use crud_router::{FieldDef, Schema, SchemaDescriptor};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, Debug, Serialize, Deserialize)]
/// struct Item {
///     id: i64,
///     name: String,
///     price: f64,
/// }
///
/// impl Schema for Item {
///     fn descriptor() -> SchemaDescriptor {
///         SchemaDescriptor::new("Item")
///             .field(FieldDef::integer("id"))
///             .field(FieldDef::string("name"))
///             .field(FieldDef::float("price"))
///     }
/// }
/// ```
pub trait Schema: Serialize + serde::de::DeserializeOwned + Clone + Send + Sync + 'static {
    fn descriptor() -> SchemaDescriptor;
}
