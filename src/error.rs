//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Detail message for a missing record, shared by every backend.
pub const NOT_FOUND_DETAIL: &str = "Item not found";

/// Detail message for an insert rejected by a uniqueness or integrity constraint.
pub const KEY_EXISTS_DETAIL: &str = "Key already exists";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid identifier: '{0}'")]
    InvalidIdentifier(String),
    #[error("invalid prefix: '{0}'")]
    InvalidPrefix(String),
    #[error("schema {schema} has no primary key field '{field}'")]
    MissingPrimaryKey { schema: String, field: String },
    #[error("{backend} backend does not support {pk_type} primary keys")]
    UnsupportedPrimaryKey { backend: &'static str, pk_type: &'static str },
    #[error("config load: {0}")]
    Load(String),
    #[error("validation: {0}")]
    Validation(String),
}

/// One field-level validation problem, rendered as an element of `detail`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ValidationIssue {
    pub loc: Vec<String>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl ValidationIssue {
    pub fn new(location: &str, field: &str, msg: impl Into<String>, kind: impl Into<String>) -> Self {
        ValidationIssue {
            loc: vec![location.to_string(), field.to_string()],
            msg: msg.into(),
            kind: kind.into(),
        }
    }

    pub fn query(field: &str, msg: impl Into<String>) -> Self {
        Self::new("query", field, msg, "type_error.integer")
    }
}

#[derive(Error, Debug)]
pub enum CrudError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("item not found")]
    NotFound,
    #[error("validation failed: {0:?}")]
    Validation(Vec<ValidationIssue>),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("rejected ({status}): {detail}")]
    Rejected { status: StatusCode, detail: String },
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("internal: {0}")]
    Internal(String),
}

impl CrudError {
    pub fn validation(issue: ValidationIssue) -> Self {
        CrudError::Validation(vec![issue])
    }
}

impl From<serde_json::Error> for CrudError {
    fn from(e: serde_json::Error) -> Self {
        CrudError::Internal(format!("record (de)serialization: {}", e))
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum Detail {
    Message(String),
    Issues(Vec<ValidationIssue>),
}

#[derive(Serialize)]
struct ErrorBody {
    detail: Detail,
}

impl IntoResponse for CrudError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            CrudError::NotFound => (StatusCode::NOT_FOUND, Detail::Message(NOT_FOUND_DETAIL.into())),
            CrudError::Validation(issues) => (StatusCode::UNPROCESSABLE_ENTITY, Detail::Issues(issues)),
            CrudError::Conflict(msg) => (StatusCode::UNPROCESSABLE_ENTITY, Detail::Message(msg)),
            CrudError::Rejected { status, detail } => (status, Detail::Message(detail)),
            other => {
                tracing::error!(error = %other, "unhandled backend failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Detail::Message("Internal Server Error".into()),
                )
            }
        };
        (status, Json(ErrorBody { detail })).into_response()
    }
}
