//! Generated resource handlers: list, read, create, update, delete one, delete all.

use crate::error::{CrudError, ValidationIssue};
use crate::pagination::pagination_from_query;
use crate::schema::{parse_id, BodyValidator, Schema};
use crate::state::ResourceState;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use std::collections::HashMap;

/// Unwrap a JSON body, reporting a malformed one as a body validation issue.
/// An over-limit body keeps its 413.
fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, CrudError> {
    body.map(|Json(v)| v).map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return CrudError::Rejected {
                status: rejection.status(),
                detail: rejection.body_text(),
            };
        }
        CrudError::validation(ValidationIssue {
            loc: vec!["body".into()],
            msg: rejection.body_text(),
            kind: "value_error.jsondecode".into(),
        })
    })
}

pub async fn list<S: Schema>(
    State(state): State<ResourceState<S>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<S>>, CrudError> {
    let page = pagination_from_query(&params, state.max_limit)?;
    Ok(Json(state.backend.list(page).await?))
}

pub async fn read<S: Schema>(
    State(state): State<ResourceState<S>>,
    Path(item_id): Path<String>,
) -> Result<Json<S>, CrudError> {
    let id = parse_id(&item_id, state.pk_type)?;
    Ok(Json(state.backend.get_one(&id).await?))
}

pub async fn create<S: Schema>(
    State(state): State<ResourceState<S>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<S>), CrudError> {
    let body = BodyValidator::validate(json_body(body)?, &state.create_schema)?;
    let record = state.backend.create(body).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update<S: Schema>(
    State(state): State<ResourceState<S>>,
    Path(item_id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<S>, CrudError> {
    let id = parse_id(&item_id, state.pk_type)?;
    let body = BodyValidator::validate_partial(json_body(body)?, &state.update_schema)?;
    Ok(Json(state.backend.update(&id, body).await?))
}

pub async fn delete_one<S: Schema>(
    State(state): State<ResourceState<S>>,
    Path(item_id): Path<String>,
) -> Result<Json<S>, CrudError> {
    let id = parse_id(&item_id, state.pk_type)?;
    Ok(Json(state.backend.delete_one(&id).await?))
}

pub async fn delete_all<S: Schema>(State(state): State<ResourceState<S>>) -> Result<Json<Vec<S>>, CrudError> {
    Ok(Json(state.backend.delete_all().await?))
}
