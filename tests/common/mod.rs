#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use crud_router::{FieldDef, Schema, SchemaDescriptor};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower::ServiceExt;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    pub id: i64,
    pub name: String,
    pub price: f64,
}

impl Schema for Widget {
    fn descriptor() -> SchemaDescriptor {
        SchemaDescriptor::new("Widget")
            .field(FieldDef::integer("id"))
            .field(FieldDef::string("name").unique())
            .field(FieldDef::float("price"))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Counter {
    pub id: i64,
    pub n: i64,
}

impl Schema for Counter {
    fn descriptor() -> SchemaDescriptor {
        SchemaDescriptor::new("Counter")
            .field(FieldDef::integer("id"))
            .field(FieldDef::integer("n"))
    }
}

/// Body error for an integer field that does not fit in i64.
pub fn out_of_range(field: &str) -> Value {
    serde_json::json!({"detail": [
        {"loc": ["body", field], "msg": "value is not a valid integer", "type": "type_error.integer"}
    ]})
}

/// Send one request and return the status and decoded JSON body (`Null` when empty).
pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    send_request(app, req).await
}

pub async fn send_request(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}
