mod common;

use axum::{body::Body, http::{Request, StatusCode}, Router};
use common::{out_of_range, send, send_request, Counter, Widget};
use crud_router::{
    common_routes, require_header, CrudOperation, CrudRouter, MemoryBackend, RouteSetting, RouterConfig,
};
use serde_json::json;

fn widgets() -> CrudRouter<Widget> {
    CrudRouter::new(MemoryBackend::<Widget>::new().unwrap()).prefix("/widgets")
}

fn app() -> Router {
    widgets().build().unwrap()
}

#[tokio::test]
async fn create_get_delete_then_not_found() {
    let app = app();
    let (status, created) = send(&app, "POST", "/widgets", Some(json!({"name": "Widget", "price": 9.99}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created, json!({"id": 1, "name": "Widget", "price": 9.99}));

    let (status, fetched) = send(&app, "GET", "/widgets/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, deleted) = send(&app, "DELETE", "/widgets/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted, created);

    let (status, body) = send(&app, "GET", "/widgets/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"detail": "Item not found"}));
}

#[tokio::test]
async fn default_prefix_is_the_lowercased_schema_name() {
    let app = CrudRouter::new(MemoryBackend::<Widget>::new().unwrap()).build().unwrap();
    let (status, body) = send(&app, "GET", "/widget", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn update_is_partial_and_keeps_the_id() {
    let app = app();
    send(&app, "POST", "/widgets", Some(json!({"name": "Widget", "price": 9.99}))).await;
    let (status, updated) = send(&app, "PUT", "/widgets/1", Some(json!({"id": 7, "price": 1.5}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated, json!({"id": 1, "name": "Widget", "price": 1.5}));

    let (status, _) = send(&app, "PUT", "/widgets/99", Some(json!({"price": 1.5}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_all_empties_and_ids_keep_counting() {
    let app = app();
    for name in ["a", "b", "c"] {
        send(&app, "POST", "/widgets", Some(json!({"name": name, "price": 1.0}))).await;
    }
    let (status, body) = send(&app, "DELETE", "/widgets", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
    let (_, body) = send(&app, "GET", "/widgets", None).await;
    assert_eq!(body, json!([]));
    let (_, created) = send(&app, "POST", "/widgets", Some(json!({"name": "d", "price": 1.0}))).await;
    assert_eq!(created["id"], json!(4));
}

#[tokio::test]
async fn pagination_windows_and_default_limit() {
    let app = widgets().paginate(3).build().unwrap();
    for i in 0..5 {
        send(&app, "POST", "/widgets", Some(json!({"name": format!("w{i}"), "price": 1.0}))).await;
    }
    let (_, body) = send(&app, "GET", "/widgets", None).await;
    assert_eq!(body.as_array().unwrap().len(), 3);
    let (_, body) = send(&app, "GET", "/widgets?skip=3&limit=3", None).await;
    let ids: Vec<i64> = body.as_array().unwrap().iter().map(|w| w["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![4, 5]);
    let (_, body) = send(&app, "GET", "/widgets?skip=10", None).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn invalid_pagination_is_a_query_error() {
    let app = widgets().paginate(10).build().unwrap();
    let cases = [
        ("/widgets?skip=-1", "skip", "skip query parameter must be greater or equal to zero"),
        ("/widgets?limit=0", "limit", "limit query parameter must be greater than zero"),
        ("/widgets?limit=11", "limit", "limit query parameter must be less than 10"),
        ("/widgets?limit=ten", "limit", "value is not a valid integer"),
    ];
    for (uri, field, msg) in cases {
        let (status, body) = send(&app, "GET", uri, None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{uri}");
        assert_eq!(
            body,
            json!({"detail": [{"loc": ["query", field], "msg": msg, "type": "type_error.integer"}]}),
            "{uri}"
        );
    }
    let (status, _) = send(&app, "GET", "/widgets?limit=10", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn body_problems_are_reported_per_field() {
    let app = app();
    let (status, body) = send(&app, "POST", "/widgets", Some(json!({"price": "cheap"}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body,
        json!({"detail": [
            {"loc": ["body", "name"], "msg": "field required", "type": "value_error.missing"},
            {"loc": ["body", "price"], "msg": "value is not a valid float", "type": "type_error.float"}
        ]})
    );

    let req = Request::builder()
        .method("POST")
        .uri("/widgets")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send_request(&app, req).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"][0]["type"], json!("value_error.jsondecode"));
}

#[tokio::test]
async fn malformed_id_is_a_path_error() {
    let app = app();
    let (status, body) = send(&app, "GET", "/widgets/abc", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"][0]["loc"], json!(["path", "item_id"]));
}

#[tokio::test]
async fn disabled_routes_are_not_mounted() {
    let app = widgets()
        .delete_one_route(RouteSetting::Disabled)
        .delete_all_route(RouteSetting::Disabled)
        .build()
        .unwrap();
    send(&app, "POST", "/widgets", Some(json!({"name": "a", "price": 1.0}))).await;
    let (status, _) = send(&app, "DELETE", "/widgets/1", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    let (status, _) = send(&app, "DELETE", "/widgets", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    let app = widgets()
        .get_one_route(RouteSetting::Disabled)
        .update_route(RouteSetting::Disabled)
        .delete_one_route(RouteSetting::Disabled)
        .build()
        .unwrap();
    let (status, _) = send(&app, "GET", "/widgets/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn config_toggles_disable_routes() {
    let mut config = RouterConfig { paginate: Some(2), ..Default::default() };
    config.routes.disable(CrudOperation::Create);
    let app = widgets().with_config(&config).build().unwrap();
    let (status, _) = send(&app, "POST", "/widgets", Some(json!({"name": "a", "price": 1.0}))).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    let (status, _) = send(&app, "GET", "/widgets?limit=3", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn guarded_routes_reject_before_the_handler() {
    let app = widgets()
        .delete_all_route(RouteSetting::guarded(require_header("x-admin", Some("yes"))))
        .build()
        .unwrap();
    send(&app, "POST", "/widgets", Some(json!({"name": "a", "price": 1.0}))).await;

    let (status, body) = send(&app, "DELETE", "/widgets", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"detail": "missing or invalid x-admin header"}));
    let (_, body) = send(&app, "GET", "/widgets", None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let req = Request::builder()
        .method("DELETE")
        .uri("/widgets")
        .header("x-admin", "yes")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send_request(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn oversized_bodies_are_refused() {
    let app = widgets().body_limit(32).build().unwrap();
    let long = "x".repeat(64);
    let (status, _) = send(&app, "POST", "/widgets", Some(json!({"name": long, "price": 1.0}))).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn invalid_prefix_fails_the_build() {
    assert!(widgets().prefix("/bad prefix").build().is_err());
    assert!(widgets().paginate(0).build().is_err());
}

#[tokio::test]
async fn common_routes_answer() {
    let app = common_routes().merge(app());
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
    let (_, body) = send(&app, "GET", "/version", None).await;
    assert_eq!(body["name"], json!("crud-router"));
}

#[tokio::test]
async fn integers_beyond_i64_are_body_errors() {
    let app = CrudRouter::new(MemoryBackend::<Counter>::new().unwrap()).build().unwrap();
    let (status, body) = send(&app, "POST", "/counter", Some(json!({"n": u64::MAX}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body, out_of_range("n"));

    let (status, created) = send(&app, "POST", "/counter", Some(json!({"n": 1}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created, json!({"id": 1, "n": 1}));

    let (status, body) = send(&app, "PUT", "/counter/1", Some(json!({"n": u64::MAX}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body, out_of_range("n"));
}
