//! Needs a running PostgreSQL: `TEST_DATABASE_URL=postgres://... cargo test -- --ignored`.

mod common;

use axum::http::StatusCode;
use common::{send, Widget};
use crud_router::{CrudRouter, DbDriver, PgBackend};
use serde_json::json;

#[tokio::test]
#[ignore]
async fn postgres_round_trip_and_conflict() {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL");
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .unwrap();
    sqlx::query("DROP TABLE IF EXISTS crud_router_widgets").execute(&pool).await.unwrap();
    let backend = PgBackend::<Widget>::new(pool, "crud_router_widgets")
        .unwrap()
        .with_driver(DbDriver::from_url(&url));
    backend.ensure_table().await.unwrap();
    let app = CrudRouter::new(backend).prefix("/widgets").build().unwrap();

    let (status, created) = send(&app, "POST", "/widgets", Some(json!({"name": "Widget", "price": 9.99}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created, json!({"id": 1, "name": "Widget", "price": 9.99}));
    let (_, fetched) = send(&app, "GET", "/widgets/1", None).await;
    assert_eq!(fetched, created);

    let (status, body) = send(&app, "POST", "/widgets", Some(json!({"name": "Widget", "price": 1.0}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body, json!({"detail": "Key already exists"}));

    let (_, updated) = send(&app, "PUT", "/widgets/1", Some(json!({"price": 2.5}))).await;
    assert_eq!(updated["price"], json!(2.5));
    let (status, deleted) = send(&app, "DELETE", "/widgets/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["name"], json!("Widget"));
    let (status, _) = send(&app, "GET", "/widgets/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, all) = send(&app, "DELETE", "/widgets", None).await;
    assert_eq!(all, json!([]));
}
