//! Demo server: a `widgets` resource on the backend chosen by `CRUD_BACKEND`.
//!
//! Run from repo root: `cargo run -p crud-router-demo`
//! Environment: `BIND_ADDR`, `CRUD_BACKEND` (memory | sqlite | postgres), `DATABASE_URL`,
//! `SQLITE_PATH`, plus the `CRUD_*` router settings.

use crud_router::{
    common_routes, open_connection, router_config_from_env, CrudBackend, CrudRouter, DbDriver, FieldDef,
    MemoryBackend, PgBackend, Schema, SchemaDescriptor, SqliteBackend,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Widget {
    id: i64,
    name: String,
    price: f64,
}

impl Schema for Widget {
    fn descriptor() -> SchemaDescriptor {
        SchemaDescriptor::new("Widget")
            .field(FieldDef::integer("id"))
            .field(FieldDef::string("name").unique())
            .field(FieldDef::float("price"))
    }
}

async fn backend_from_env() -> Result<Arc<dyn CrudBackend<Widget>>, Box<dyn std::error::Error>> {
    let kind = std::env::var("CRUD_BACKEND").unwrap_or_else(|_| "memory".into());
    let backend: Arc<dyn CrudBackend<Widget>> = match kind.as_str() {
        "memory" => Arc::new(MemoryBackend::<Widget>::new()?),
        "sqlite" => {
            let path = std::env::var("SQLITE_PATH").unwrap_or_else(|_| "widgets.db".into());
            let backend = SqliteBackend::<Widget>::new(open_connection(&path)?, "widgets")?;
            backend.ensure_table().await?;
            Arc::new(backend)
        }
        "postgres" => {
            let database_url =
                std::env::var("DATABASE_URL").unwrap_or_else(|_| "postgres://localhost/crud_router".into());
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(5)
                .connect(&database_url)
                .await?;
            let backend =
                PgBackend::<Widget>::new(pool, "widgets")?.with_driver(DbDriver::from_url(&database_url));
            backend.ensure_table().await?;
            Arc::new(backend)
        }
        other => return Err(format!("unknown CRUD_BACKEND '{}'", other).into()),
    };
    Ok(backend)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("crud_router=info")),
        )
        .init();

    let config = router_config_from_env()?;
    let widgets = CrudRouter::from_arc(backend_from_env().await?)
        .with_config(&config)
        .build()?;
    let app = common_routes().merge(widgets);

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".into());
    let listener = TcpListener::bind(&addr).await?;
    let port = listener.local_addr()?.port();
    tracing::info!("crud-router demo listening on http://127.0.0.1:{}", port);
    axum::serve(listener, app).await?;
    Ok(())
}
