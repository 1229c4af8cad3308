//! Per-route guards checked against the request head before a handler runs.

use crate::error::CrudError;
use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// Pre-condition on a request. An `Err` short-circuits the route with that error.
#[async_trait]
pub trait RouteGuard: Send + Sync + 'static {
    async fn check(&self, parts: &Parts) -> Result<(), CrudError>;
}

#[async_trait]
impl<F> RouteGuard for F
where
    F: Fn(&Parts) -> Result<(), CrudError> + Send + Sync + 'static,
{
    async fn check(&self, parts: &Parts) -> Result<(), CrudError> {
        self(parts)
    }
}

pub type SharedGuard = Arc<dyn RouteGuard>;

/// Whether an operation is mounted, and if so behind which guards.
#[derive(Clone, Default)]
pub enum RouteSetting {
    #[default]
    Enabled,
    Disabled,
    Guarded(Vec<SharedGuard>),
}

impl RouteSetting {
    pub fn guarded<G: RouteGuard>(guard: G) -> Self {
        RouteSetting::Guarded(vec![Arc::new(guard)])
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, RouteSetting::Disabled)
    }
}

impl std::fmt::Debug for RouteSetting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteSetting::Enabled => f.write_str("Enabled"),
            RouteSetting::Disabled => f.write_str("Disabled"),
            RouteSetting::Guarded(g) => write!(f, "Guarded({} guards)", g.len()),
        }
    }
}

struct HeaderGuard {
    name: String,
    value: Option<String>,
}

#[async_trait]
impl RouteGuard for HeaderGuard {
    async fn check(&self, parts: &Parts) -> Result<(), CrudError> {
        let found = parts
            .headers
            .get(self.name.as_str())
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        let ok = match (&self.value, found) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(expected), Some(got)) => expected == got,
        };
        if ok {
            Ok(())
        } else {
            Err(CrudError::Rejected {
                status: StatusCode::UNAUTHORIZED,
                detail: format!("missing or invalid {} header", self.name),
            })
        }
    }
}

/// Guard requiring a non-empty header, optionally with an exact value. Rejects with 401.
pub fn require_header(name: impl Into<String>, value: Option<&str>) -> impl RouteGuard {
    HeaderGuard {
        name: name.into(),
        value: value.map(str::to_string),
    }
}

/// Middleware running the guards in order before the wrapped route.
pub(crate) async fn run_guards(
    State(guards): State<Arc<Vec<SharedGuard>>>,
    req: Request,
    next: Next,
) -> Response {
    let (parts, body) = req.into_parts();
    for guard in guards.iter() {
        if let Err(e) = guard.check(&parts).await {
            tracing::warn!(method = %parts.method, path = %parts.uri.path(), error = %e, "guard rejected request");
            return e.into_response();
        }
    }
    next.run(Request::from_parts(parts, body)).await
}
