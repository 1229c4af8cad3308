//! Load router config from a JSON file or from environment variables.

use crate::config::{validate_router_config, CrudOperation, RouterConfig};
use crate::error::ConfigError;
use std::path::Path;

pub const ENV_PREFIX: &str = "CRUD_PREFIX";
pub const ENV_PAGINATE: &str = "CRUD_PAGINATE";
pub const ENV_BODY_LIMIT: &str = "CRUD_BODY_LIMIT";
/// Comma-separated operation names, e.g. `delete_all,update`.
pub const ENV_DISABLED_ROUTES: &str = "CRUD_DISABLED_ROUTES";

/// Read and validate a JSON router config file.
pub fn load_router_config(path: impl AsRef<Path>) -> Result<RouterConfig, ConfigError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    let config: RouterConfig =
        serde_json::from_str(&raw).map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    validate_router_config(&config)?;
    Ok(config)
}

/// Build a router config from the process environment.
pub fn router_config_from_env() -> Result<RouterConfig, ConfigError> {
    router_config_from_vars(|key| std::env::var(key).ok())
}

/// Build a router config from any variable lookup.
pub fn router_config_from_vars<F>(lookup: F) -> Result<RouterConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
    let mut config = RouterConfig {
        prefix: get(ENV_PREFIX),
        ..Default::default()
    };
    if let Some(raw) = get(ENV_PAGINATE) {
        config.paginate = Some(
            raw.parse()
                .map_err(|_| ConfigError::Load(format!("{}: not a number: {}", ENV_PAGINATE, raw)))?,
        );
    }
    if let Some(raw) = get(ENV_BODY_LIMIT) {
        config.body_limit = Some(
            raw.parse()
                .map_err(|_| ConfigError::Load(format!("{}: not a number: {}", ENV_BODY_LIMIT, raw)))?,
        );
    }
    if let Some(raw) = get(ENV_DISABLED_ROUTES) {
        for name in raw.split(',').filter(|s| !s.trim().is_empty()) {
            let op: CrudOperation = name
                .parse()
                .map_err(|e| ConfigError::Load(format!("{}: {}", ENV_DISABLED_ROUTES, e)))?;
            config.routes.disable(op);
        }
    }
    validate_router_config(&config)?;
    Ok(config)
}
