//! Router config validation and prefix normalization.

use crate::config::RouterConfig;
use crate::error::ConfigError;
use regex::Regex;

const PREFIX_PATTERN: &str = r"^[A-Za-z0-9_/-]*$";

/// Normalize a prefix to one leading `/` and no trailing `/`. The empty prefix becomes `""`.
pub fn normalize_prefix(prefix: &str) -> Result<String, ConfigError> {
    let re = Regex::new(PREFIX_PATTERN).map_err(|e| ConfigError::Validation(e.to_string()))?;
    if !re.is_match(prefix) {
        return Err(ConfigError::InvalidPrefix(prefix.to_string()));
    }
    let trimmed = prefix.trim_matches('/');
    if trimmed.split('/').any(str::is_empty) && !trimmed.is_empty() {
        return Err(ConfigError::InvalidPrefix(prefix.to_string()));
    }
    Ok(if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    })
}

pub fn validate_router_config(config: &RouterConfig) -> Result<(), ConfigError> {
    if config.paginate == Some(0) {
        return Err(ConfigError::Validation("paginate must be greater than zero".into()));
    }
    if config.body_limit == Some(0) {
        return Err(ConfigError::Validation("body_limit must be greater than zero".into()));
    }
    if let Some(prefix) = &config.prefix {
        normalize_prefix(prefix)?;
    }
    Ok(())
}
