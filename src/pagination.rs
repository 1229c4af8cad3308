//! Skip/limit windowing for list routes.

use crate::error::{CrudError, ValidationIssue};
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pagination {
    pub skip: u64,
    pub limit: Option<u64>,
}

impl Pagination {
    /// Whole collection: skip 0, no limit.
    pub fn all() -> Self {
        Pagination::default()
    }

    /// Apply the window to an in-memory slice. Offsets past the end yield an empty slice.
    pub fn window<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = usize::try_from(self.skip).unwrap_or(usize::MAX).min(items.len());
        let rest = &items[start..];
        match self.limit {
            Some(limit) => &rest[..usize::try_from(limit).unwrap_or(usize::MAX).min(rest.len())],
            None => rest,
        }
    }
}

/// Validate skip/limit against an optional maximum page size.
/// Rules, in order: negative skip, non-positive limit, limit above the maximum.
pub fn validate_pagination(skip: i64, limit: Option<i64>, max_limit: Option<u32>) -> Result<Pagination, CrudError> {
    if skip < 0 {
        return Err(CrudError::validation(ValidationIssue::query(
            "skip",
            "skip query parameter must be greater or equal to zero",
        )));
    }
    if let Some(limit) = limit {
        if limit <= 0 {
            return Err(CrudError::validation(ValidationIssue::query(
                "limit",
                "limit query parameter must be greater than zero",
            )));
        }
        if let Some(max) = max_limit {
            if limit > i64::from(max) {
                return Err(CrudError::validation(ValidationIssue::query(
                    "limit",
                    format!("limit query parameter must be less than {}", max),
                )));
            }
        }
    }
    Ok(Pagination {
        skip: skip as u64,
        limit: limit.map(|l| l as u64),
    })
}

/// Read `skip` and `limit` from query params. A missing limit falls back to the maximum page size.
pub fn pagination_from_query(
    params: &HashMap<String, String>,
    max_limit: Option<u32>,
) -> Result<Pagination, CrudError> {
    let skip = match params.get("skip") {
        Some(s) => parse_int("skip", s)?,
        None => 0,
    };
    let limit = match params.get("limit") {
        Some(s) => Some(parse_int("limit", s)?),
        None => max_limit.map(i64::from),
    };
    validate_pagination(skip, limit, max_limit)
}

fn parse_int(field: &str, raw: &str) -> Result<i64, CrudError> {
    raw.trim()
        .parse()
        .map_err(|_| CrudError::validation(ValidationIssue::query(field, "value is not a valid integer")))
}
