//! Request handlers, grouped by resource.

pub mod executions;
pub mod workflows;

use axum::http::{HeaderMap, StatusCode};

/// Identity of the caller, as stamped by the upstream gateway.
pub(crate) fn caller_id(headers: &HeaderMap) -> Result<String, StatusCode> {
    headers
        .get("x-user-id")
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
        .ok_or(StatusCode::UNAUTHORIZED)
}

pub(crate) fn db_error_status(err: &db::DbError) -> StatusCode {
    match err {
        db::DbError::NotFound => StatusCode::NOT_FOUND,
        db::DbError::NotAuthorized => StatusCode::FORBIDDEN,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
