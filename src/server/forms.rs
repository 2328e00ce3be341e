//! Shared helpers for form field parsing.
//!
//! Most validation here is "trim and treat empty as absent"; the handlers
//! decide which absences are errors.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Trim a field; empty (or missing) input becomes `None`.
pub(super) fn optional_text(value: Option<String>) -> Option<String> {
    value.and_then(|raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// HTML checkboxes submit "on" when ticked and nothing otherwise.
pub(super) fn checkbox(value: Option<String>) -> bool {
    value.as_deref() == Some("on")
}

/// Parse an optional id field submitted as text (select inputs send an empty
/// string when nothing is chosen).
pub(super) fn parse_optional_id(
    value: Option<String>,
    field: &str,
) -> Result<Option<i64>, Response> {
    match optional_text(value) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| bad_request(&format!("{} must be numeric.", field))),
    }
}

pub(super) fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}
