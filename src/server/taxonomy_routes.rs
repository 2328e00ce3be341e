//! Person-type and nationality management routes.
//!
//! Both are find-or-create on POST: submitting an existing name answers with
//! the existing row rather than erroring. Nationality deletion is refused
//! while any person references the row.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use serde::Deserialize;
use serde_json::json;

use super::forms::{bad_request, optional_text};
use super::server::error_response;
use super::state::GuardedCatalogStore;

#[derive(Deserialize, Debug)]
pub(super) struct NameFormBody {
    name: Option<String>,
}

pub(super) async fn list_person_types(State(store): State<GuardedCatalogStore>) -> Response {
    match store.list_person_types() {
        Ok(types) => Json(types).into_response(),
        Err(err) => error_response(err),
    }
}

pub(super) async fn add_person_type(
    State(store): State<GuardedCatalogStore>,
    Form(body): Form<NameFormBody>,
) -> Response {
    let Some(name) = optional_text(body.name) else {
        return bad_request("A name is required.");
    };
    match store.ensure_person_type(&name) {
        Ok(id) => Json(json!({ "id": id, "name": name })).into_response(),
        Err(err) => error_response(err),
    }
}

pub(super) async fn list_nationalities(State(store): State<GuardedCatalogStore>) -> Response {
    match store.list_nationalities() {
        Ok(nationalities) => Json(nationalities).into_response(),
        Err(err) => error_response(err),
    }
}

pub(super) async fn add_nationality(
    State(store): State<GuardedCatalogStore>,
    Form(body): Form<NameFormBody>,
) -> Response {
    let Some(name) = optional_text(body.name) else {
        return bad_request("A name is required.");
    };
    match store.ensure_nationality(&name) {
        Ok(id) => Json(json!({ "id": id, "name": name })).into_response(),
        Err(err) => error_response(err),
    }
}

pub(super) async fn rename_nationality(
    State(store): State<GuardedCatalogStore>,
    Path(nationality_id): Path<i64>,
    Form(body): Form<NameFormBody>,
) -> Response {
    let Some(name) = optional_text(body.name) else {
        return bad_request("A name is required.");
    };
    match store.rename_nationality(nationality_id, &name) {
        Ok(()) => Json(json!({ "id": nationality_id, "name": name })).into_response(),
        Err(err) => error_response(err),
    }
}

pub(super) async fn delete_nationality(
    State(store): State<GuardedCatalogStore>,
    Path(nationality_id): Path<i64>,
) -> Response {
    match store.delete_nationality(nationality_id) {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err) => error_response(err),
    }
}
