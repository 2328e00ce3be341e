//! Epigraph listing and CRUD routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use serde::Deserialize;
use serde_json::json;

use crate::catalog_store::BookListFilter;

use super::forms::{bad_request, optional_text};
use super::server::error_response;
use super::state::GuardedCatalogStore;

#[derive(Deserialize, Debug)]
pub(super) struct EpigraphFormBody {
    book_id: Option<String>,
    author_id: Option<String>,
    quote: Option<String>,
    notes: Option<String>,
}

struct ParsedEpigraphForm {
    book_id: i64,
    author_id: i64,
    quote: String,
    notes: Option<String>,
}

/// An epigraph needs a book, a selected author and non-empty quote text.
fn parse_epigraph_form(body: EpigraphFormBody) -> Result<ParsedEpigraphForm, Response> {
    let book_id = optional_text(body.book_id)
        .and_then(|raw| raw.parse().ok())
        .ok_or_else(|| bad_request("A book is required."))?;
    let author_id = optional_text(body.author_id)
        .and_then(|raw| raw.parse().ok())
        .ok_or_else(|| bad_request("An author is required."))?;
    let quote =
        optional_text(body.quote).ok_or_else(|| bad_request("Epigraph text is required."))?;
    Ok(ParsedEpigraphForm {
        book_id,
        author_id,
        quote,
        notes: optional_text(body.notes),
    })
}

pub(super) async fn list_epigraphs(State(store): State<GuardedCatalogStore>) -> Response {
    match store.list_epigraphs() {
        Ok(epigraphs) => Json(epigraphs).into_response(),
        Err(err) => error_response(err),
    }
}

pub(super) async fn add_epigraph_form(State(store): State<GuardedCatalogStore>) -> Response {
    let books = match store.list_books(&BookListFilter::ExcludeCompleted {
        ensure_ids: vec![],
    }) {
        Ok(books) => books,
        Err(err) => return error_response(err),
    };
    let people = match store.list_people(None) {
        Ok(people) => people,
        Err(err) => return error_response(err),
    };
    Json(json!({ "books": books, "people": people })).into_response()
}

pub(super) async fn add_epigraph(
    State(store): State<GuardedCatalogStore>,
    Form(body): Form<EpigraphFormBody>,
) -> Response {
    let form = match parse_epigraph_form(body) {
        Ok(form) => form,
        Err(response) => return response,
    };
    match store.add_epigraph(
        form.book_id,
        form.author_id,
        &form.quote,
        form.notes.as_deref(),
    ) {
        Ok(id) => Json(json!({ "id": id })).into_response(),
        Err(err) => error_response(err),
    }
}

pub(super) async fn edit_epigraph_form(
    State(store): State<GuardedCatalogStore>,
    Path(epigraph_id): Path<i64>,
) -> Response {
    let epigraph = match store.get_epigraph(epigraph_id) {
        Ok(epigraph) => epigraph,
        Err(err) => return error_response(err),
    };
    let books = match store.list_books(&BookListFilter::ExcludeCompleted {
        ensure_ids: vec![epigraph.book_id],
    }) {
        Ok(books) => books,
        Err(err) => return error_response(err),
    };
    let people = match store.list_people(None) {
        Ok(people) => people,
        Err(err) => return error_response(err),
    };
    Json(json!({
        "epigraph": epigraph,
        "books": books,
        "people": people,
    }))
    .into_response()
}

pub(super) async fn edit_epigraph(
    State(store): State<GuardedCatalogStore>,
    Path(epigraph_id): Path<i64>,
    Form(body): Form<EpigraphFormBody>,
) -> Response {
    let form = match parse_epigraph_form(body) {
        Ok(form) => form,
        Err(response) => return response,
    };
    match store.update_epigraph(
        epigraph_id,
        form.book_id,
        form.author_id,
        &form.quote,
        form.notes.as_deref(),
    ) {
        Ok(()) => Json(json!({ "id": epigraph_id })).into_response(),
        Err(err) => error_response(err),
    }
}

pub(super) async fn delete_epigraph(
    State(store): State<GuardedCatalogStore>,
    Path(epigraph_id): Path<i64>,
) -> Response {
    match store.delete_epigraph(epigraph_id) {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err) => error_response(err),
    }
}
