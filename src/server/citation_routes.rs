//! Citation listing and CRUD routes.
//!
//! Selection lists for the add/edit forms exclude books flagged complete;
//! the book an edited citation already points at is always kept selectable.

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use serde::Deserialize;
use serde_json::json;

use crate::catalog_store::BookListFilter;

use super::forms::{bad_request, checkbox, optional_text};
use super::server::error_response;
use super::state::GuardedCatalogStore;

#[derive(Deserialize, Debug)]
pub(super) struct CitationFormBody {
    person_id: Option<String>,
    book_id: Option<String>,
    page_number: Option<String>,
    notes: Option<String>,
    indirect_citation: Option<String>,
}

struct ParsedCitationForm {
    person_id: i64,
    book_id: i64,
    page_number: i64,
    notes: Option<String>,
    indirect_citation: bool,
}

fn parse_citation_form(body: CitationFormBody) -> Result<ParsedCitationForm, Response> {
    let person_id = optional_text(body.person_id)
        .and_then(|raw| raw.parse().ok())
        .ok_or_else(|| bad_request("A person is required."))?;
    let book_id = optional_text(body.book_id)
        .and_then(|raw| raw.parse().ok())
        .ok_or_else(|| bad_request("A book is required."))?;
    let page_number = optional_text(body.page_number)
        .and_then(|raw| raw.parse().ok())
        .ok_or_else(|| bad_request("A page number is required."))?;
    Ok(ParsedCitationForm {
        person_id,
        book_id,
        page_number,
        notes: optional_text(body.notes),
        indirect_citation: checkbox(body.indirect_citation),
    })
}

pub(super) async fn list_citations(State(store): State<GuardedCatalogStore>) -> Response {
    match store.list_citations() {
        Ok(citations) => Json(citations).into_response(),
        Err(err) => error_response(err),
    }
}

#[derive(Deserialize, Debug)]
pub(super) struct AddCitationFormQuery {
    book_id: Option<i64>,
    person_id: Option<i64>,
}

pub(super) async fn add_citation_form(
    State(store): State<GuardedCatalogStore>,
    Query(query): Query<AddCitationFormQuery>,
) -> Response {
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
    let person_types = match store.list_person_types() {
        Ok(types) => types,
        Err(err) => return error_response(err),
    };
    Json(json!({
        "books": books,
        "people": people,
        "person_types": person_types,
        "preselected_book_id": query.book_id,
        "preselected_person_id": query.person_id,
    }))
    .into_response()
}

pub(super) async fn add_citation(
    State(store): State<GuardedCatalogStore>,
    Form(body): Form<CitationFormBody>,
) -> Response {
    let form = match parse_citation_form(body) {
        Ok(form) => form,
        Err(response) => return response,
    };
    match store.add_citation(
        form.person_id,
        form.book_id,
        form.page_number,
        form.indirect_citation,
        form.notes.as_deref(),
    ) {
        Ok(id) => Json(json!({ "id": id })).into_response(),
        Err(err) => error_response(err),
    }
}

pub(super) async fn citations_for_person(
    State(store): State<GuardedCatalogStore>,
    Path(person_id): Path<i64>,
) -> Response {
    let person = match store.get_person(person_id) {
        Ok(person) => person,
        Err(err) => return error_response(err),
    };
    let citations = match store.get_citations_by_person(person_id) {
        Ok(citations) => citations,
        Err(err) => return error_response(err),
    };
    Json(json!({ "person": person, "citations": citations })).into_response()
}

pub(super) async fn edit_citation_form(
    State(store): State<GuardedCatalogStore>,
    Path(citation_id): Path<i64>,
) -> Response {
    let citation = match store.get_citation(citation_id) {
        Ok(citation) => citation,
        Err(err) => return error_response(err),
    };
    let books = match store.list_books(&BookListFilter::ExcludeCompleted {
        ensure_ids: vec![citation.book_id],
    }) {
        Ok(books) => books,
        Err(err) => return error_response(err),
    };
    let people = match store.list_people(None) {
        Ok(people) => people,
        Err(err) => return error_response(err),
    };
    Json(json!({
        "citation": citation,
        "books": books,
        "people": people,
    }))
    .into_response()
}

pub(super) async fn edit_citation(
    State(store): State<GuardedCatalogStore>,
    Path(citation_id): Path<i64>,
    Form(body): Form<CitationFormBody>,
) -> Response {
    let form = match parse_citation_form(body) {
        Ok(form) => form,
        Err(response) => return response,
    };
    match store.update_citation(
        citation_id,
        form.person_id,
        form.book_id,
        form.page_number,
        form.indirect_citation,
        form.notes.as_deref(),
    ) {
        Ok(()) => Json(json!({ "id": citation_id })).into_response(),
        Err(err) => error_response(err),
    }
}
