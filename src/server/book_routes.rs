//! Book listing, CRUD and external bibliographic lookup routes.

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::catalog_store::{BookListFilter, ContributorRole};
use crate::metadata::BookLookupResult;
use crate::names::parse_name_list;

use super::forms::{bad_request, checkbox, optional_text};
use super::server::error_response;
use super::state::{GuardedCatalogStore, SharedOpenLibraryClient};

#[derive(Deserialize, Debug)]
pub(super) struct BookFormBody {
    title: String,
    publication_year: Option<String>,
    isbn: Option<String>,
    is_complete: Option<String>,
    authors: Option<String>,
    translators: Option<String>,
}

struct ParsedBookForm {
    title: String,
    publication_year: Option<i32>,
    isbn: Option<String>,
    is_complete: bool,
    authors: Vec<String>,
    translators: Vec<String>,
}

fn parse_book_form(body: BookFormBody) -> Result<ParsedBookForm, Response> {
    let title = body.title.trim().to_string();
    if title.is_empty() {
        return Err(bad_request("A title is required."));
    }
    let publication_year = match optional_text(body.publication_year) {
        Some(raw) => match raw.parse::<i32>() {
            Ok(year) => Some(year),
            Err(_) => return Err(bad_request("Publication year must be a number.")),
        },
        None => None,
    };
    Ok(ParsedBookForm {
        title,
        publication_year,
        isbn: optional_text(body.isbn),
        is_complete: checkbox(body.is_complete),
        authors: parse_name_list(body.authors.as_deref()),
        translators: parse_name_list(body.translators.as_deref()),
    })
}

fn reconcile_contributors(
    store: &GuardedCatalogStore,
    book_id: i64,
    form: &ParsedBookForm,
) -> Result<(), Response> {
    for (names, role) in [
        (&form.authors, ContributorRole::Author),
        (&form.translators, ContributorRole::Translator),
    ] {
        store
            .set_book_contributors(book_id, names, role, role.default_person_type())
            .map_err(error_response)?;
    }
    Ok(())
}

pub(super) async fn list_books(State(store): State<GuardedCatalogStore>) -> Response {
    match store.list_books(&BookListFilter::All) {
        Ok(books) => Json(books).into_response(),
        Err(err) => error_response(err),
    }
}

pub(super) async fn add_book(
    State(store): State<GuardedCatalogStore>,
    Form(body): Form<BookFormBody>,
) -> Response {
    let form = match parse_book_form(body) {
        Ok(form) => form,
        Err(response) => return response,
    };

    let book_id = match store.add_book(
        &form.title,
        form.publication_year,
        form.isbn.as_deref(),
        form.is_complete,
    ) {
        Ok(id) => id,
        Err(err) => return error_response(err),
    };

    if let Err(response) = reconcile_contributors(&store, book_id, &form) {
        return response;
    }
    Json(json!({ "id": book_id })).into_response()
}

pub(super) async fn edit_book_form(
    State(store): State<GuardedCatalogStore>,
    Path(book_id): Path<i64>,
) -> Response {
    let book = match store.get_book(book_id) {
        Ok(book) => book,
        Err(err) => return error_response(err),
    };
    let contributors = match store.get_book_contributors(book_id) {
        Ok(contributors) => contributors,
        Err(err) => return error_response(err),
    };
    Json(json!({ "book": book, "contributors": contributors })).into_response()
}

pub(super) async fn edit_book(
    State(store): State<GuardedCatalogStore>,
    Path(book_id): Path<i64>,
    Form(body): Form<BookFormBody>,
) -> Response {
    let form = match parse_book_form(body) {
        Ok(form) => form,
        Err(response) => return response,
    };

    if let Err(err) = store.update_book(
        book_id,
        &form.title,
        form.publication_year,
        form.isbn.as_deref(),
        form.is_complete,
    ) {
        return error_response(err);
    }

    if let Err(response) = reconcile_contributors(&store, book_id, &form) {
        return response;
    }
    Json(json!({ "id": book_id })).into_response()
}

pub(super) async fn view_book(
    State(store): State<GuardedCatalogStore>,
    Path(book_id): Path<i64>,
) -> Response {
    let book = match store.get_book(book_id) {
        Ok(book) => book,
        Err(err) => return error_response(err),
    };
    let contributors = match store.get_book_contributors(book_id) {
        Ok(contributors) => contributors,
        Err(err) => return error_response(err),
    };
    let citations = match store.get_citations_by_book(book_id) {
        Ok(citations) => citations,
        Err(err) => return error_response(err),
    };
    let epigraphs = match store.get_epigraphs_by_book(book_id) {
        Ok(epigraphs) => epigraphs,
        Err(err) => return error_response(err),
    };
    Json(json!({
        "book": book,
        "contributors": contributors,
        "citations": citations,
        "epigraphs": epigraphs,
    }))
    .into_response()
}

#[derive(Deserialize, Debug)]
pub(super) struct BookLookupBody {
    title: Option<String>,
    author: Option<String>,
    isbn: Option<String>,
}

/// External lookup: a supplied ISBN (dashes stripped) wins over a
/// title+author search. Upstream failures degrade to an empty result list.
pub(super) async fn lookup_books(
    State(open_library): State<SharedOpenLibraryClient>,
    Form(body): Form<BookLookupBody>,
) -> Response {
    let isbn = body
        .isbn
        .unwrap_or_default()
        .replace('-', "")
        .trim()
        .to_string();
    let title = optional_text(body.title);
    let author = optional_text(body.author);

    let results: Vec<BookLookupResult> = if !isbn.is_empty() {
        match open_library.lookup_isbn(&isbn).await {
            Ok(result) => result.into_iter().collect(),
            Err(err) => {
                warn!("Open Library ISBN lookup failed: {}", err);
                Vec::new()
            }
        }
    } else if let (Some(title), Some(author)) = (title, author) {
        match open_library.search(&title, &author).await {
            Ok(results) => results,
            Err(err) => {
                warn!("Open Library search failed: {}", err);
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    Json(results).into_response()
}
