//! People listing, CRUD, search and biography-enriched creation routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::catalog_store::PersonFields;
use crate::chronology::{current_year, lifespan, normalize_year, parse_year_field};
use crate::metadata::{Biography, WikipediaClient};

use super::forms::{bad_request, optional_text, parse_optional_id};
use super::server::error_response;
use super::state::{GuardedCatalogStore, SharedWikipediaClient};

/// Shown whenever a person name collides with an existing record.
const DUPLICATE_PERSON_MESSAGE: &str =
    "That person already exists. Please choose them from the list or edit their details.";

/// Look up a biography, preferring a known encyclopedia URL over a name
/// search. Transport failures degrade to the no-page result.
pub(super) async fn fetch_biography(
    wikipedia: &WikipediaClient,
    wiki_url: Option<&str>,
    name: &str,
) -> Biography {
    let result = match wiki_url {
        Some(url) => wikipedia.lookup_url(url).await,
        None => wikipedia.lookup(name).await,
    };
    match result {
        Ok(biography) => biography,
        Err(err) => {
            warn!("Biography lookup failed for {}: {}", name, err);
            Biography::no_page()
        }
    }
}

#[derive(Deserialize, Debug)]
pub(super) struct PersonFormBody {
    name: String,
    type_id: Option<String>,
    nationality_id: Option<String>,
    birth_year: Option<String>,
    birth_era: Option<String>,
    death_year: Option<String>,
    death_era: Option<String>,
    notes: Option<String>,
    wiki_url: Option<String>,
}

/// Parse the birth/death fields into signed years. The death field accepts
/// the "present" sentinel for living people.
fn parse_years(body: &PersonFormBody) -> Result<(Option<i32>, Option<i32>), Response> {
    let birth = match parse_year_field(body.birth_year.as_deref().unwrap_or("")) {
        Ok(year) => year,
        Err(_) => return Err(bad_request("Birth year must be a number.")),
    };
    let death = match parse_year_field(body.death_year.as_deref().unwrap_or("")) {
        Ok(year) => year,
        Err(_) => return Err(bad_request("Death year must be a number.")),
    };
    Ok((
        normalize_year(birth, body.birth_era.as_deref().unwrap_or("AD")),
        normalize_year(death, body.death_era.as_deref().unwrap_or("AD")),
    ))
}

pub(super) async fn list_people(State(store): State<GuardedCatalogStore>) -> Response {
    match store.list_people(None) {
        Ok(people) => Json(people).into_response(),
        Err(err) => error_response(err),
    }
}

#[derive(Deserialize, Debug)]
pub(super) struct AddPersonFormQuery {
    name: Option<String>,
}

pub(super) async fn add_person_form(
    State(store): State<GuardedCatalogStore>,
    Query(query): Query<AddPersonFormQuery>,
) -> Response {
    let person_types = match store.list_person_types() {
        Ok(types) => types,
        Err(err) => return error_response(err),
    };
    let nationalities = match store.list_nationalities() {
        Ok(nationalities) => nationalities,
        Err(err) => return error_response(err),
    };
    Json(json!({
        "person_types": person_types,
        "nationalities": nationalities,
        "name": query.name.unwrap_or_default(),
    }))
    .into_response()
}

pub(super) async fn add_person(
    State(store): State<GuardedCatalogStore>,
    State(wikipedia): State<SharedWikipediaClient>,
    Form(body): Form<PersonFormBody>,
) -> Response {
    let name = body.name.trim().to_string();
    if name.is_empty() {
        return bad_request("A name is required.");
    }
    match store.person_exists(&name) {
        Ok(true) => return bad_request(DUPLICATE_PERSON_MESSAGE),
        Ok(false) => {}
        Err(err) => return error_response(err),
    }

    let (birth_year, death_year) = match parse_years(&body) {
        Ok(years) => years,
        Err(response) => return response,
    };
    let type_id = match parse_optional_id(body.type_id, "Person type") {
        Ok(id) => id,
        Err(response) => return response,
    };
    let nationality_id = match parse_optional_id(body.nationality_id, "Nationality") {
        Ok(id) => id,
        Err(response) => return response,
    };

    let wiki_url = optional_text(body.wiki_url);
    let biography = fetch_biography(&wikipedia, wiki_url.as_deref(), &name).await;

    let fields = PersonFields {
        name,
        type_id,
        nationality_id,
        wiki_url: biography.url.clone(),
        bio_summary: Some(biography.summary.clone()),
        // Form-supplied years win; the encyclopedia only fills gaps.
        birth_year: birth_year.or(biography.birth_year),
        death_year: death_year.or(biography.death_year),
        notes: optional_text(body.notes),
    };

    match store.add_person(&fields) {
        Ok(id) => Json(json!({ "id": id, "name": fields.name })).into_response(),
        Err(err) => error_response(err),
    }
}

#[derive(Deserialize, Debug)]
pub(super) struct InlineAddPersonBody {
    name: Option<String>,
    type_id: Option<i64>,
    new_type_name: Option<String>,
    nationality_id: Option<i64>,
    new_nationality_name: Option<String>,
    birth_year: Option<i32>,
    birth_era: Option<String>,
    death_year: Option<i32>,
    death_era: Option<String>,
    notes: Option<String>,
}

pub(super) async fn inline_add_person(
    State(store): State<GuardedCatalogStore>,
    State(wikipedia): State<SharedWikipediaClient>,
    Json(body): Json<InlineAddPersonBody>,
) -> Response {
    let Some(name) = optional_text(body.name) else {
        return bad_request("A name is required.");
    };
    match store.person_exists(&name) {
        Ok(true) => return bad_request(DUPLICATE_PERSON_MESSAGE),
        Ok(false) => {}
        Err(err) => return error_response(err),
    }

    let type_id = match (body.type_id, optional_text(body.new_type_name)) {
        (Some(id), _) => Some(id),
        (None, Some(new_type_name)) => match store.ensure_person_type(&new_type_name) {
            Ok(id) => Some(id),
            Err(err) => return error_response(err),
        },
        (None, None) => None,
    };
    let nationality_id = match (body.nationality_id, optional_text(body.new_nationality_name)) {
        (Some(id), _) => Some(id),
        (None, Some(new_nationality_name)) => {
            match store.ensure_nationality(&new_nationality_name) {
                Ok(id) => Some(id),
                Err(err) => return error_response(err),
            }
        }
        (None, None) => None,
    };

    let biography = fetch_biography(&wikipedia, None, &name).await;

    let fields = PersonFields {
        name,
        type_id,
        nationality_id,
        wiki_url: biography.url.clone(),
        bio_summary: Some(biography.summary.clone()),
        birth_year: normalize_year(body.birth_year, body.birth_era.as_deref().unwrap_or("AD")),
        death_year: normalize_year(body.death_year, body.death_era.as_deref().unwrap_or("AD")),
        notes: optional_text(body.notes),
    };

    match store.add_person(&fields) {
        Ok(id) => Json(json!({ "id": id, "name": fields.name })).into_response(),
        Err(err) => error_response(err),
    }
}

#[derive(Deserialize, Debug)]
pub(super) struct SearchQuery {
    q: Option<String>,
}

pub(super) async fn search_people(
    State(store): State<GuardedCatalogStore>,
    Query(query): Query<SearchQuery>,
) -> Response {
    let term = query.q.unwrap_or_default();
    let people = match store.list_people(Some(term.trim())) {
        Ok(people) => people,
        Err(err) => return error_response(err),
    };
    let matches: Vec<_> = people
        .into_iter()
        .map(|p| json!({ "id": p.id, "text": p.name }))
        .collect();
    Json(matches).into_response()
}

pub(super) async fn people_list(State(store): State<GuardedCatalogStore>) -> Response {
    match store.list_people(None) {
        Ok(people) => Json(
            people
                .into_iter()
                .map(|p| json!({ "id": p.id, "name": p.name }))
                .collect::<Vec<_>>(),
        )
        .into_response(),
        Err(err) => error_response(err),
    }
}

pub(super) async fn view_person(
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
    let epigraphs = match store.get_epigraphs_by_person(person_id) {
        Ok(epigraphs) => epigraphs,
        Err(err) => return error_response(err),
    };
    let contributions = match store.get_contributions_by_person(person_id) {
        Ok(contributions) => contributions,
        Err(err) => return error_response(err),
    };
    let age = lifespan(person.birth_year, person.death_year, current_year());

    Json(json!({
        "person": person,
        "age": age,
        "citations": citations,
        "epigraphs": epigraphs,
        "contributions": contributions,
    }))
    .into_response()
}

pub(super) async fn edit_person_form(
    State(store): State<GuardedCatalogStore>,
    Path(person_id): Path<i64>,
) -> Response {
    let person = match store.get_person(person_id) {
        Ok(person) => person,
        Err(err) => return error_response(err),
    };
    let person_types = match store.list_person_types() {
        Ok(types) => types,
        Err(err) => return error_response(err),
    };
    let nationalities = match store.list_nationalities() {
        Ok(nationalities) => nationalities,
        Err(err) => return error_response(err),
    };
    Json(json!({
        "person": person,
        "person_types": person_types,
        "nationalities": nationalities,
    }))
    .into_response()
}

pub(super) async fn edit_person(
    State(store): State<GuardedCatalogStore>,
    State(wikipedia): State<SharedWikipediaClient>,
    Path(person_id): Path<i64>,
    Form(body): Form<PersonFormBody>,
) -> Response {
    let person = match store.get_person(person_id) {
        Ok(person) => person,
        Err(err) => return error_response(err),
    };

    let name = body.name.trim().to_string();
    if name.is_empty() {
        return bad_request("A name is required.");
    }

    let (birth_year, death_year) = match parse_years(&body) {
        Ok(years) => years,
        Err(response) => return response,
    };
    let type_id = match parse_optional_id(body.type_id, "Person type") {
        Ok(id) => id,
        Err(response) => return response,
    };
    let nationality_id = match parse_optional_id(body.nationality_id, "Nationality") {
        Ok(id) => id,
        Err(response) => return response,
    };

    // A newly supplied encyclopedia URL triggers a re-lookup; otherwise the
    // stored biography stays as it is.
    let provided_url = optional_text(body.wiki_url);
    let (wiki_url, bio_summary) = match provided_url {
        Some(url) if person.wiki_url.as_deref() != Some(url.as_str()) => {
            let biography = fetch_biography(&wikipedia, Some(&url), &name).await;
            (biography.url, Some(biography.summary))
        }
        _ => (person.wiki_url.clone(), person.bio_summary.clone()),
    };

    let fields = PersonFields {
        name,
        type_id,
        nationality_id,
        wiki_url,
        bio_summary,
        birth_year,
        death_year,
        notes: optional_text(body.notes),
    };

    match store.update_person(person_id, &fields) {
        Ok(()) => Json(json!({ "id": person_id, "name": fields.name })).into_response(),
        Err(err) => error_response(err),
    }
}

pub(super) async fn delete_person(
    State(store): State<GuardedCatalogStore>,
    Path(person_id): Path<i64>,
) -> Response {
    match store.delete_person(person_id) {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err) => error_response(err),
    }
}
