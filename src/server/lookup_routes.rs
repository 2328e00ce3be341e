//! Encyclopedia preview route.

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use super::forms::optional_text;
use super::people_routes::fetch_biography;
use super::state::SharedWikipediaClient;

#[derive(Deserialize, Debug)]
pub(super) struct PreviewQuery {
    name: Option<String>,
}

/// Preview the biography the add-person flow would attach for a name.
/// A blank name answers with an all-null payload and no upstream call.
pub(super) async fn wikipedia_preview(
    State(wikipedia): State<SharedWikipediaClient>,
    Query(query): Query<PreviewQuery>,
) -> Response {
    let Some(name) = optional_text(query.name) else {
        return Json(json!({
            "summary": null,
            "url": null,
            "birth_year": null,
            "death_year": null,
        }))
        .into_response();
    };

    let biography = fetch_biography(&wikipedia, None, &name).await;
    Json(json!({
        "summary": biography.summary,
        "url": biography.url,
        "birth_year": biography.birth_year,
        "death_year": biography.death_year,
    }))
    .into_response()
}
