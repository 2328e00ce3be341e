use anyhow::Result;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tower_http::services::ServeDir;

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;

use super::{
    book_routes, citation_routes, epigraph_routes, log_requests, lookup_routes, people_routes,
    state::ServerState, taxonomy_routes, RequestsLoggingLevel, ServerConfig,
};
use crate::catalog_store::{CatalogStore, StoreError};
use crate::metadata::{OpenLibraryClient, WikipediaClient};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
    };
    Json(stats)
}

/// Map a store error onto the HTTP surface: validation and uniqueness
/// problems are the caller's fault, referential conflicts are surfaced as a
/// warning payload, missing rows terminate the request as not-found.
pub(super) fn error_response(err: StoreError) -> Response {
    match err {
        StoreError::DuplicatePersonName(_) => {
            (StatusCode::BAD_REQUEST, Json(json!({ "error": err.to_string() }))).into_response()
        }
        StoreError::DuplicateNationalityName(_) | StoreError::NationalityInUse => {
            (StatusCode::CONFLICT, Json(json!({ "error": err.to_string() }))).into_response()
        }
        StoreError::NotFound(_) => StatusCode::NOT_FOUND.into_response(),
        StoreError::Sqlite(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
        }
    }
}

pub fn make_app(
    config: ServerConfig,
    store: Arc<dyn CatalogStore>,
    wikipedia: Arc<WikipediaClient>,
    open_library: Arc<OpenLibraryClient>,
) -> Result<Router> {
    let state = ServerState {
        config: config.clone(),
        start_time: Instant::now(),
        store,
        wikipedia,
        open_library,
        hash: env!("GIT_HASH").to_string(),
    };

    let book_routes: Router = Router::new()
        .route("/", get(book_routes::list_books))
        .route("/add", post(book_routes::add_book))
        .route("/lookup", post(book_routes::lookup_books))
        .route(
            "/edit/{id}",
            get(book_routes::edit_book_form).post(book_routes::edit_book),
        )
        .route("/{id}", get(book_routes::view_book))
        .with_state(state.clone());

    let people_routes: Router = Router::new()
        .route("/", get(people_routes::list_people))
        .route(
            "/add",
            get(people_routes::add_person_form).post(people_routes::add_person),
        )
        .route("/inline-add", post(people_routes::inline_add_person))
        .route("/search", get(people_routes::search_people))
        .route(
            "/edit/{id}",
            get(people_routes::edit_person_form).post(people_routes::edit_person),
        )
        .route("/delete/{id}", post(people_routes::delete_person))
        .route("/{id}", get(people_routes::view_person))
        .with_state(state.clone());

    let citation_routes: Router = Router::new()
        .route("/", get(citation_routes::list_citations))
        .route(
            "/add",
            get(citation_routes::add_citation_form).post(citation_routes::add_citation),
        )
        .route("/person/{id}", get(citation_routes::citations_for_person))
        .route(
            "/edit/{id}",
            get(citation_routes::edit_citation_form).post(citation_routes::edit_citation),
        )
        .with_state(state.clone());

    let epigraph_routes: Router = Router::new()
        .route("/", get(epigraph_routes::list_epigraphs))
        .route(
            "/add",
            get(epigraph_routes::add_epigraph_form).post(epigraph_routes::add_epigraph),
        )
        .route(
            "/edit/{id}",
            get(epigraph_routes::edit_epigraph_form).post(epigraph_routes::edit_epigraph),
        )
        .route("/delete/{id}", post(epigraph_routes::delete_epigraph))
        .with_state(state.clone());

    let misc_routes: Router = Router::new()
        .route("/", get(home))
        .route(
            "/person-types",
            get(taxonomy_routes::list_person_types).post(taxonomy_routes::add_person_type),
        )
        .route(
            "/nationalities",
            get(taxonomy_routes::list_nationalities).post(taxonomy_routes::add_nationality),
        )
        .route(
            "/nationalities/edit/{id}",
            post(taxonomy_routes::rename_nationality),
        )
        .route(
            "/nationalities/delete/{id}",
            post(taxonomy_routes::delete_nationality),
        )
        .route("/wikipedia/preview", get(lookup_routes::wikipedia_preview))
        .route("/api/people-list", get(people_routes::people_list))
        .with_state(state.clone());

    let mut app = Router::new()
        .nest("/books", book_routes)
        .nest("/people", people_routes)
        .nest("/citations", citation_routes)
        .nest("/epigraphs", epigraph_routes)
        .merge(misc_routes)
        .layer(middleware::from_fn_with_state(state, log_requests));

    if let Some(frontend_dir_path) = &config.frontend_dir_path {
        app = app.fallback_service(ServeDir::new(frontend_dir_path));
    }

    Ok(app)
}

pub async fn run_server(
    store: Arc<dyn CatalogStore>,
    wikipedia: Arc<WikipediaClient>,
    open_library: Arc<OpenLibraryClient>,
    requests_logging_level: RequestsLoggingLevel,
    port: u16,
    frontend_dir_path: Option<String>,
) -> Result<()> {
    let config = ServerConfig {
        port,
        requests_logging_level,
        frontend_dir_path,
    };
    let app = make_app(config, store, wikipedia, open_library)?;

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;

    Ok(axum::serve(listener, app).await?)
}
