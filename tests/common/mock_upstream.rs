//! Mock metadata services for end-to-end tests.
//!
//! Small axum routers standing in for the Wikipedia summary API and the
//! Open Library API, so enrichment flows can be exercised without the
//! network.

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::collections::HashMap;
use tokio::net::TcpListener;

pub struct MockUpstream {
    pub base_url: String,
}

async fn spawn_router(app: Router) -> MockUpstream {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock upstream");
    let base_url = format!("http://127.0.0.1:{}", listener.local_addr().unwrap().port());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    MockUpstream { base_url }
}

// ============================================================================
// Wikipedia
// ============================================================================

pub async fn spawn_wikipedia() -> MockUpstream {
    let app = Router::new().route("/api/rest_v1/page/summary/{title}", get(wikipedia_summary));
    spawn_router(app).await
}

async fn wikipedia_summary(Path(title): Path<String>) -> Response {
    let (extract, page) = match title.as_str() {
        "Ann_Quin" => (
            "Ann Quin (1936\u{2013}1973) was an English experimental novelist.",
            "https://en.wikipedia.org/wiki/Ann_Quin",
        ),
        "Living_Writer" => (
            "Living Writer (1950\u{2013}present) is a novelist.",
            "https://en.wikipedia.org/wiki/Living_Writer",
        ),
        "Undated_Writer" => (
            "Undated Writer is a novelist of uncertain vintage.",
            "https://en.wikipedia.org/wiki/Undated_Writer",
        ),
        _ => return StatusCode::NOT_FOUND.into_response(),
    };
    Json(json!({
        "title": title.replace('_', " "),
        "extract": extract,
        "content_urls": { "desktop": { "page": page } },
    }))
    .into_response()
}

// ============================================================================
// Open Library
// ============================================================================

pub async fn spawn_open_library() -> MockUpstream {
    let app = Router::new()
        .route("/api/books", get(open_library_books))
        .route("/search.json", get(open_library_search));
    spawn_router(app).await
}

async fn open_library_books(Query(params): Query<HashMap<String, String>>) -> Response {
    let bibkeys = params.get("bibkeys").cloned().unwrap_or_default();
    if bibkeys == "ISBN:0714508322" {
        Json(json!({
            "ISBN:0714508322": {
                "title": "Berg",
                "authors": [{ "name": "Ann Quin" }],
                "publish_date": "1964",
            }
        }))
        .into_response()
    } else {
        Json(json!({})).into_response()
    }
}

async fn open_library_search(Query(_params): Query<HashMap<String, String>>) -> Response {
    // More docs than the result cap, so the cap is observable client-side.
    let docs: Vec<_> = (0..6)
        .map(|i| {
            if i == 0 {
                json!({
                    "title": "Berg",
                    "author_name": ["Ann Quin"],
                    "first_publish_year": 1964,
                    "isbn": ["0714508322"],
                })
            } else {
                json!({
                    "title": format!("Result {}", i),
                    "author_name": ["Ann Quin"],
                    "first_publish_year": 1965 + i,
                })
            }
        })
        .collect();
    Json(json!({ "docs": docs })).into_response()
}
