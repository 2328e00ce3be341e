//! HTTP client for end-to-end tests
//!
//! When API routes or request formats change, update only this file.

use reqwest::Response;
use serde_json::Value;
use std::time::Duration;

const REQUEST_TIMEOUT_SECS: u64 = 10;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .expect("GET request failed")
    }

    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .form(form)
            .send()
            .await
            .expect("POST form request failed")
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> Response {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .expect("POST json request failed")
    }

    /// GET a path and parse the JSON body, asserting a 200.
    pub async fn get_json(&self, path: &str) -> Value {
        let response = self.get(path).await;
        assert_eq!(response.status(), reqwest::StatusCode::OK, "GET {}", path);
        response.json().await.expect("Failed to parse JSON body")
    }

    /// POST a form and return the id from the `{"id": ...}` payload,
    /// asserting a 200.
    pub async fn post_form_expect_id(&self, path: &str, form: &[(&str, &str)]) -> i64 {
        let response = self.post_form(path, form).await;
        assert_eq!(response.status(), reqwest::StatusCode::OK, "POST {}", path);
        let body: Value = response.json().await.expect("Failed to parse JSON body");
        body["id"].as_i64().expect("Response carried no id")
    }

    // ========================================================================
    // Domain shortcuts
    // ========================================================================

    pub async fn add_book(&self, title: &str) -> i64 {
        self.post_form_expect_id("/books/add", &[("title", title)])
            .await
    }

    pub async fn add_book_with(&self, form: &[(&str, &str)]) -> i64 {
        self.post_form_expect_id("/books/add", form).await
    }

    /// Create a person through the inline-add flow and return their id.
    pub async fn add_person(&self, name: &str) -> i64 {
        let response = self
            .post_json("/people/inline-add", &serde_json::json!({ "name": name }))
            .await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::OK,
            "inline-add for {}",
            name
        );
        let body: Value = response.json().await.expect("Failed to parse JSON body");
        body["id"].as_i64().expect("Response carried no id")
    }

    pub async fn add_citation(&self, person_id: i64, book_id: i64, page: &str) -> i64 {
        self.post_form_expect_id(
            "/citations/add",
            &[
                ("person_id", &person_id.to_string()),
                ("book_id", &book_id.to_string()),
                ("page_number", page),
            ],
        )
        .await
    }

    pub async fn add_epigraph(&self, book_id: i64, author_id: i64, quote: &str) -> i64 {
        self.post_form_expect_id(
            "/epigraphs/add",
            &[
                ("book_id", &book_id.to_string()),
                ("author_id", &author_id.to_string()),
                ("quote", quote),
            ],
        )
        .await
    }
}
