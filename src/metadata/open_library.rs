//! Open Library API client for bibliographic lookups.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

const COVERS_BASE_URL: &str = "https://covers.openlibrary.org";
const SEARCH_RESULT_LIMIT: usize = 5;

pub struct OpenLibraryClient {
    client: reqwest::Client,
    base_url: String,
}

/// One bibliographic match, from either lookup path.
///
/// The publication year is kept as free text: the ISBN endpoint reports a
/// publish date string, the search endpoint a bare first-publish year.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BookLookupResult {
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub publication_year: Option<String>,
    pub isbn: Option<String>,
    pub cover_url: Option<String>,
}

#[derive(Deserialize)]
struct IsbnEntry {
    title: Option<String>,
    #[serde(default)]
    authors: Vec<AuthorRef>,
    publish_date: Option<String>,
}

#[derive(Deserialize)]
struct AuthorRef {
    name: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    docs: Vec<SearchDoc>,
}

#[derive(Deserialize)]
struct SearchDoc {
    title: Option<String>,
    #[serde(default)]
    author_name: Vec<String>,
    first_publish_year: Option<i32>,
    #[serde(default)]
    isbn: Vec<String>,
}

fn cover_url_for_isbn(isbn: &str) -> String {
    format!("{}/b/isbn/{}-L.jpg", COVERS_BASE_URL, isbn)
}

fn result_from_isbn_entry(isbn: &str, entry: IsbnEntry) -> BookLookupResult {
    BookLookupResult {
        title: entry.title,
        authors: entry.authors.into_iter().map(|a| a.name).collect(),
        publication_year: entry.publish_date,
        isbn: Some(isbn.to_string()),
        cover_url: Some(cover_url_for_isbn(isbn)),
    }
}

fn result_from_search_doc(doc: SearchDoc) -> BookLookupResult {
    let isbn = doc.isbn.into_iter().next();
    let cover_url = isbn.as_deref().map(cover_url_for_isbn);
    BookLookupResult {
        title: doc.title,
        authors: doc.author_name,
        publication_year: doc.first_publish_year.map(|year| year.to_string()),
        isbn,
        cover_url,
    }
}

impl OpenLibraryClient {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the catalog (e.g., "https://openlibrary.org")
    /// * `timeout_sec` - Request timeout in seconds
    pub fn new(base_url: String, timeout_sec: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("referent-server/0.1 (referent@app.local)")
            .timeout(Duration::from_secs(timeout_sec))
            .build()?;

        let base_url = base_url.trim_end_matches('/').to_string();

        Ok(Self { client, base_url })
    }

    /// Resolve an ISBN to book metadata; an unknown ISBN yields `None`.
    pub async fn lookup_isbn(&self, isbn: &str) -> Result<Option<BookLookupResult>> {
        let url = format!("{}/api/books", self.base_url);
        let key = format!("ISBN:{}", isbn);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("bibkeys", key.as_str()),
                ("format", "json"),
                ("jscmd", "data"),
            ])
            .send()
            .await
            .context("Failed to reach Open Library")?;

        if !response.status().is_success() {
            anyhow::bail!(
                "Open Library ISBN request failed with status {}",
                response.status()
            );
        }

        let mut body: HashMap<String, IsbnEntry> = response
            .json()
            .await
            .context("Failed to parse Open Library response")?;

        Ok(body
            .remove(&key)
            .map(|entry| result_from_isbn_entry(isbn, entry)))
    }

    /// Search the catalog by title and author, capped at a handful of
    /// results.
    pub async fn search(&self, title: &str, author: &str) -> Result<Vec<BookLookupResult>> {
        let url = format!("{}/search.json", self.base_url);
        let limit = SEARCH_RESULT_LIMIT.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[("title", title), ("author", author), ("limit", limit.as_str())])
            .send()
            .await
            .context("Failed to reach Open Library")?;

        if !response.status().is_success() {
            anyhow::bail!(
                "Open Library search failed with status {}",
                response.status()
            );
        }

        let body: SearchResponse = response
            .json()
            .await
            .context("Failed to parse Open Library response")?;

        Ok(body
            .docs
            .into_iter()
            .take(SEARCH_RESULT_LIMIT)
            .map(result_from_search_doc)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cover_url_is_synthesized_from_isbn() {
        assert_eq!(
            cover_url_for_isbn("0714508322"),
            "https://covers.openlibrary.org/b/isbn/0714508322-L.jpg"
        );
    }

    #[test]
    fn isbn_entry_maps_to_result() {
        let entry = IsbnEntry {
            title: Some("Berg".to_string()),
            authors: vec![AuthorRef {
                name: "Ann Quin".to_string(),
            }],
            publish_date: Some("1964".to_string()),
        };
        let result = result_from_isbn_entry("0714508322", entry);
        assert_eq!(result.title.as_deref(), Some("Berg"));
        assert_eq!(result.authors, vec!["Ann Quin"]);
        assert_eq!(result.publication_year.as_deref(), Some("1964"));
        assert_eq!(result.isbn.as_deref(), Some("0714508322"));
        assert!(result.cover_url.unwrap().contains("0714508322"));
    }

    #[test]
    fn search_doc_without_isbn_has_no_cover() {
        let doc = SearchDoc {
            title: Some("Three".to_string()),
            author_name: vec!["Ann Quin".to_string()],
            first_publish_year: Some(1966),
            isbn: vec![],
        };
        let result = result_from_search_doc(doc);
        assert_eq!(result.publication_year.as_deref(), Some("1966"));
        assert_eq!(result.isbn, None);
        assert_eq!(result.cover_url, None);
    }

    #[test]
    fn search_doc_uses_first_isbn_for_cover() {
        let doc = SearchDoc {
            title: Some("Passages".to_string()),
            author_name: vec!["Ann Quin".to_string()],
            first_publish_year: None,
            isbn: vec!["1564782601".to_string(), "9999999999".to_string()],
        };
        let result = result_from_search_doc(doc);
        assert_eq!(result.isbn.as_deref(), Some("1564782601"));
        assert_eq!(
            result.cover_url.as_deref(),
            Some("https://covers.openlibrary.org/b/isbn/1564782601-L.jpg")
        );
    }
}
