//! Wikipedia REST API client for biography summaries.
//!
//! Birth and death years are pulled out of the summary with a best-effort
//! scan of its first parenthetical group; ambiguous or missing content
//! yields absent years, never an error.

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;

/// Summary text reported when the encyclopedia has no page for a name.
pub const NO_PAGE_MESSAGE: &str = "No Wikipedia page found.";

pub struct WikipediaClient {
    client: reqwest::Client,
    base_url: String,
}

/// Biography data extracted from a summary page.
#[derive(Clone, Debug, Serialize)]
pub struct Biography {
    pub url: Option<String>,
    pub summary: String,
    pub birth_year: Option<i32>,
    pub death_year: Option<i32>,
}

impl Biography {
    pub fn no_page() -> Self {
        Biography {
            url: None,
            summary: NO_PAGE_MESSAGE.to_string(),
            birth_year: None,
            death_year: None,
        }
    }
}

#[derive(Deserialize)]
struct SummaryResponse {
    extract: Option<String>,
    content_urls: Option<ContentUrls>,
}

#[derive(Deserialize)]
struct ContentUrls {
    desktop: Option<DesktopUrls>,
}

#[derive(Deserialize)]
struct DesktopUrls {
    page: Option<String>,
}

impl WikipediaClient {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the encyclopedia (e.g., "https://en.wikipedia.org")
    /// * `timeout_sec` - Request timeout in seconds
    pub fn new(base_url: String, timeout_sec: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("referent-server/0.1 (referent@app.local)")
            .timeout(Duration::from_secs(timeout_sec))
            .build()?;

        let base_url = base_url.trim_end_matches('/').to_string();

        Ok(Self { client, base_url })
    }

    /// Look up a person's biography summary by name.
    pub async fn lookup(&self, name: &str) -> Result<Biography> {
        let title = name.trim().replace(' ', "_");
        self.lookup_title(&title).await
    }

    /// Re-look up a biography from an already-known encyclopedia URL; the
    /// page title is the final path segment.
    pub async fn lookup_url(&self, url: &str) -> Result<Biography> {
        let title = url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        self.lookup_title(&title).await
    }

    async fn lookup_title(&self, title: &str) -> Result<Biography> {
        if title.is_empty() {
            return Ok(Biography::no_page());
        }

        let url = format!(
            "{}/api/rest_v1/page/summary/{}",
            self.base_url,
            urlencoding::encode(title)
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to reach Wikipedia")?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Biography::no_page());
        }
        if !response.status().is_success() {
            anyhow::bail!(
                "Wikipedia summary request failed with status {}",
                response.status()
            );
        }

        let body: SummaryResponse = response
            .json()
            .await
            .context("Failed to parse Wikipedia response")?;

        let summary = body.extract.unwrap_or_default();
        let (birth_year, death_year) = extract_years_from_parenthetical(&summary);
        let url = body
            .content_urls
            .and_then(|c| c.desktop)
            .and_then(|d| d.page);

        Ok(Biography {
            url,
            summary,
            birth_year,
            death_year,
        })
    }
}

/// Scan only the first `(...)` group of a summary for a "YYYY dash YYYY" (or
/// "YYYY dash present") lifespan.
fn extract_years_from_parenthetical(text: &str) -> (Option<i32>, Option<i32>) {
    static PAREN_RE: OnceLock<Regex> = OnceLock::new();
    static YEARS_RE: OnceLock<Regex> = OnceLock::new();

    let paren_re = PAREN_RE.get_or_init(|| Regex::new(r"\(([^)]+)\)").unwrap());
    let Some(parenthetical) = paren_re.captures(text) else {
        return (None, None);
    };
    let contents = parenthetical.get(1).map(|m| m.as_str()).unwrap_or_default();

    let years_re =
        YEARS_RE.get_or_init(|| Regex::new(r"(\d{4}).*?[–—\-−].*?(\d{4}|present)").unwrap());
    let Some(years) = years_re.captures(contents) else {
        return (None, None);
    };

    let birth_year = years[1].parse().ok();
    let death_year = if &years[2] == "present" {
        None
    } else {
        years[2].parse().ok()
    };
    (birth_year, death_year)
}
