//! Catalog models for the SQLite-backed storage.

use serde::{Deserialize, Serialize};

// =============================================================================
// Enumerations
// =============================================================================

/// Role a contributor plays on a book.
///
/// Roles are stored as lowercase text so the set stays open; this enum covers
/// the roles the application itself drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContributorRole {
    Author,
    Translator,
}

impl ContributorRole {
    /// Convert from database string representation
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "author" => Some(ContributorRole::Author),
            "translator" => Some(ContributorRole::Translator),
            _ => None,
        }
    }

    /// Convert to database string representation
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ContributorRole::Author => "author",
            ContributorRole::Translator => "translator",
        }
    }

    /// Person-type label applied when the reconciler has to create a person
    /// for this role.
    pub fn default_person_type(&self) -> &'static str {
        match self {
            ContributorRole::Author => "Author",
            ContributorRole::Translator => "Translator",
        }
    }
}

/// Which books a list query should return.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BookListFilter {
    All,
    /// Hide books flagged complete, except those explicitly listed (the book
    /// an existing citation or epigraph already points at must stay
    /// selectable while that item is being edited).
    ExcludeCompleted { ensure_ids: Vec<i64> },
}

// =============================================================================
// Core Entities
// =============================================================================

/// Book row as stored.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub publication_year: Option<i32>,
    pub isbn: Option<String>,
    pub is_complete: bool,
}

/// Book list row with aggregated contributor names and usage counts.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BookSummary {
    pub id: i64,
    pub title: String,
    pub publication_year: Option<i32>,
    pub isbn: Option<String>,
    pub authors: Option<String>,
    pub translators: Option<String>,
    pub citation_count: i64,
    pub epigraph_count: i64,
    pub is_complete: bool,
}

/// Person row joined with its type and nationality names.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Person {
    pub id: i64,
    pub name: String,
    pub type_id: Option<i64>,
    pub type_name: Option<String>,
    pub nationality_id: Option<i64>,
    pub nationality_name: Option<String>,
    pub wiki_url: Option<String>,
    pub bio_summary: Option<String>,
    /// Signed common-era year (1 BC is 0).
    pub birth_year: Option<i32>,
    pub death_year: Option<i32>,
    pub notes: Option<String>,
}

/// Person list row with usage counts.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersonSummary {
    pub id: i64,
    pub name: String,
    pub type_name: Option<String>,
    pub wiki_url: Option<String>,
    pub citation_count: i64,
    pub epigraph_count: i64,
    pub nationality: Option<String>,
}

/// Fields for creating or updating a person row.
#[derive(Clone, Debug, Default)]
pub struct PersonFields {
    pub name: String,
    pub type_id: Option<i64>,
    pub nationality_id: Option<i64>,
    pub wiki_url: Option<String>,
    pub bio_summary: Option<String>,
    pub birth_year: Option<i32>,
    pub death_year: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersonType {
    pub id: i64,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Nationality {
    pub id: i64,
    pub name: String,
}

// =============================================================================
// Relationship Types
// =============================================================================

/// A person linked to a book, as listed on the book side.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BookContributor {
    pub role: String,
    pub person_id: i64,
    pub name: String,
}

/// A book a person contributed to, as listed on the person side.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersonContribution {
    pub role: String,
    pub book_id: i64,
    pub title: String,
}

/// Citation row as stored.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Citation {
    pub id: i64,
    pub person_id: i64,
    pub book_id: i64,
    pub page_number: i64,
    pub notes: Option<String>,
    pub indirect_citation: bool,
}

/// Citation list row joined with person and book names.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CitationSummary {
    pub id: i64,
    pub person_name: String,
    pub book_title: String,
    pub page_number: i64,
    pub book_id: i64,
    pub notes: Option<String>,
    pub indirect_citation: bool,
}

/// Citation as listed on a book page.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BookCitation {
    pub id: i64,
    pub person_name: String,
    pub page_number: i64,
    pub person_id: i64,
    pub notes: Option<String>,
    pub indirect_citation: bool,
}

/// Epigraph row as stored.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Epigraph {
    pub id: i64,
    pub book_id: i64,
    pub author_id: i64,
    pub quote: String,
    pub notes: Option<String>,
}

/// Epigraph list row joined with book and author names.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EpigraphSummary {
    pub id: i64,
    pub book_id: i64,
    pub book_title: String,
    pub author_id: i64,
    pub author_name: String,
    pub quote: String,
    pub notes: Option<String>,
    pub created_at: i64,
}

/// Epigraph as listed on a book page.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BookEpigraph {
    pub id: i64,
    pub quote: String,
    pub notes: Option<String>,
    pub author_name: String,
    pub author_id: i64,
    pub created_at: i64,
}

/// Epigraph as listed on a person page.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersonEpigraph {
    pub id: i64,
    pub quote: String,
    pub notes: Option<String>,
    pub book_title: String,
    pub book_id: i64,
    pub created_at: i64,
}
