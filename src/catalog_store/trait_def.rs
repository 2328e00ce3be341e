//! CatalogStore trait definition.

use super::models::*;
use super::StoreResult;

/// Storage backend for the catalog.
///
/// Every operation is a short-lived unit of work: it acquires the guarded
/// connection, executes, and returns before the handler continues. Mutations
/// refresh the row's updated_at stamp; callers never supply timestamps.
pub trait CatalogStore: Send + Sync {
    // =========================================================================
    // Books
    // =========================================================================

    fn add_book(
        &self,
        title: &str,
        publication_year: Option<i32>,
        isbn: Option<&str>,
        is_complete: bool,
    ) -> StoreResult<i64>;

    fn update_book(
        &self,
        book_id: i64,
        title: &str,
        publication_year: Option<i32>,
        isbn: Option<&str>,
        is_complete: bool,
    ) -> StoreResult<()>;

    fn get_book(&self, book_id: i64) -> StoreResult<Book>;

    /// List books ordered by title, with aggregated author/translator names
    /// and citation/epigraph counts.
    fn list_books(&self, filter: &BookListFilter) -> StoreResult<Vec<BookSummary>>;

    // =========================================================================
    // Person types
    // =========================================================================

    /// Find-or-create by name; a duplicate name returns the existing id.
    fn ensure_person_type(&self, name: &str) -> StoreResult<i64>;

    fn list_person_types(&self) -> StoreResult<Vec<PersonType>>;

    // =========================================================================
    // Nationalities
    // =========================================================================

    /// Find-or-create by name; a duplicate name returns the existing id.
    fn ensure_nationality(&self, name: &str) -> StoreResult<i64>;

    fn list_nationalities(&self) -> StoreResult<Vec<Nationality>>;

    fn rename_nationality(&self, nationality_id: i64, name: &str) -> StoreResult<()>;

    /// Fails with `StoreError::NationalityInUse` while any person references
    /// the row.
    fn delete_nationality(&self, nationality_id: i64) -> StoreResult<()>;

    // =========================================================================
    // People
    // =========================================================================

    /// Insert a person; a name that exists under any casing is rejected
    /// without writing.
    fn add_person(&self, fields: &PersonFields) -> StoreResult<i64>;

    fn update_person(&self, person_id: i64, fields: &PersonFields) -> StoreResult<()>;

    /// Deleting a person cascades to their citations, epigraph authorships
    /// and contributor links.
    fn delete_person(&self, person_id: i64) -> StoreResult<()>;

    fn get_person(&self, person_id: i64) -> StoreResult<Person>;

    /// List people ordered by name; an optional term filters by
    /// case-insensitive substring match.
    fn list_people(&self, search_term: Option<&str>) -> StoreResult<Vec<PersonSummary>>;

    /// True when a person with this name exists under any casing.
    fn person_exists(&self, name: &str) -> StoreResult<bool>;

    /// Case-insensitive find-or-create. A found person with no type gets the
    /// default type backfilled; a created person starts with it. Blank names
    /// yield `None`.
    fn get_or_create_person(
        &self,
        name: &str,
        default_type: Option<&str>,
    ) -> StoreResult<Option<i64>>;

    // =========================================================================
    // Contributors
    // =========================================================================

    /// List a book's contributors, authors first, names ordered ignoring case.
    fn get_book_contributors(&self, book_id: i64) -> StoreResult<Vec<BookContributor>>;

    fn get_contributions_by_person(&self, person_id: i64)
        -> StoreResult<Vec<PersonContribution>>;

    /// Replace the full contributor list for one role: find-or-create each
    /// named person (created or untyped people get `default_type`), link the
    /// missing ones, and unlink everyone no longer in the list. Links that
    /// should remain are left untouched.
    fn set_book_contributors(
        &self,
        book_id: i64,
        names: &[String],
        role: ContributorRole,
        default_type: &str,
    ) -> StoreResult<()>;

    // =========================================================================
    // Citations
    // =========================================================================

    fn add_citation(
        &self,
        person_id: i64,
        book_id: i64,
        page_number: i64,
        indirect_citation: bool,
        notes: Option<&str>,
    ) -> StoreResult<i64>;

    fn update_citation(
        &self,
        citation_id: i64,
        person_id: i64,
        book_id: i64,
        page_number: i64,
        indirect_citation: bool,
        notes: Option<&str>,
    ) -> StoreResult<()>;

    fn get_citation(&self, citation_id: i64) -> StoreResult<Citation>;

    /// All citations, most recently updated first.
    fn list_citations(&self) -> StoreResult<Vec<CitationSummary>>;

    /// A book's citations in page order.
    fn get_citations_by_book(&self, book_id: i64) -> StoreResult<Vec<BookCitation>>;

    /// A person's citations ordered by book title, then page.
    fn get_citations_by_person(&self, person_id: i64) -> StoreResult<Vec<CitationSummary>>;

    // =========================================================================
    // Epigraphs
    // =========================================================================

    fn add_epigraph(
        &self,
        book_id: i64,
        author_id: i64,
        quote: &str,
        notes: Option<&str>,
    ) -> StoreResult<i64>;

    fn update_epigraph(
        &self,
        epigraph_id: i64,
        book_id: i64,
        author_id: i64,
        quote: &str,
        notes: Option<&str>,
    ) -> StoreResult<()>;

    fn get_epigraph(&self, epigraph_id: i64) -> StoreResult<Epigraph>;

    fn delete_epigraph(&self, epigraph_id: i64) -> StoreResult<()>;

    /// All epigraphs ordered by book title, newest first within a book.
    fn list_epigraphs(&self) -> StoreResult<Vec<EpigraphSummary>>;

    fn get_epigraphs_by_book(&self, book_id: i64) -> StoreResult<Vec<BookEpigraph>>;

    fn get_epigraphs_by_person(&self, person_id: i64) -> StoreResult<Vec<PersonEpigraph>>;
}
