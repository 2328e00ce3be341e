//! SQLite-backed catalog store implementation.
//!
//! All access goes through one guarded connection; every operation locks,
//! executes and returns, so concurrent handlers serialize on the store.

use super::models::*;
use super::schema::CATALOG_VERSIONED_SCHEMAS;
use super::trait_def::CatalogStore;
use super::{StoreError, StoreResult};
use crate::sqlite_persistence::{QueryPredicates, BASE_DB_VERSION};
use anyhow::{Context, Result};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

#[derive(Clone)]
pub struct SqliteCatalogStore {
    conn: Arc<Mutex<Connection>>,
}

fn migrate_if_needed(conn: &mut Connection) -> Result<()> {
    let db_version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;

    let latest_version = CATALOG_VERSIONED_SCHEMAS.len() - 1;
    let latest_schema = &CATALOG_VERSIONED_SCHEMAS[latest_version];

    // Brand new database: create the latest schema directly.
    let table_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
            [],
            |r| r.get(0),
        )
        .unwrap_or(0);
    if table_count == 0 {
        info!("Creating catalog db schema at version {}", latest_version);
        latest_schema.create(conn)?;
        return Ok(());
    }

    let current_version = (db_version - BASE_DB_VERSION as i64).max(0) as usize;
    if current_version >= latest_version {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for schema in CATALOG_VERSIONED_SCHEMAS.iter().skip(current_version + 1) {
        if let Some(migration_fn) = schema.migration {
            info!("Migrating catalog db to version {}", schema.version);
            migration_fn(&tx)?;
        }
    }
    tx.pragma_update(None, "user_version", BASE_DB_VERSION + latest_version)?;
    tx.commit()?;
    Ok(())
}

impl SqliteCatalogStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let mut conn =
            Connection::open(db_path.as_ref()).context("Failed to open catalog database")?;

        migrate_if_needed(&mut conn)?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        // Foreign keys are per-connection in SQLite.
        conn.pragma_update(None, "foreign_keys", "ON")?;

        let latest = &CATALOG_VERSIONED_SCHEMAS[CATALOG_VERSIONED_SCHEMAS.len() - 1];
        latest.validate(&conn)?;

        let book_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM books", [], |r| r.get(0))
            .unwrap_or(0);
        let people_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM people", [], |r| r.get(0))
            .unwrap_or(0);
        info!(
            "Opened referent catalog: {} books, {} people",
            book_count, people_count
        );

        Ok(SqliteCatalogStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap()
    }

    fn ensure_person_type_with(conn: &Connection, name: &str) -> StoreResult<i64> {
        let name = name.trim();
        conn.execute(
            "INSERT OR IGNORE INTO person_types (name) VALUES (?1)",
            params![name],
        )?;
        let id = conn.query_row(
            "SELECT id FROM person_types WHERE name = ?1",
            params![name],
            |r| r.get(0),
        )?;
        Ok(id)
    }

    fn get_or_create_person_with(
        conn: &Connection,
        name: &str,
        default_type: Option<&str>,
    ) -> StoreResult<Option<i64>> {
        let normalized = name.trim();
        if normalized.is_empty() {
            return Ok(None);
        }

        // The NOCASE collation on people.name makes this match any casing.
        let existing: Option<(i64, Option<i64>)> = conn
            .query_row(
                "SELECT id, type_id FROM people WHERE name = ?1",
                params![normalized],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?;

        if let Some((person_id, type_id)) = existing {
            if type_id.is_none() {
                if let Some(default_type) = default_type {
                    let type_id = Self::ensure_person_type_with(conn, default_type)?;
                    conn.execute(
                        "UPDATE people SET type_id = ?1, updated_at = cast(strftime('%s','now') as int) WHERE id = ?2",
                        params![type_id, person_id],
                    )?;
                }
            }
            return Ok(Some(person_id));
        }

        let type_id = match default_type {
            Some(default_type) => Some(Self::ensure_person_type_with(conn, default_type)?),
            None => None,
        };
        conn.execute(
            "INSERT INTO people (name, type_id) VALUES (?1, ?2)",
            params![normalized, type_id],
        )?;
        Ok(Some(conn.last_insert_rowid()))
    }
}

const BOOK_LIST_BASE: &str = "
    SELECT
        b.id,
        b.title,
        b.publication_year,
        b.isbn,
        authors.names AS authors,
        translators.names AS translators,
        COALESCE(c_counts.citation_count, 0) AS citation_count,
        COALESCE(e_counts.epigraph_count, 0) AS epigraph_count,
        b.is_complete
    FROM books b
    LEFT JOIN (
        SELECT bc.book_id, REPLACE(GROUP_CONCAT(DISTINCT p.name), ',', ', ') AS names
        FROM book_contributors bc
        JOIN people p ON p.id = bc.person_id
        WHERE bc.role = 'author'
        GROUP BY bc.book_id
    ) AS authors ON authors.book_id = b.id
    LEFT JOIN (
        SELECT bc.book_id, REPLACE(GROUP_CONCAT(DISTINCT p.name), ',', ', ') AS names
        FROM book_contributors bc
        JOIN people p ON p.id = bc.person_id
        WHERE bc.role = 'translator'
        GROUP BY bc.book_id
    ) AS translators ON translators.book_id = b.id
    LEFT JOIN (
        SELECT book_id, COUNT(*) AS citation_count
        FROM citations
        GROUP BY book_id
    ) AS c_counts ON c_counts.book_id = b.id
    LEFT JOIN (
        SELECT book_id, COUNT(*) AS epigraph_count
        FROM epigraphs
        GROUP BY book_id
    ) AS e_counts ON e_counts.book_id = b.id";

const PEOPLE_LIST_BASE: &str = "
    SELECT
        people.id,
        people.name,
        person_types.name AS type_name,
        people.wiki_url,
        COUNT(DISTINCT citations.id) AS citation_count,
        COUNT(DISTINCT epigraphs.id) AS epigraph_count,
        nationalities.name AS nationality
    FROM people
    LEFT JOIN person_types ON people.type_id = person_types.id
    LEFT JOIN citations ON people.id = citations.person_id
    LEFT JOIN epigraphs ON people.id = epigraphs.author_id
    LEFT JOIN nationalities ON people.nationality_id = nationalities.id";

impl CatalogStore for SqliteCatalogStore {
    // =========================================================================
    // Books
    // =========================================================================

    fn add_book(
        &self,
        title: &str,
        publication_year: Option<i32>,
        isbn: Option<&str>,
        is_complete: bool,
    ) -> StoreResult<i64> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO books (title, publication_year, isbn, is_complete) VALUES (?1, ?2, ?3, ?4)",
            params![title, publication_year, isbn, is_complete],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn update_book(
        &self,
        book_id: i64,
        title: &str,
        publication_year: Option<i32>,
        isbn: Option<&str>,
        is_complete: bool,
    ) -> StoreResult<()> {
        let changed = self.conn().execute(
            "UPDATE books
             SET title = ?1,
                 publication_year = ?2,
                 isbn = ?3,
                 is_complete = ?4,
                 updated_at = cast(strftime('%s','now') as int)
             WHERE id = ?5",
            params![title, publication_year, isbn, is_complete, book_id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound("book"));
        }
        Ok(())
    }

    fn get_book(&self, book_id: i64) -> StoreResult<Book> {
        self.conn()
            .query_row(
                "SELECT id, title, publication_year, isbn, is_complete FROM books WHERE id = ?1",
                params![book_id],
                |r| {
                    Ok(Book {
                        id: r.get(0)?,
                        title: r.get(1)?,
                        publication_year: r.get(2)?,
                        isbn: r.get(3)?,
                        is_complete: r.get(4)?,
                    })
                },
            )
            .optional()?
            .ok_or(StoreError::NotFound("book"))
    }

    fn list_books(&self, filter: &BookListFilter) -> StoreResult<Vec<BookSummary>> {
        let mut predicates = QueryPredicates::new();
        match filter {
            BookListFilter::All => {}
            BookListFilter::ExcludeCompleted { ensure_ids } => {
                if ensure_ids.is_empty() {
                    predicates.push("b.is_complete = 0", []);
                } else {
                    predicates.push(
                        format!(
                            "(b.is_complete = 0 OR b.id IN ({}))",
                            QueryPredicates::placeholders(ensure_ids.len())
                        ),
                        ensure_ids.iter().map(|id| Value::Integer(*id)),
                    );
                }
            }
        }
        let sql = format!(
            "{}{}\n    ORDER BY b.title",
            BOOK_LIST_BASE,
            predicates.where_sql()
        );

        let conn = self.conn();
        let mut stmt = conn.prepare(&sql)?;
        let books = stmt
            .query_map(params_from_iter(predicates.into_params()), |r| {
                Ok(BookSummary {
                    id: r.get(0)?,
                    title: r.get(1)?,
                    publication_year: r.get(2)?,
                    isbn: r.get(3)?,
                    authors: r.get(4)?,
                    translators: r.get(5)?,
                    citation_count: r.get(6)?,
                    epigraph_count: r.get(7)?,
                    is_complete: r.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(books)
    }

    // =========================================================================
    // Person types
    // =========================================================================

    fn ensure_person_type(&self, name: &str) -> StoreResult<i64> {
        Self::ensure_person_type_with(&self.conn(), name)
    }

    fn list_person_types(&self) -> StoreResult<Vec<PersonType>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT id, name FROM person_types ORDER BY name")?;
        let types = stmt
            .query_map([], |r| {
                Ok(PersonType {
                    id: r.get(0)?,
                    name: r.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(types)
    }

    // =========================================================================
    // Nationalities
    // =========================================================================

    fn ensure_nationality(&self, name: &str) -> StoreResult<i64> {
        let name = name.trim();
        let conn = self.conn();
        conn.execute(
            "INSERT OR IGNORE INTO nationalities (name) VALUES (?1)",
            params![name],
        )?;
        let id = conn.query_row(
            "SELECT id FROM nationalities WHERE name = ?1",
            params![name],
            |r| r.get(0),
        )?;
        Ok(id)
    }

    fn list_nationalities(&self) -> StoreResult<Vec<Nationality>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT id, name FROM nationalities ORDER BY name")?;
        let nationalities = stmt
            .query_map([], |r| {
                Ok(Nationality {
                    id: r.get(0)?,
                    name: r.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(nationalities)
    }

    fn rename_nationality(&self, nationality_id: i64, name: &str) -> StoreResult<()> {
        let name = name.trim();
        let changed = self
            .conn()
            .execute(
                "UPDATE nationalities
                 SET name = ?1, updated_at = cast(strftime('%s','now') as int)
                 WHERE id = ?2",
                params![name, nationality_id],
            )
            .map_err(|err| {
                if StoreError::is_constraint_violation(&err) {
                    StoreError::DuplicateNationalityName(name.to_string())
                } else {
                    err.into()
                }
            })?;
        if changed == 0 {
            return Err(StoreError::NotFound("nationality"));
        }
        Ok(())
    }

    fn delete_nationality(&self, nationality_id: i64) -> StoreResult<()> {
        let changed = self
            .conn()
            .execute(
                "DELETE FROM nationalities WHERE id = ?1",
                params![nationality_id],
            )
            .map_err(|err| {
                if StoreError::is_constraint_violation(&err) {
                    StoreError::NationalityInUse
                } else {
                    err.into()
                }
            })?;
        if changed == 0 {
            return Err(StoreError::NotFound("nationality"));
        }
        Ok(())
    }

    // =========================================================================
    // People
    // =========================================================================

    fn add_person(&self, fields: &PersonFields) -> StoreResult<i64> {
        let name = fields.name.trim();
        let conn = self.conn();
        conn.execute(
            "INSERT INTO people (name, type_id, nationality_id, wiki_url, bio_summary, birth_year, death_year, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                name,
                fields.type_id,
                fields.nationality_id,
                fields.wiki_url,
                fields.bio_summary,
                fields.birth_year,
                fields.death_year,
                fields.notes,
            ],
        )
        .map_err(|err| {
            if StoreError::is_constraint_violation(&err) {
                StoreError::DuplicatePersonName(name.to_string())
            } else {
                err.into()
            }
        })?;
        Ok(conn.last_insert_rowid())
    }

    fn update_person(&self, person_id: i64, fields: &PersonFields) -> StoreResult<()> {
        let name = fields.name.trim();
        let changed = self
            .conn()
            .execute(
                "UPDATE people
                 SET name = ?1,
                     type_id = ?2,
                     nationality_id = ?3,
                     wiki_url = ?4,
                     bio_summary = ?5,
                     birth_year = ?6,
                     death_year = ?7,
                     notes = ?8,
                     updated_at = cast(strftime('%s','now') as int)
                 WHERE id = ?9",
                params![
                    name,
                    fields.type_id,
                    fields.nationality_id,
                    fields.wiki_url,
                    fields.bio_summary,
                    fields.birth_year,
                    fields.death_year,
                    fields.notes,
                    person_id,
                ],
            )
            .map_err(|err| {
                if StoreError::is_constraint_violation(&err) {
                    StoreError::DuplicatePersonName(name.to_string())
                } else {
                    err.into()
                }
            })?;
        if changed == 0 {
            return Err(StoreError::NotFound("person"));
        }
        Ok(())
    }

    fn delete_person(&self, person_id: i64) -> StoreResult<()> {
        let changed = self
            .conn()
            .execute("DELETE FROM people WHERE id = ?1", params![person_id])?;
        if changed == 0 {
            return Err(StoreError::NotFound("person"));
        }
        Ok(())
    }

    fn get_person(&self, person_id: i64) -> StoreResult<Person> {
        self.conn()
            .query_row(
                "SELECT
                    people.id,
                    people.name,
                    people.type_id,
                    person_types.name AS type_name,
                    people.nationality_id,
                    nationalities.name AS nationality_name,
                    people.wiki_url,
                    people.bio_summary,
                    people.birth_year,
                    people.death_year,
                    people.notes
                 FROM people
                 LEFT JOIN person_types ON people.type_id = person_types.id
                 LEFT JOIN nationalities ON people.nationality_id = nationalities.id
                 WHERE people.id = ?1",
                params![person_id],
                |r| {
                    Ok(Person {
                        id: r.get(0)?,
                        name: r.get(1)?,
                        type_id: r.get(2)?,
                        type_name: r.get(3)?,
                        nationality_id: r.get(4)?,
                        nationality_name: r.get(5)?,
                        wiki_url: r.get(6)?,
                        bio_summary: r.get(7)?,
                        birth_year: r.get(8)?,
                        death_year: r.get(9)?,
                        notes: r.get(10)?,
                    })
                },
            )
            .optional()?
            .ok_or(StoreError::NotFound("person"))
    }

    fn list_people(&self, search_term: Option<&str>) -> StoreResult<Vec<PersonSummary>> {
        let mut predicates = QueryPredicates::new();
        if let Some(term) = search_term {
            predicates.push(
                "LOWER(people.name) LIKE ?",
                [Value::Text(format!("%{}%", term.to_lowercase()))],
            );
        }
        let sql = format!(
            "{}{}\n    GROUP BY people.id ORDER BY people.name",
            PEOPLE_LIST_BASE,
            predicates.where_sql()
        );

        let conn = self.conn();
        let mut stmt = conn.prepare(&sql)?;
        let people = stmt
            .query_map(params_from_iter(predicates.into_params()), |r| {
                Ok(PersonSummary {
                    id: r.get(0)?,
                    name: r.get(1)?,
                    type_name: r.get(2)?,
                    wiki_url: r.get(3)?,
                    citation_count: r.get(4)?,
                    epigraph_count: r.get(5)?,
                    nationality: r.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(people)
    }

    fn person_exists(&self, name: &str) -> StoreResult<bool> {
        let found: Option<i64> = self
            .conn()
            .query_row(
                "SELECT id FROM people WHERE name = ?1",
                params![name.trim()],
                |r| r.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn get_or_create_person(
        &self,
        name: &str,
        default_type: Option<&str>,
    ) -> StoreResult<Option<i64>> {
        Self::get_or_create_person_with(&self.conn(), name, default_type)
    }

    // =========================================================================
    // Contributors
    // =========================================================================

    fn get_book_contributors(&self, book_id: i64) -> StoreResult<Vec<BookContributor>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT bc.role, p.id, p.name
             FROM book_contributors bc
             JOIN people p ON p.id = bc.person_id
             WHERE bc.book_id = ?1
             ORDER BY CASE bc.role WHEN 'author' THEN 0 WHEN 'translator' THEN 1 ELSE 2 END,
                      p.name COLLATE NOCASE",
        )?;
        let contributors = stmt
            .query_map(params![book_id], |r| {
                Ok(BookContributor {
                    role: r.get(0)?,
                    person_id: r.get(1)?,
                    name: r.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(contributors)
    }

    fn get_contributions_by_person(
        &self,
        person_id: i64,
    ) -> StoreResult<Vec<PersonContribution>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT bc.role, b.id, b.title
             FROM book_contributors bc
             JOIN books b ON b.id = bc.book_id
             WHERE bc.person_id = ?1
             ORDER BY CASE bc.role WHEN 'author' THEN 0 WHEN 'translator' THEN 1 ELSE 2 END,
                      b.title COLLATE NOCASE",
        )?;
        let contributions = stmt
            .query_map(params![person_id], |r| {
                Ok(PersonContribution {
                    role: r.get(0)?,
                    book_id: r.get(1)?,
                    title: r.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(contributions)
    }

    fn set_book_contributors(
        &self,
        book_id: i64,
        names: &[String],
        role: ContributorRole,
        default_type: &str,
    ) -> StoreResult<()> {
        let conn = self.conn();
        let role_str = role.to_db_str();

        let before: HashSet<i64> = {
            let mut stmt = conn.prepare(
                "SELECT person_id FROM book_contributors WHERE book_id = ?1 AND role = ?2",
            )?;
            stmt.query_map(params![book_id, role_str], |r| r.get(0))?
                .collect::<Result<_, _>>()?
        };

        let mut desired = HashSet::new();
        for name in names {
            let Some(person_id) =
                Self::get_or_create_person_with(&conn, name, Some(default_type))?
            else {
                continue;
            };
            conn.execute(
                "INSERT OR IGNORE INTO book_contributors (book_id, person_id, role) VALUES (?1, ?2, ?3)",
                params![book_id, person_id, role_str],
            )?;
            desired.insert(person_id);
        }

        for stale in before.difference(&desired) {
            conn.execute(
                "DELETE FROM book_contributors WHERE book_id = ?1 AND person_id = ?2 AND role = ?3",
                params![book_id, stale, role_str],
            )?;
        }
        Ok(())
    }

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
    ) -> StoreResult<i64> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO citations (person_id, book_id, page_number, indirect_citation, notes)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![person_id, book_id, page_number, indirect_citation, notes],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn update_citation(
        &self,
        citation_id: i64,
        person_id: i64,
        book_id: i64,
        page_number: i64,
        indirect_citation: bool,
        notes: Option<&str>,
    ) -> StoreResult<()> {
        let changed = self.conn().execute(
            "UPDATE citations
             SET person_id = ?1,
                 book_id = ?2,
                 page_number = ?3,
                 indirect_citation = ?4,
                 notes = ?5,
                 updated_at = cast(strftime('%s','now') as int)
             WHERE id = ?6",
            params![
                person_id,
                book_id,
                page_number,
                indirect_citation,
                notes,
                citation_id
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound("citation"));
        }
        Ok(())
    }

    fn get_citation(&self, citation_id: i64) -> StoreResult<Citation> {
        self.conn()
            .query_row(
                "SELECT id, person_id, book_id, page_number, notes, indirect_citation
                 FROM citations WHERE id = ?1",
                params![citation_id],
                |r| {
                    Ok(Citation {
                        id: r.get(0)?,
                        person_id: r.get(1)?,
                        book_id: r.get(2)?,
                        page_number: r.get(3)?,
                        notes: r.get(4)?,
                        indirect_citation: r.get(5)?,
                    })
                },
            )
            .optional()?
            .ok_or(StoreError::NotFound("citation"))
    }

    fn list_citations(&self) -> StoreResult<Vec<CitationSummary>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT c.id, p.name, b.title, c.page_number, b.id, c.notes, c.indirect_citation
             FROM citations c
             JOIN people p ON c.person_id = p.id
             JOIN books b ON c.book_id = b.id
             ORDER BY c.updated_at DESC",
        )?;
        let citations = stmt
            .query_map([], map_citation_summary)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(citations)
    }

    fn get_citations_by_book(&self, book_id: i64) -> StoreResult<Vec<BookCitation>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT c.id, p.name, c.page_number, p.id, c.notes, c.indirect_citation
             FROM citations c
             JOIN people p ON c.person_id = p.id
             WHERE c.book_id = ?1
             ORDER BY c.page_number",
        )?;
        let citations = stmt
            .query_map(params![book_id], |r| {
                Ok(BookCitation {
                    id: r.get(0)?,
                    person_name: r.get(1)?,
                    page_number: r.get(2)?,
                    person_id: r.get(3)?,
                    notes: r.get(4)?,
                    indirect_citation: r.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(citations)
    }

    fn get_citations_by_person(&self, person_id: i64) -> StoreResult<Vec<CitationSummary>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT c.id, p.name, b.title, c.page_number, b.id, c.notes, c.indirect_citation
             FROM citations c
             JOIN people p ON c.person_id = p.id
             JOIN books b ON c.book_id = b.id
             WHERE c.person_id = ?1
             ORDER BY b.title, c.page_number",
        )?;
        let citations = stmt
            .query_map(params![person_id], map_citation_summary)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(citations)
    }

    // =========================================================================
    // Epigraphs
    // =========================================================================

    fn add_epigraph(
        &self,
        book_id: i64,
        author_id: i64,
        quote: &str,
        notes: Option<&str>,
    ) -> StoreResult<i64> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO epigraphs (book_id, author_id, quote, notes) VALUES (?1, ?2, ?3, ?4)",
            params![book_id, author_id, quote, notes],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn update_epigraph(
        &self,
        epigraph_id: i64,
        book_id: i64,
        author_id: i64,
        quote: &str,
        notes: Option<&str>,
    ) -> StoreResult<()> {
        let changed = self.conn().execute(
            "UPDATE epigraphs
             SET book_id = ?1,
                 author_id = ?2,
                 quote = ?3,
                 notes = ?4,
                 updated_at = cast(strftime('%s','now') as int)
             WHERE id = ?5",
            params![book_id, author_id, quote, notes, epigraph_id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound("epigraph"));
        }
        Ok(())
    }

    fn get_epigraph(&self, epigraph_id: i64) -> StoreResult<Epigraph> {
        self.conn()
            .query_row(
                "SELECT id, book_id, author_id, quote, notes FROM epigraphs WHERE id = ?1",
                params![epigraph_id],
                |r| {
                    Ok(Epigraph {
                        id: r.get(0)?,
                        book_id: r.get(1)?,
                        author_id: r.get(2)?,
                        quote: r.get(3)?,
                        notes: r.get(4)?,
                    })
                },
            )
            .optional()?
            .ok_or(StoreError::NotFound("epigraph"))
    }

    fn delete_epigraph(&self, epigraph_id: i64) -> StoreResult<()> {
        let changed = self
            .conn()
            .execute("DELETE FROM epigraphs WHERE id = ?1", params![epigraph_id])?;
        if changed == 0 {
            return Err(StoreError::NotFound("epigraph"));
        }
        Ok(())
    }

    fn list_epigraphs(&self) -> StoreResult<Vec<EpigraphSummary>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT e.id, b.id, b.title, p.id, p.name, e.quote, e.notes, e.created_at
             FROM epigraphs e
             JOIN books b ON e.book_id = b.id
             JOIN people p ON e.author_id = p.id
             ORDER BY b.title, e.created_at DESC",
        )?;
        let epigraphs = stmt
            .query_map([], |r| {
                Ok(EpigraphSummary {
                    id: r.get(0)?,
                    book_id: r.get(1)?,
                    book_title: r.get(2)?,
                    author_id: r.get(3)?,
                    author_name: r.get(4)?,
                    quote: r.get(5)?,
                    notes: r.get(6)?,
                    created_at: r.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(epigraphs)
    }

    fn get_epigraphs_by_book(&self, book_id: i64) -> StoreResult<Vec<BookEpigraph>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT e.id, e.quote, e.notes, p.name, p.id, e.created_at
             FROM epigraphs e
             JOIN people p ON e.author_id = p.id
             WHERE e.book_id = ?1
             ORDER BY e.created_at",
        )?;
        let epigraphs = stmt
            .query_map(params![book_id], |r| {
                Ok(BookEpigraph {
                    id: r.get(0)?,
                    quote: r.get(1)?,
                    notes: r.get(2)?,
                    author_name: r.get(3)?,
                    author_id: r.get(4)?,
                    created_at: r.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(epigraphs)
    }

    fn get_epigraphs_by_person(&self, person_id: i64) -> StoreResult<Vec<PersonEpigraph>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT e.id, e.quote, e.notes, b.title, b.id, e.created_at
             FROM epigraphs e
             JOIN books b ON e.book_id = b.id
             WHERE e.author_id = ?1
             ORDER BY e.created_at",
        )?;
        let epigraphs = stmt
            .query_map(params![person_id], |r| {
                Ok(PersonEpigraph {
                    id: r.get(0)?,
                    quote: r.get(1)?,
                    notes: r.get(2)?,
                    book_title: r.get(3)?,
                    book_id: r.get(4)?,
                    created_at: r.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(epigraphs)
    }
}

fn map_citation_summary(r: &rusqlite::Row<'_>) -> rusqlite::Result<CitationSummary> {
    Ok(CitationSummary {
        id: r.get(0)?,
        person_name: r.get(1)?,
        book_title: r.get(2)?,
        page_number: r.get(3)?,
        book_id: r.get(4)?,
        notes: r.get(5)?,
        indirect_citation: r.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_memory_store() -> SqliteCatalogStore {
        let conn = Connection::open_in_memory().unwrap();
        CATALOG_VERSIONED_SCHEMAS[CATALOG_VERSIONED_SCHEMAS.len() - 1]
            .create(&conn)
            .unwrap();
        SqliteCatalogStore {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    fn person(name: &str) -> PersonFields {
        PersonFields {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn duplicate_person_is_rejected_without_writing() {
        let store = in_memory_store();
        store.add_person(&person("Ann Quin")).unwrap();

        let result = store.add_person(&person("ANN QUIN"));
        assert!(matches!(result, Err(StoreError::DuplicatePersonName(_))));

        let people = store.list_people(None).unwrap();
        assert_eq!(people.len(), 1);
        assert_eq!(people[0].name, "Ann Quin");
    }

    #[test]
    fn person_exists_ignores_case_and_whitespace() {
        let store = in_memory_store();
        store.add_person(&person("Ann Quin")).unwrap();

        assert!(store.person_exists("ann quin").unwrap());
        assert!(store.person_exists("  Ann Quin  ").unwrap());
        assert!(!store.person_exists("B. S. Johnson").unwrap());
    }

    #[test]
    fn get_or_create_reuses_existing_person_and_backfills_type() {
        let store = in_memory_store();
        let id = store.add_person(&person("Ann Quin")).unwrap();

        let found = store
            .get_or_create_person("ann quin", Some("Author"))
            .unwrap();
        assert_eq!(found, Some(id));

        let updated = store.get_person(id).unwrap();
        assert_eq!(updated.type_name.as_deref(), Some("Author"));
    }

    #[test]
    fn get_or_create_does_not_overwrite_existing_type() {
        let store = in_memory_store();
        let translator_type = store.ensure_person_type("Translator").unwrap();
        let id = store
            .add_person(&PersonFields {
                name: "Anthea Bell".to_string(),
                type_id: Some(translator_type),
                ..Default::default()
            })
            .unwrap();

        store
            .get_or_create_person("Anthea Bell", Some("Author"))
            .unwrap();
        let unchanged = store.get_person(id).unwrap();
        assert_eq!(unchanged.type_name.as_deref(), Some("Translator"));
    }

    #[test]
    fn get_or_create_ignores_blank_names() {
        let store = in_memory_store();
        assert_eq!(store.get_or_create_person("   ", None).unwrap(), None);
        assert!(store.list_people(None).unwrap().is_empty());
    }

    #[test]
    fn ensure_person_type_returns_existing_id_on_duplicate() {
        let store = in_memory_store();
        let first = store.ensure_person_type("Author").unwrap();
        let second = store.ensure_person_type("Author").unwrap();
        assert_eq!(first, second);
        assert_eq!(store.list_person_types().unwrap().len(), 1);
    }

    #[test]
    fn ensure_nationality_returns_existing_id_on_duplicate() {
        let store = in_memory_store();
        let first = store.ensure_nationality("British").unwrap();
        let second = store.ensure_nationality("British").unwrap();
        assert_eq!(first, second);
        assert_eq!(store.list_nationalities().unwrap().len(), 1);
    }

    #[test]
    fn referenced_nationality_cannot_be_deleted() {
        let store = in_memory_store();
        let nationality_id = store.ensure_nationality("British").unwrap();
        store
            .add_person(&PersonFields {
                name: "Ann Quin".to_string(),
                nationality_id: Some(nationality_id),
                ..Default::default()
            })
            .unwrap();

        let result = store.delete_nationality(nationality_id);
        assert!(matches!(result, Err(StoreError::NationalityInUse)));
        assert_eq!(store.list_nationalities().unwrap().len(), 1);

        let unreferenced = store.ensure_nationality("Irish").unwrap();
        store.delete_nationality(unreferenced).unwrap();
    }

    #[test]
    fn rename_nationality_detects_conflicts() {
        let store = in_memory_store();
        let british = store.ensure_nationality("British").unwrap();
        store.ensure_nationality("Irish").unwrap();

        let conflict = store.rename_nationality(british, "Irish");
        assert!(matches!(
            conflict,
            Err(StoreError::DuplicateNationalityName(_))
        ));

        store.rename_nationality(british, "Scottish").unwrap();
        let names: Vec<String> = store
            .list_nationalities()
            .unwrap()
            .into_iter()
            .map(|n| n.name)
            .collect();
        assert_eq!(names, vec!["Irish", "Scottish"]);
    }

    #[test]
    fn contributor_reconciliation_is_a_set_replace() {
        let store = in_memory_store();
        let book_id = store.add_book("Berg", Some(1964), None, false).unwrap();

        store
            .set_book_contributors(
                book_id,
                &["Ann".to_string(), "Bob".to_string()],
                ContributorRole::Author,
                "Author",
            )
            .unwrap();

        let bob_id = store.get_or_create_person("Bob", None).unwrap().unwrap();
        let bob_link_rowid: i64 = store
            .conn()
            .query_row(
                "SELECT rowid FROM book_contributors WHERE person_id = ?1",
                params![bob_id],
                |r| r.get(0),
            )
            .unwrap();

        store
            .set_book_contributors(
                book_id,
                &["Bob".to_string(), "Carol".to_string()],
                ContributorRole::Author,
                "Author",
            )
            .unwrap();

        let contributors = store.get_book_contributors(book_id).unwrap();
        let names: Vec<&str> = contributors.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Bob", "Carol"]);

        // Bob's link survived in place rather than being dropped and recreated.
        let bob_link_rowid_after: i64 = store
            .conn()
            .query_row(
                "SELECT rowid FROM book_contributors WHERE person_id = ?1",
                params![bob_id],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(bob_link_rowid, bob_link_rowid_after);

        // Ann still exists as a person, just unlinked.
        assert!(store.person_exists("Ann").unwrap());
    }

    #[test]
    fn reconciliation_keeps_roles_independent() {
        let store = in_memory_store();
        let book_id = store.add_book("Berg", None, None, false).unwrap();
        store
            .set_book_contributors(
                book_id,
                &["Ann".to_string()],
                ContributorRole::Author,
                "Author",
            )
            .unwrap();
        store
            .set_book_contributors(
                book_id,
                &["Anthea".to_string()],
                ContributorRole::Translator,
                "Translator",
            )
            .unwrap();

        // Clearing translators leaves the author untouched.
        store
            .set_book_contributors(book_id, &[], ContributorRole::Translator, "Translator")
            .unwrap();
        let contributors = store.get_book_contributors(book_id).unwrap();
        assert_eq!(contributors.len(), 1);
        assert_eq!(contributors[0].role, "author");
    }

    #[test]
    fn book_list_filter_hides_completed_unless_ensured() {
        let store = in_memory_store();
        let open_book = store.add_book("Open", None, None, false).unwrap();
        let complete_book = store.add_book("Complete", None, None, true).unwrap();

        let all = store.list_books(&BookListFilter::All).unwrap();
        assert_eq!(all.len(), 2);

        let selectable = store
            .list_books(&BookListFilter::ExcludeCompleted {
                ensure_ids: vec![],
            })
            .unwrap();
        assert_eq!(selectable.len(), 1);
        assert_eq!(selectable[0].id, open_book);

        let ensured = store
            .list_books(&BookListFilter::ExcludeCompleted {
                ensure_ids: vec![complete_book],
            })
            .unwrap();
        assert_eq!(ensured.len(), 2);
    }

    #[test]
    fn book_list_aggregates_contributors_and_counts() {
        let store = in_memory_store();
        let book_id = store.add_book("Berg", Some(1964), None, false).unwrap();
        store
            .set_book_contributors(
                book_id,
                &["Ann Quin".to_string()],
                ContributorRole::Author,
                "Author",
            )
            .unwrap();
        let person_id = store
            .get_or_create_person("Ann Quin", None)
            .unwrap()
            .unwrap();
        store
            .add_citation(person_id, book_id, 12, false, None)
            .unwrap();
        store
            .add_epigraph(book_id, person_id, "Quote", None)
            .unwrap();

        let books = store.list_books(&BookListFilter::All).unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].authors.as_deref(), Some("Ann Quin"));
        assert_eq!(books[0].translators, None);
        assert_eq!(books[0].citation_count, 1);
        assert_eq!(books[0].epigraph_count, 1);
    }

    #[test]
    fn deleting_a_person_cascades_to_their_records() {
        let store = in_memory_store();
        let book_id = store.add_book("Berg", None, None, false).unwrap();
        let person_id = store.add_person(&person("Ann Quin")).unwrap();
        store
            .add_citation(person_id, book_id, 5, false, Some("margin note"))
            .unwrap();
        store
            .add_epigraph(book_id, person_id, "Quote", None)
            .unwrap();
        store
            .set_book_contributors(
                book_id,
                &["Ann Quin".to_string()],
                ContributorRole::Author,
                "Author",
            )
            .unwrap();

        store.delete_person(person_id).unwrap();

        assert!(store.list_citations().unwrap().is_empty());
        assert!(store.list_epigraphs().unwrap().is_empty());
        assert!(store.get_book_contributors(book_id).unwrap().is_empty());
    }

    #[test]
    fn citation_crud_round_trip() {
        let store = in_memory_store();
        let book_id = store.add_book("Berg", None, None, false).unwrap();
        let other_book = store.add_book("Three", None, None, false).unwrap();
        let person_id = store.add_person(&person("Ann Quin")).unwrap();

        let citation_id = store
            .add_citation(person_id, book_id, 12, true, Some("note"))
            .unwrap();
        let citation = store.get_citation(citation_id).unwrap();
        assert_eq!(citation.page_number, 12);
        assert!(citation.indirect_citation);

        store
            .update_citation(citation_id, person_id, other_book, 99, false, None)
            .unwrap();
        let citation = store.get_citation(citation_id).unwrap();
        assert_eq!(citation.book_id, other_book);
        assert_eq!(citation.page_number, 99);
        assert!(!citation.indirect_citation);
        assert_eq!(citation.notes, None);

        let by_book = store.get_citations_by_book(other_book).unwrap();
        assert_eq!(by_book.len(), 1);
        assert_eq!(by_book[0].person_name, "Ann Quin");
    }

    #[test]
    fn citations_by_person_order_by_title_then_page() {
        let store = in_memory_store();
        let zebra = store.add_book("Zebra", None, None, false).unwrap();
        let aardvark = store.add_book("Aardvark", None, None, false).unwrap();
        let person_id = store.add_person(&person("Ann Quin")).unwrap();

        store.add_citation(person_id, zebra, 1, false, None).unwrap();
        store
            .add_citation(person_id, aardvark, 20, false, None)
            .unwrap();
        store
            .add_citation(person_id, aardvark, 3, false, None)
            .unwrap();

        let citations = store.get_citations_by_person(person_id).unwrap();
        let keys: Vec<(String, i64)> = citations
            .into_iter()
            .map(|c| (c.book_title, c.page_number))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("Aardvark".to_string(), 3),
                ("Aardvark".to_string(), 20),
                ("Zebra".to_string(), 1)
            ]
        );
    }

    #[test]
    fn epigraph_crud_round_trip() {
        let store = in_memory_store();
        let book_id = store.add_book("Berg", None, None, false).unwrap();
        let person_id = store.add_person(&person("Ann Quin")).unwrap();

        let epigraph_id = store
            .add_epigraph(book_id, person_id, "A man called Berg...", None)
            .unwrap();
        store
            .update_epigraph(epigraph_id, book_id, person_id, "Revised quote", Some("n"))
            .unwrap();

        let epigraph = store.get_epigraph(epigraph_id).unwrap();
        assert_eq!(epigraph.quote, "Revised quote");
        assert_eq!(epigraph.notes.as_deref(), Some("n"));

        let by_person = store.get_epigraphs_by_person(person_id).unwrap();
        assert_eq!(by_person.len(), 1);
        assert_eq!(by_person[0].book_title, "Berg");

        store.delete_epigraph(epigraph_id).unwrap();
        assert!(store.list_epigraphs().unwrap().is_empty());
        assert!(matches!(
            store.get_epigraph(epigraph_id),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn missing_rows_surface_not_found() {
        let store = in_memory_store();
        assert!(matches!(store.get_book(1), Err(StoreError::NotFound(_))));
        assert!(matches!(store.get_person(1), Err(StoreError::NotFound(_))));
        assert!(matches!(
            store.update_book(1, "x", None, None, false),
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.delete_person(1),
            Err(StoreError::NotFound(_))
        ));
    }
}
