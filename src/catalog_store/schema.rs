//! SQLite schema for the referent catalog database.
//!
//! All rows carry integer epoch-second created_at/updated_at stamps applied
//! by the storage layer. Dependent rows (contributor links, citations,
//! epigraphs) cascade when their book or person is deleted; nationalities
//! are protected from deletion while referenced.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP,
};

const BOOK_FK: ForeignKey = ForeignKey {
    foreign_table: "books",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const PERSON_FK: ForeignKey = ForeignKey {
    foreign_table: "people",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const PERSON_TYPE_FK: ForeignKey = ForeignKey {
    foreign_table: "person_types",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::SetNull,
};

const NATIONALITY_FK: ForeignKey = ForeignKey {
    foreign_table: "nationalities",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Restrict,
};

const BOOKS_TABLE: Table = Table {
    name: "books",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("publication_year", &SqlType::Integer),
        sqlite_column!("isbn", &SqlType::Text),
        sqlite_column!(
            "is_complete",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "updated_at",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_books_title", "title")],
    unique_constraints: &[],
};

const PERSON_TYPES_TABLE: Table = Table {
    name: "person_types",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "updated_at",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[],
    unique_constraints: &[],
};

const NATIONALITIES_TABLE: Table = Table {
    name: "nationalities",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "updated_at",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[],
    unique_constraints: &[],
};

/// People table. The NOCASE collation makes the unique name constraint (and
/// every name lookup) case-insensitive. Birth/death years are signed
/// common-era integers, normalized from year+era at input time.
const PEOPLE_TABLE: Table = Table {
    name: "people",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "name",
            &SqlType::Text,
            non_null = true,
            is_unique = true,
            collate_nocase = true
        ),
        sqlite_column!(
            "type_id",
            &SqlType::Integer,
            foreign_key = Some(&PERSON_TYPE_FK)
        ),
        sqlite_column!(
            "nationality_id",
            &SqlType::Integer,
            foreign_key = Some(&NATIONALITY_FK)
        ),
        sqlite_column!("wiki_url", &SqlType::Text),
        sqlite_column!("bio_summary", &SqlType::Text),
        sqlite_column!("birth_year", &SqlType::Integer),
        sqlite_column!("death_year", &SqlType::Integer),
        sqlite_column!("notes", &SqlType::Text),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "updated_at",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_people_nationality", "nationality_id")],
    unique_constraints: &[],
};

/// Book <-> Person relationship with role, unique on the full triple so link
/// insertion can be idempotent.
const BOOK_CONTRIBUTORS_TABLE: Table = Table {
    name: "book_contributors",
    columns: &[
        sqlite_column!(
            "book_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&BOOK_FK)
        ),
        sqlite_column!(
            "person_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&PERSON_FK)
        ),
        sqlite_column!("role", &SqlType::Text, non_null = true),
    ],
    indices: &[
        ("idx_book_contributors_book", "book_id"),
        ("idx_book_contributors_person", "person_id"),
    ],
    unique_constraints: &[&["book_id", "person_id", "role"]],
};

const CITATIONS_TABLE: Table = Table {
    name: "citations",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "person_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&PERSON_FK)
        ),
        sqlite_column!(
            "book_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&BOOK_FK)
        ),
        sqlite_column!("page_number", &SqlType::Integer, non_null = true),
        sqlite_column!(
            "indirect_citation",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!("notes", &SqlType::Text),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "updated_at",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[
        ("idx_citations_person", "person_id"),
        ("idx_citations_book", "book_id"),
    ],
    unique_constraints: &[],
};

const EPIGRAPHS_TABLE: Table = Table {
    name: "epigraphs",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "book_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&BOOK_FK)
        ),
        sqlite_column!(
            "author_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&PERSON_FK)
        ),
        sqlite_column!("quote", &SqlType::Text, non_null = true),
        sqlite_column!("notes", &SqlType::Text),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "updated_at",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[
        ("idx_epigraphs_book", "book_id"),
        ("idx_epigraphs_author", "author_id"),
    ],
    unique_constraints: &[],
};

pub const CATALOG_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        BOOKS_TABLE,
        PERSON_TYPES_TABLE,
        NATIONALITIES_TABLE,
        PEOPLE_TABLE,
        BOOK_CONTRIBUTORS_TABLE,
        CITATIONS_TABLE,
        EPIGRAPHS_TABLE,
    ],
    migration: None,
}];

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::{params, Connection};

    fn fresh_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        CATALOG_VERSIONED_SCHEMAS[0].create(&conn).unwrap();
        conn
    }

    #[test]
    fn schema_creates_and_validates() {
        let conn = fresh_db();
        CATALOG_VERSIONED_SCHEMAS[0].validate(&conn).unwrap();
    }

    #[test]
    fn person_names_are_unique_ignoring_case() {
        let conn = fresh_db();
        conn.execute("INSERT INTO people (name) VALUES ('Ann Quin')", [])
            .unwrap();
        let duplicate = conn.execute("INSERT INTO people (name) VALUES ('ann quin')", []);
        assert!(duplicate.is_err());
    }

    #[test]
    fn contributor_triple_is_unique_and_idempotent() {
        let conn = fresh_db();
        conn.execute("INSERT INTO books (title) VALUES ('Berg')", [])
            .unwrap();
        conn.execute("INSERT INTO people (name) VALUES ('Ann Quin')", [])
            .unwrap();

        for _ in 0..2 {
            conn.execute(
                "INSERT OR IGNORE INTO book_contributors (book_id, person_id, role) VALUES (1, 1, 'author')",
                [],
            )
            .unwrap();
        }
        let links: i64 = conn
            .query_row("SELECT COUNT(*) FROM book_contributors", [], |r| r.get(0))
            .unwrap();
        assert_eq!(links, 1);

        // Same pair under a different role is a distinct link.
        conn.execute(
            "INSERT OR IGNORE INTO book_contributors (book_id, person_id, role) VALUES (1, 1, 'translator')",
            [],
        )
        .unwrap();
        let links: i64 = conn
            .query_row("SELECT COUNT(*) FROM book_contributors", [], |r| r.get(0))
            .unwrap();
        assert_eq!(links, 2);
    }

    #[test]
    fn deleting_a_person_cascades_to_dependents() {
        let conn = fresh_db();
        conn.execute("INSERT INTO books (title) VALUES ('Berg')", [])
            .unwrap();
        conn.execute("INSERT INTO people (name) VALUES ('Ann Quin')", [])
            .unwrap();
        conn.execute(
            "INSERT INTO book_contributors (book_id, person_id, role) VALUES (1, 1, 'author')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO citations (person_id, book_id, page_number) VALUES (1, 1, 12)",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO epigraphs (book_id, author_id, quote) VALUES (1, 1, 'q')",
            [],
        )
        .unwrap();

        conn.execute("DELETE FROM people WHERE id = 1", []).unwrap();

        for table in ["book_contributors", "citations", "epigraphs"] {
            let count: i64 = conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
                .unwrap();
            assert_eq!(count, 0, "{} rows should cascade", table);
        }
    }

    #[test]
    fn referenced_nationality_cannot_be_deleted() {
        let conn = fresh_db();
        conn.execute("INSERT INTO nationalities (name) VALUES ('British')", [])
            .unwrap();
        conn.execute(
            "INSERT INTO people (name, nationality_id) VALUES ('Ann Quin', 1)",
            [],
        )
        .unwrap();

        let delete = conn.execute("DELETE FROM nationalities WHERE id = 1", []);
        assert!(delete.is_err());

        // Unreference, then deletion goes through.
        conn.execute(
            "UPDATE people SET nationality_id = NULL WHERE id = 1",
            params![],
        )
        .unwrap();
        conn.execute("DELETE FROM nationalities WHERE id = 1", [])
            .unwrap();
    }
}
