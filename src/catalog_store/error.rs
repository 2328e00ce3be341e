use thiserror::Error;

/// Errors surfaced by catalog storage operations.
///
/// Uniqueness and referential failures map to their own variants so route
/// handlers can answer with the right status code; everything else bubbles
/// up as the underlying SQLite error.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("a person named \"{0}\" already exists")]
    DuplicatePersonName(String),

    #[error("a nationality named \"{0}\" already exists")]
    DuplicateNationalityName(String),

    #[error("nationality is still referenced by at least one person")]
    NationalityInUse,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// True when the underlying SQLite error is a constraint violation.
    pub(crate) fn is_constraint_violation(err: &rusqlite::Error) -> bool {
        matches!(
            err,
            rusqlite::Error::SqliteFailure(e, _)
                if e.code == rusqlite::ErrorCode::ConstraintViolation
        )
    }
}
