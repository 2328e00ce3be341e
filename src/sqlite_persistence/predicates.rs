//! Composition of optional WHERE predicates for list queries.
//!
//! List queries take an enumerated set of optional filters. Each filter
//! contributes a clause with its own `?` placeholders plus the matching
//! parameter values; only the structural SQL is assembled as text, never
//! user-supplied data.

use rusqlite::types::Value;

#[derive(Default)]
pub struct QueryPredicates {
    clauses: Vec<String>,
    params: Vec<Value>,
}

impl QueryPredicates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a predicate clause together with the values for its placeholders.
    pub fn push<C, I>(&mut self, clause: C, values: I)
    where
        C: Into<String>,
        I: IntoIterator<Item = Value>,
    {
        self.clauses.push(clause.into());
        self.params.extend(values);
    }

    /// A `?, ?, ...` list for an IN (...) clause of the given arity.
    pub fn placeholders(count: usize) -> String {
        vec!["?"; count].join(", ")
    }

    /// The assembled `WHERE ...` fragment, or an empty string when no
    /// predicate was added. Clauses are AND-ed in insertion order.
    pub fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    pub fn into_params(self) -> Vec<Value> {
        self.params
    }
}
