mod predicates;
mod versioned_schema;

pub use predicates::QueryPredicates;
pub use versioned_schema::*;
