//! Parsing of comma-delimited name lists from form input.

use std::collections::HashSet;

/// Split one or more comma-delimited strings into a list of distinct names.
///
/// Tokens are trimmed and empty tokens dropped. Duplicates are detected
/// case-insensitively; the first occurrence wins and keeps its casing, and
/// input order is preserved.
pub fn parse_name_list<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for value in values {
        for token in value.as_ref().split(',') {
            let name = token.trim();
            if name.is_empty() {
                continue;
            }
            if seen.insert(name.to_lowercase()) {
                names.push(name.to_string());
            }
        }
    }
    names
}
