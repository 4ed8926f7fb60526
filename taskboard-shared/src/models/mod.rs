/// Database models for Taskboard
///
/// This module contains the row types and their PostgreSQL operations.
/// Handlers do not call these directly; they go through
/// [`crate::store::Store`], whose PostgreSQL backend delegates here.
///
/// # Models
///
/// - `user`: Externally managed user accounts (owners)
/// - `label`: Per-user labels, unique by name per owner
/// - `task`: Per-user tasks and their label junction rows

pub mod label;
pub mod task;
pub mod user;

/// Builds an `ILIKE` pattern matching `search` anywhere in the column
///
/// `%`, `_` and `\` in the search text are escaped so they match literally.
pub(crate) fn contains_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for ch in search.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
