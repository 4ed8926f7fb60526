/// Field-level validation for labels and tasks
///
/// Every write (create or update) passes through these functions before the
/// store is touched. They are pure: they normalize the input (trimming
/// surrounding whitespace) and either return the value to persist or a typed
/// [`ValidationError`].
///
/// Per-owner label name uniqueness needs the store, so it is checked by
/// [`crate::store::Store::label_name_taken`] and enforced again by the
/// store's own uniqueness constraint when the row is written.
///
/// # Example
///
/// ```
/// use taskboard_shared::validation::{validate_task_title, ValidationError};
///
/// assert_eq!(validate_task_title("  Buy milk ").unwrap(), "Buy milk");
/// assert!(matches!(
///     validate_task_title("   "),
///     Err(ValidationError::EmptyField { .. })
/// ));
/// ```

use serde::Serialize;

/// Maximum length (in characters) of a label name or task title
pub const MAX_NAME_LENGTH: usize = 255;

/// Validation failure kinds
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Field is empty or whitespace-only
    #[error("{field} cannot be empty")]
    EmptyField { field: &'static str },

    /// Field contains a NUL character, which no text column can store
    #[error("{field} cannot contain NUL characters")]
    NullCharacter { field: &'static str },

    /// Field exceeds the maximum length
    #[error("{field} must be at most {max} characters (got {actual})")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    /// Owner already has a label with this name
    #[error("a label named '{name}' already exists")]
    DuplicateForOwner { name: String },

    /// Referenced label does not exist or belongs to another owner
    #[error("label {id} does not exist")]
    UnknownLabel { id: i64 },
}

/// Machine-readable validation error code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationKind {
    EmptyField,
    NullCharacter,
    TooLong,
    DuplicateForOwner,
    UnknownLabel,
}

impl ValidationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationKind::EmptyField => "empty_field",
            ValidationKind::NullCharacter => "null_character",
            ValidationKind::TooLong => "too_long",
            ValidationKind::DuplicateForOwner => "duplicate_for_owner",
            ValidationKind::UnknownLabel => "unknown_label",
        }
    }
}

impl ValidationError {
    /// Name of the request field that failed
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::EmptyField { field }
            | ValidationError::NullCharacter { field }
            | ValidationError::TooLong { field, .. } => field,
            ValidationError::DuplicateForOwner { .. } => "name",
            ValidationError::UnknownLabel { .. } => "labels",
        }
    }

    pub fn kind(&self) -> ValidationKind {
        match self {
            ValidationError::EmptyField { .. } => ValidationKind::EmptyField,
            ValidationError::NullCharacter { .. } => ValidationKind::NullCharacter,
            ValidationError::TooLong { .. } => ValidationKind::TooLong,
            ValidationError::DuplicateForOwner { .. } => ValidationKind::DuplicateForOwner,
            ValidationError::UnknownLabel { .. } => ValidationKind::UnknownLabel,
        }
    }
}

/// Rejects text containing `\0`
pub fn reject_null_characters(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.contains('\0') {
        return Err(ValidationError::NullCharacter { field });
    }
    Ok(())
}

/// Trims `value` and checks it against the non-empty and length bounds
fn bounded_text(field: &'static str, value: &str) -> Result<String, ValidationError> {
    reject_null_characters(field, value)?;
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField { field });
    }

    let length = trimmed.chars().count();
    if length > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field,
            max: MAX_NAME_LENGTH,
            actual: length,
        });
    }

    Ok(trimmed.to_string())
}

/// Validates a label name, returning the trimmed name to store
///
/// # Errors
///
/// - `EmptyField` if the name is empty after trimming
/// - `TooLong` if the trimmed name is longer than 255 characters
pub fn validate_label_name(name: &str) -> Result<String, ValidationError> {
    bounded_text("name", name)
}

/// Validates a task title, returning the trimmed title to store
///
/// # Errors
///
/// - `EmptyField` if the title is empty or whitespace-only
/// - `TooLong` if the trimmed title is longer than 255 characters
pub fn validate_task_title(title: &str) -> Result<String, ValidationError> {
    bounded_text("title", title)
}

/// Validates a task description (stored as sent, may be empty)
///
/// # Errors
///
/// - `NullCharacter` if the description contains `\0`
pub fn validate_task_description(description: &str) -> Result<String, ValidationError> {
    reject_null_characters("description", description)?;
    Ok(description.to_string())
}

/// Deduplicates a label id list while keeping the first-seen order
pub fn normalize_label_ids(ids: &[i64]) -> Vec<i64> {
    let mut seen = std::collections::HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}
