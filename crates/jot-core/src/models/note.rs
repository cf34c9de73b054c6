//! Note model and field validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::NoteColor;

/// Longest accepted title, in characters.
pub const TITLE_MAX_CHARS: usize = 150;
/// Longest accepted body, in characters.
pub const CONTENT_MAX_CHARS: usize = 1000;

/// A user-authored note as held in the client collection.
///
/// `id`, `created_at`, and `updated_at` are assigned and maintained by the
/// remote store; `owner_id` is fixed at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    pub owner_id: String,
    pub color: NoteColor,
    pub pinned: bool,
    pub image_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// Whether this note carries an attached image.
    #[must_use]
    pub const fn has_image(&self) -> bool {
        self.image_id.is_some()
    }
}

/// Validate title and content bounds before a create or update is submitted.
///
/// Invalid input never reaches the remote store.
pub fn validate_note_fields(title: &str, content: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(Error::Validation("title must not be empty".to_string()));
    }
    let title_chars = title.chars().count();
    if title_chars > TITLE_MAX_CHARS {
        return Err(Error::Validation(format!(
            "title is {title_chars} characters, the maximum is {TITLE_MAX_CHARS}"
        )));
    }

    if content.trim().is_empty() {
        return Err(Error::Validation("content must not be empty".to_string()));
    }
    let content_chars = content.chars().count();
    if content_chars > CONTENT_MAX_CHARS {
        return Err(Error::Validation(format!(
            "content is {content_chars} characters, the maximum is {CONTENT_MAX_CHARS}"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_fields_at_the_bounds() {
        validate_note_fields("x", "y").unwrap();
        validate_note_fields(&"x".repeat(TITLE_MAX_CHARS), "content").unwrap();
        validate_note_fields("title", &"y".repeat(CONTENT_MAX_CHARS)).unwrap();
    }

    #[test]
    fn rejects_empty_and_whitespace_fields() {
        assert!(matches!(
            validate_note_fields("", "content"),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            validate_note_fields("   ", "content"),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            validate_note_fields("title", ""),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn rejects_fields_over_the_bounds() {
        assert!(matches!(
            validate_note_fields(&"x".repeat(TITLE_MAX_CHARS + 1), "content"),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            validate_note_fields("title", &"y".repeat(CONTENT_MAX_CHARS + 1)),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn bounds_count_characters_not_bytes() {
        // 150 multi-byte characters are still 150 characters.
        validate_note_fields(&"ü".repeat(TITLE_MAX_CHARS), "content").unwrap();
    }
}
