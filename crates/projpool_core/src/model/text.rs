//! Character-bounded text normalization shared by all write paths.

/// Bounds for label text.
pub const LABEL_TEXT: TextBounds = TextBounds::new("text", 1, 100);
/// Bounds for project names.
pub const PROJECT_NAME: TextBounds = TextBounds::new("name", 1, 120);
/// Bounds for project descriptions. Empty descriptions are allowed.
pub const PROJECT_DESCRIPTION: TextBounds = TextBounds::new("description", 0, 5000);
/// Bounds for manually entered refinement text.
pub const MANUAL_TEXT: TextBounds = TextBounds::new("text", 5, 5000);
/// Bounds for regeneration feedback.
pub const FEEDBACK: TextBounds = TextBounds::new("feedback", 5, 500);
/// Bounds for a direct refinement text overwrite.
pub const PATCH_TEXT: TextBounds = TextBounds::new("generated_text", 3, 5000);

/// Inclusive character-count bounds for one named text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextBounds {
    pub field: &'static str,
    pub min_chars: usize,
    pub max_chars: usize,
}

/// A text value that falls outside its bounds after trimming.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field} must be between {min_chars} and {max_chars} characters, got {actual_chars}")]
pub struct TextLengthError {
    pub field: &'static str,
    pub min_chars: usize,
    pub max_chars: usize,
    pub actual_chars: usize,
}

impl TextBounds {
    pub const fn new(field: &'static str, min_chars: usize, max_chars: usize) -> Self {
        Self {
            field,
            min_chars,
            max_chars,
        }
    }

    /// Trims `raw` and checks its character count against these bounds.
    pub fn normalize(&self, raw: &str) -> Result<String, TextLengthError> {
        let trimmed = raw.trim();
        let actual_chars = trimmed.chars().count();
        if actual_chars < self.min_chars || actual_chars > self.max_chars {
            return Err(TextLengthError {
                field: self.field,
                min_chars: self.min_chars,
                max_chars: self.max_chars,
                actual_chars,
            });
        }
        Ok(trimmed.to_string())
    }
}
