//! Label domain model.

use super::project::ProjectId;
use super::text::LABEL_TEXT;
use uuid::Uuid;

/// Stable label identifier.
pub type LabelId = Uuid;

/// A short user-entered task/topic attached to one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub id: LabelId,
    /// Immutable after creation.
    pub project_id: ProjectId,
    pub text: String,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
}

/// Normalizes one submitted label entry.
///
/// Returns `None` for entries that are blank or longer than 100 characters
/// after trimming; batch creation skips those instead of failing.
pub fn normalize_label_text(raw: &str) -> Option<String> {
    LABEL_TEXT.normalize(raw).ok()
}
