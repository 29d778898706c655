//! Project domain model.

use super::text::{TextLengthError, PROJECT_DESCRIPTION, PROJECT_NAME};
use super::UserId;
use uuid::Uuid;

/// Stable project identifier.
pub type ProjectId = Uuid;

/// Persisted project record.
///
/// `name` and `description` feed generation prompts; editing them later does
/// not touch refinement text that was already generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: ProjectId,
    pub owner_id: UserId,
    pub name: String,
    pub description: String,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}

/// Validated input for project creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    pub name: String,
    pub description: String,
}

impl NewProject {
    /// Trims and validates name (1-120 chars) and description (<= 5000 chars).
    pub fn new(name: &str, description: &str) -> Result<Self, TextLengthError> {
        Ok(Self {
            name: PROJECT_NAME.normalize(name)?,
            description: PROJECT_DESCRIPTION.normalize(description)?,
        })
    }
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl ProjectUpdate {
    /// Returns a copy with every present field trimmed and bound-checked.
    pub fn normalized(&self) -> Result<Self, TextLengthError> {
        Ok(Self {
            name: self
                .name
                .as_deref()
                .map(|value| PROJECT_NAME.normalize(value))
                .transpose()?,
            description: self
                .description
                .as_deref()
                .map(|value| PROJECT_DESCRIPTION.normalize(value))
                .transpose()?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}
