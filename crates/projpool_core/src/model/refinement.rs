//! Refinement domain model.
//!
//! # Invariants
//! - `(label_id, difficulty)` is the natural key; storage reconciles a second
//!   write for the same key into the existing row.
//! - A refinement update is either feedback-driven regeneration or a direct
//!   text overwrite, never both in one request.

use super::label::LabelId;
use super::text::{TextLengthError, FEEDBACK, PATCH_TEXT};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Stable refinement identifier.
pub type RefinementId = Uuid;

/// Difficulty tier selecting prompt tone and depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    /// Beginner-oriented step-by-step checklist.
    Simple,
    /// Moderately detailed checklist.
    Intermediate,
    /// Advanced checklist assuming a skilled reader.
    InDepth,
}

impl Difficulty {
    /// All tiers in canonical order.
    pub const ALL: [Difficulty; 3] = [Self::Simple, Self::Intermediate, Self::InDepth];

    /// Stable string id used in storage and at API boundaries.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Intermediate => "intermediate",
            Self::InDepth => "in_depth",
        }
    }
}

impl Display for Difficulty {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Difficulty string outside `simple|intermediate|in_depth`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("difficulty must be one of simple|intermediate|in_depth, got `{0}`")]
pub struct DifficultyParseError(pub String);

impl FromStr for Difficulty {
    type Err = DifficultyParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "simple" => Ok(Self::Simple),
            "intermediate" => Ok(Self::Intermediate),
            "in_depth" => Ok(Self::InDepth),
            other => Err(DifficultyParseError(other.to_string())),
        }
    }
}

/// Generated or manually supplied explanatory text for one label tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refinement {
    pub id: RefinementId,
    /// Immutable after creation.
    pub label_id: LabelId,
    pub difficulty: Difficulty,
    pub generated_text: String,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms timestamp of the last text change.
    pub updated_at: i64,
}

/// Raw refinement update as received from a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefinementPatch {
    pub feedback: Option<String>,
    pub generated_text: Option<String>,
}

/// Validated refinement update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefinementEdit {
    /// Ask the provider to rework the current text using this feedback.
    Feedback(String),
    /// Overwrite the current text directly.
    ReplaceText(String),
}

/// Reasons a [`RefinementPatch`] cannot become a [`RefinementEdit`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatchError {
    #[error("provide exactly one of feedback or generated_text")]
    NotExactlyOne,
    #[error(transparent)]
    Length(#[from] TextLengthError),
}

impl RefinementPatch {
    pub fn with_feedback(feedback: impl Into<String>) -> Self {
        Self {
            feedback: Some(feedback.into()),
            generated_text: None,
        }
    }

    pub fn with_generated_text(text: impl Into<String>) -> Self {
        Self {
            feedback: None,
            generated_text: Some(text.into()),
        }
    }

    /// Enforces the exactly-one rule, then the field's length bounds.
    pub fn into_edit(self) -> Result<RefinementEdit, PatchError> {
        match (self.feedback, self.generated_text) {
            (Some(feedback), None) => Ok(RefinementEdit::Feedback(FEEDBACK.normalize(&feedback)?)),
            (None, Some(text)) => Ok(RefinementEdit::ReplaceText(PATCH_TEXT.normalize(&text)?)),
            _ => Err(PatchError::NotExactlyOne),
        }
    }
}
